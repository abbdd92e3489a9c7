use crate::config::Config;
use crate::validation::{ValidationContext, validate_context};
use langsync::{
    LibreTranslate, LocaleOutcome, MemoryStore, ReconcileOptions, Reconciler, ReswDirectory,
    RunReport, StoreAdapter, ThreadSleeper, service::DEFAULT_ENDPOINT, summarize_run,
};
use serde_json::json;

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub strings_dir: Option<String>,
    pub reference: Option<String>,
    pub only: Vec<String>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub dry_run: bool,
    pub json: bool,
}

fn reconcile_with<A: StoreAdapter>(
    adapter: A,
    service: LibreTranslate,
    options: ReconcileOptions,
) -> Result<RunReport, String> {
    Reconciler::new(adapter, service, ThreadSleeper, options)
        .run()
        .map_err(|e| format!("Reconciliation failed: {}", e))
}

pub fn run_sync_command(opts: SyncOptions, config: &Config) -> Result<(), String> {
    let strings_dir = opts.strings_dir.as_deref().unwrap_or(config.strings_dir());
    let reference = opts.reference.as_deref().unwrap_or(config.reference_locale());
    validate_context(
        &ValidationContext::new()
            .with_strings_dir(strings_dir)
            .with_language_code(reference)
            .with_language_codes(&opts.only),
    )?;

    let only = if opts.only.is_empty() {
        None
    } else {
        Some(opts.only.clone())
    };
    let options = config
        .reconcile_options()
        .with_reference_locale(reference)
        .with_only(only);
    options
        .validate()
        .map_err(|e| format!("Invalid options: {}", e))?;

    let endpoint = opts
        .endpoint
        .as_deref()
        .or(config.endpoint())
        .unwrap_or(DEFAULT_ENDPOINT);
    let api_key = opts
        .api_key
        .clone()
        .or_else(|| config.api_key().map(str::to_string));
    let service = LibreTranslate::new(endpoint, config.timeout())
        .map_err(|e| format!("Cannot create HTTP client: {}", e))?
        .with_api_key(api_key);

    let directory = ReswDirectory::new(strings_dir).with_file_name(config.file_name());
    tracing::info!(
        "syncing {} against {} via {}{}",
        strings_dir,
        reference,
        endpoint,
        if opts.dry_run { " (dry run)" } else { "" }
    );

    let report = if opts.dry_run {
        let memory = MemoryStore::snapshot(&directory)
            .map_err(|e| format!("Cannot read {}: {}", strings_dir, e))?;
        reconcile_with(memory, service, options)?
    } else {
        reconcile_with(directory, service, options)?
    };

    print_run_report(&report, opts.json, opts.dry_run)?;

    let failed: Vec<&str> = report.failed().map(|l| l.locale.as_str()).collect();
    if !failed.is_empty() {
        return Err(format!(
            "{} locale(s) failed: {}",
            failed.len(),
            failed.join(", ")
        ));
    }
    Ok(())
}

fn print_run_report(report: &RunReport, json_output: bool, dry_run: bool) -> Result<(), String> {
    let summary = summarize_run(report);

    if json_output {
        let body = json!({
            "dry_run": dry_run,
            "summary": summary,
            "report": report,
        });
        let text = serde_json::to_string_pretty(&body)
            .map_err(|e| format!("Failed to serialize report JSON: {}", e))?;
        println!("{}", text);
        return Ok(());
    }

    println!("=== Sync ===");
    if dry_run {
        println!("Dry run: no files were written");
    }
    println!("Reference: {}", report.reference_locale);
    if report.reference_swept > 0 {
        println!("  {} reference entries marked complete", report.reference_swept);
    }

    for locale in &report.locales {
        let outcome = match &locale.outcome {
            LocaleOutcome::Done => "done".to_string(),
            LocaleOutcome::SkippedInvalidLanguage => "skipped (unsupported language)".to_string(),
            LocaleOutcome::Failed(reason) => format!("failed: {}", reason),
        };
        println!(
            "  {:<14} {:<32} queued {:>4}  translated {:>4}  unchanged {:>4}  errors {:>4}  permanent {:>4}",
            locale.locale,
            outcome,
            locale.queued,
            locale.translated,
            locale.unchanged,
            locale.errors,
            locale.permanent_errors
        );
    }

    println!(
        "\nLocales: {} ({} done, {} skipped, {} failed)",
        summary.locales, summary.done, summary.skipped_invalid_language, summary.failed
    );
    println!(
        "Entries: {} queued, {} translated, {} unchanged, {} marked complete, {} errors, {} permanent errors",
        summary.queued,
        summary.translated,
        summary.unchanged,
        summary.marked_complete,
        summary.errors,
        summary.permanent_errors
    );
    Ok(())
}
