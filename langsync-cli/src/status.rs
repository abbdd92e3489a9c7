use crate::config::Config;
use crate::validation::{ValidationContext, validate_context};
use langsync::{LanguageStatus, ReswDirectory, StatusReport, status_report};
use serde_json::json;

#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    pub strings_dir: Option<String>,
    pub reference: Option<String>,
    pub top: usize,
    pub json: bool,
}

pub fn run_status_command(opts: StatusOptions, config: &Config) -> Result<(), String> {
    let strings_dir = opts.strings_dir.as_deref().unwrap_or(config.strings_dir());
    let reference = opts.reference.as_deref().unwrap_or(config.reference_locale());
    validate_context(
        &ValidationContext::new()
            .with_strings_dir(strings_dir)
            .with_language_code(reference),
    )?;

    let directory = ReswDirectory::new(strings_dir).with_file_name(config.file_name());
    let report = status_report(&directory, reference)
        .map_err(|e| format!("Cannot build status report: {}", e))?;

    if opts.json {
        print_json(&report)
    } else {
        print_text(&report, opts.top);
        Ok(())
    }
}

fn print_json(report: &StatusReport) -> Result<(), String> {
    let body = json!({
        "summary": {
            "reference_locale": report.reference_locale,
            "reference_entries": report.reference_entries,
            "complete": report.count(LanguageStatus::Complete),
            "incomplete": report.count(LanguageStatus::Incomplete),
            "error": report.count(LanguageStatus::Error),
            "total": report.languages.len(),
        },
        "languages": report.languages,
    });
    let text = serde_json::to_string_pretty(&body)
        .map_err(|e| format!("Failed to serialize status JSON: {}", e))?;
    println!("{}", text);
    Ok(())
}

fn print_text(report: &StatusReport, top: usize) {
    let rule = "=".repeat(80);

    println!(
        "Found {} entries in {}",
        report.reference_entries, report.reference_locale
    );
    println!("{}", rule);
    println!("Translation Status Summary");
    println!("{}", rule);
    println!("Complete: {}", report.count(LanguageStatus::Complete));
    println!("Incomplete: {}", report.count(LanguageStatus::Incomplete));
    println!("Error: {}", report.count(LanguageStatus::Error));
    println!("Total: {}", report.languages.len());

    let closest = report.fewest_remaining(top);
    if !closest.is_empty() {
        println!("\n{}", rule);
        println!("Top {} Languages with Fewest Entries Remaining", top);
        println!("{}", rule);
        println!(
            "{:<20} {:<12} {:<12} {:<12} {:<12}",
            "Language", "Remaining", "Incomplete", "Error", "Status"
        );
        println!("{}", "-".repeat(80));
        for language in closest {
            println!(
                "{:<20} {:<12} {:<12} {:<12} {:<12}",
                language.locale,
                language.remaining(),
                language.incomplete,
                language.error,
                language.status.to_string()
            );
        }
    }

    let with_errors = report.most_errors(top);
    if !with_errors.is_empty() {
        println!("\n{}", rule);
        println!("Languages with Translation Errors");
        println!("{}", rule);
        println!("{:<20} {:<12}", "Language", "Errors");
        println!("{}", "-".repeat(80));
        for language in with_errors {
            println!("{:<20} {:<12}", language.locale, language.error);
        }
    }
}
