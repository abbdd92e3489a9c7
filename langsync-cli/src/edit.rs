use crate::config::Config;
use crate::validation::{ValidationContext, validate_context};
use langsync::{EditReport, EditState, ReswDirectory, add_entry, remove_entry};

#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    pub strings_dir: Option<String>,
    pub reference: Option<String>,
    pub key: String,
}

fn open_directory(opts: &EditOptions, config: &Config) -> Result<ReswDirectory, String> {
    let strings_dir = opts.strings_dir.as_deref().unwrap_or(config.strings_dir());
    validate_context(
        &ValidationContext::new()
            .with_strings_dir(strings_dir)
            .with_entry_key(&opts.key),
    )?;
    Ok(ReswDirectory::new(strings_dir).with_file_name(config.file_name()))
}

pub fn run_add_command(opts: EditOptions, value: &str, config: &Config) -> Result<(), String> {
    let reference = opts.reference.as_deref().unwrap_or(config.reference_locale());
    validate_context(&ValidationContext::new().with_language_code(reference))?;
    let mut directory = open_directory(&opts, config)?;

    println!("Adding entry: key='{}', value='{}'", opts.key, value);
    let report = add_entry(&mut directory, reference, &opts.key, value)
        .map_err(|e| format!("Cannot add entry: {}", e))?;

    for locale in &report.locales {
        match &locale.state {
            EditState::Added => println!("  ✓ {}: Added successfully", locale.locale),
            EditState::AlreadyExists => {
                println!("  ⚠ {}: Key '{}' already exists", locale.locale, opts.key)
            }
            EditState::Failed(reason) => println!("  ✗ {}: {}", locale.locale, reason),
            EditState::Removed | EditState::NotFound => {}
        }
    }
    println!(
        "Summary: {} added, {} skipped, {} errors",
        report.count(&EditState::Added),
        report.count(&EditState::AlreadyExists),
        report.failures()
    );
    check_failures(&report)
}

pub fn run_remove_command(opts: EditOptions, config: &Config) -> Result<(), String> {
    let mut directory = open_directory(&opts, config)?;

    println!("Removing localization entry: '{}'", opts.key);
    let report = remove_entry(&mut directory, &opts.key)
        .map_err(|e| format!("Cannot remove entry: {}", e))?;

    for locale in &report.locales {
        match &locale.state {
            EditState::Removed => println!("  ✓ Removed '{}' from {}", opts.key, locale.locale),
            EditState::Failed(reason) => println!("  ✗ {}: {}", locale.locale, reason),
            _ => {}
        }
    }

    let removed = report.count(&EditState::Removed);
    if removed == 0 {
        println!("No matching entries found.");
    } else {
        println!(
            "Completed: removed {} entries across {} files.",
            removed,
            report.locales.len()
        );
    }
    check_failures(&report)
}

fn check_failures(report: &EditReport) -> Result<(), String> {
    match report.failures() {
        0 => Ok(()),
        n => Err(format!("{} locale(s) could not be updated", n)),
    }
}
