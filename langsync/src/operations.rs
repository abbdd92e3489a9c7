//! High-level store operations (add/remove an entry, status reports) reusable by the CLI
//! and library users.

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    reconcile::{LocaleOutcome, RunReport},
    traits::StoreAdapter,
    types::{Entry, EntryStatus, LocaleStore},
};

/// What an edit did to one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum EditState {
    Added,
    AlreadyExists,
    Removed,
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleEdit {
    pub locale: String,
    pub state: EditState,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EditReport {
    pub key: String,
    pub locales: Vec<LocaleEdit>,
}

impl EditReport {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            locales: Vec::new(),
        }
    }

    fn record(&mut self, locale: &str, state: EditState) {
        self.locales.push(LocaleEdit {
            locale: locale.to_string(),
            state,
        });
    }

    pub fn count(&self, state: &EditState) -> usize {
        self.locales.iter().filter(|l| &l.state == state).count()
    }

    pub fn failures(&self) -> usize {
        self.locales
            .iter()
            .filter(|l| matches!(l.state, EditState::Failed(_)))
            .count()
    }
}

fn sorted_locales(adapter: &dyn StoreAdapter) -> Result<Vec<String>, Error> {
    let mut locales = adapter.locales()?;
    locales.sort();
    Ok(locales)
}

fn validate_key(key: &str) -> Result<(), Error> {
    if key.trim().is_empty() {
        return Err(Error::InvalidResource(
            "entry key must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Adds `key` with `value` to every locale.
///
/// The reference locale gets `Complete`, every other locale `Incomplete` so the next
/// reconciliation translates it. Locales that already have the key are left untouched.
pub fn add_entry(
    adapter: &mut dyn StoreAdapter,
    reference_locale: &str,
    key: &str,
    value: &str,
) -> Result<EditReport, Error> {
    validate_key(key)?;
    let mut report = EditReport::new(key);

    for locale in sorted_locales(adapter)? {
        let state = match add_to_locale(adapter, &locale, reference_locale, key, value) {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(locale = %locale, "failed to add `{}`: {}", key, e);
                EditState::Failed(e.to_string())
            }
        };
        if state == EditState::AlreadyExists {
            tracing::warn!(locale = %locale, "key `{}` already exists, skipping", key);
        }
        report.record(&locale, state);
    }

    Ok(report)
}

fn add_to_locale(
    adapter: &mut dyn StoreAdapter,
    locale: &str,
    reference_locale: &str,
    key: &str,
    value: &str,
) -> Result<EditState, Error> {
    let mut store = adapter.load(locale)?;
    if store.contains_key(key) {
        return Ok(EditState::AlreadyExists);
    }
    let status = if locale == reference_locale {
        EntryStatus::Complete
    } else {
        EntryStatus::Incomplete
    };
    store.add_entry(Entry::new(key, value).with_status(status));
    adapter.save(&store)?;
    Ok(EditState::Added)
}

/// Removes `key` from every locale that has it.
pub fn remove_entry(adapter: &mut dyn StoreAdapter, key: &str) -> Result<EditReport, Error> {
    validate_key(key)?;
    let mut report = EditReport::new(key);

    for locale in sorted_locales(adapter)? {
        let state = match remove_from_locale(adapter, &locale, key) {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(locale = %locale, "failed to remove `{}`: {}", key, e);
                EditState::Failed(e.to_string())
            }
        };
        report.record(&locale, state);
    }

    Ok(report)
}

fn remove_from_locale(
    adapter: &mut dyn StoreAdapter,
    locale: &str,
    key: &str,
) -> Result<EditState, Error> {
    let mut store = adapter.load(locale)?;
    if store.remove_entry(key).is_none() {
        return Ok(EditState::NotFound);
    }
    adapter.save(&store)?;
    Ok(EditState::Removed)
}

/// Overall translation state of one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageStatus {
    Complete,
    Incomplete,
    Error,
}

impl std::fmt::Display for LanguageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageStatus::Complete => write!(f, "complete"),
            LanguageStatus::Incomplete => write!(f, "incomplete"),
            LanguageStatus::Error => write!(f, "error"),
        }
    }
}

/// Entry counts of one locale by status.
///
/// Entries without a status count as incomplete; permanent errors count as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub locale: String,
    pub status: LanguageStatus,
    pub total: usize,
    pub complete: usize,
    pub incomplete: usize,
    pub error: usize,
}

impl StoreSummary {
    /// Entries still needing work.
    pub fn remaining(&self) -> usize {
        self.incomplete + self.error
    }
}

pub fn summarize_store(store: &LocaleStore) -> StoreSummary {
    let mut complete = 0;
    let mut incomplete = 0;
    let mut error = 0;
    for entry in &store.entries {
        match &entry.status {
            Some(EntryStatus::Complete) => complete += 1,
            Some(status) if status.is_error() => error += 1,
            _ => incomplete += 1,
        }
    }

    let total = store.len();
    let status = if total == 0 {
        LanguageStatus::Incomplete
    } else if incomplete == 0 && error == 0 {
        LanguageStatus::Complete
    } else if error > 0 {
        LanguageStatus::Error
    } else {
        LanguageStatus::Incomplete
    };

    StoreSummary {
        locale: store.language.clone(),
        status,
        total,
        complete,
        incomplete,
        error,
    }
}

/// Status of every target locale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusReport {
    pub reference_locale: String,
    pub reference_entries: usize,
    pub languages: Vec<StoreSummary>,
}

impl StatusReport {
    pub fn count(&self, status: LanguageStatus) -> usize {
        self.languages.iter().filter(|l| l.status == status).count()
    }

    /// Unfinished locales, those closest to completion first.
    pub fn fewest_remaining(&self, limit: usize) -> Vec<&StoreSummary> {
        let mut unfinished: Vec<&StoreSummary> = self
            .languages
            .iter()
            .filter(|l| l.status != LanguageStatus::Complete && l.remaining() > 0)
            .collect();
        unfinished.sort_by_key(|l| l.remaining());
        unfinished.truncate(limit);
        unfinished
    }

    /// Locales with error entries, most errors first.
    pub fn most_errors(&self, limit: usize) -> Vec<&StoreSummary> {
        let mut with_errors: Vec<&StoreSummary> =
            self.languages.iter().filter(|l| l.error > 0).collect();
        with_errors.sort_by(|a, b| b.error.cmp(&a.error));
        with_errors.truncate(limit);
        with_errors
    }
}

/// Summarizes every locale of `adapter` except the reference.
pub fn status_report(
    adapter: &dyn StoreAdapter,
    reference_locale: &str,
) -> Result<StatusReport, Error> {
    let reference = adapter.load(reference_locale)?;
    let mut languages = Vec::new();
    for locale in sorted_locales(adapter)? {
        if locale == reference_locale {
            continue;
        }
        languages.push(summarize_store(&adapter.load(&locale)?));
    }
    Ok(StatusReport {
        reference_locale: reference_locale.to_string(),
        reference_entries: reference.len(),
        languages,
    })
}

/// Totals over all locales of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub locales: usize,
    pub done: usize,
    pub skipped_invalid_language: usize,
    pub failed: usize,
    pub queued: usize,
    pub translated: usize,
    pub unchanged: usize,
    pub marked_complete: usize,
    pub errors: usize,
    pub permanent_errors: usize,
}

pub fn summarize_run(report: &RunReport) -> RunSummary {
    let mut summary = RunSummary {
        locales: report.locales.len(),
        ..RunSummary::default()
    };
    for locale in &report.locales {
        match locale.outcome {
            LocaleOutcome::Done => summary.done += 1,
            LocaleOutcome::SkippedInvalidLanguage => summary.skipped_invalid_language += 1,
            LocaleOutcome::Failed(_) => summary.failed += 1,
        }
        summary.queued += locale.queued;
        summary.translated += locale.translated;
        summary.unchanged += locale.unchanged;
        summary.marked_complete += locale.marked_complete;
        summary.errors += locale.errors;
        summary.permanent_errors += locale.permanent_errors;
    }
    summary
}
