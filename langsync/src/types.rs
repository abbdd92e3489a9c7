//! Core, format-agnostic types for langsync.
//! Store adapters decode into these; the classifier and reconciler operate on them.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

const STATUS_PREFIX: &str = "status:";
const COMPLETE_MARKER: &str = "status:complete";
const INCOMPLETE_MARKER: &str = "status:incomplete";
const ERROR_PREFIX: &str = "status:error:";
const PERMANENT_MARKER: &str = "status:error:permanent";
const REASON_ESCAPE: char = '\\';

/// Error reasons that would read back as a permanent marker, or that start with the escape
/// character themselves, are written with a leading backslash.
fn needs_escape(reason: &str) -> bool {
    reason == "permanent" || reason.starts_with("permanent:") || reason.starts_with(REASON_ESCAPE)
}

/// All entries of one locale (corresponds to a single `Resources.resw` file).
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct LocaleStore {
    /// The locale identifier (e.g. "en-US", "fr-FR").
    pub language: String,

    /// Ordered list of all entries. Order is kept for stable output only.
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl LocaleStore {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            entries: Vec::new(),
        }
    }

    pub fn with_entries(language: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            language: language.into(),
            entries,
        }
    }

    /// Appends an entry. Callers are responsible for key uniqueness.
    pub fn add_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Removes the entry with `key`, returning it if it was present.
    pub fn remove_entry(&mut self, key: &str) -> Option<Entry> {
        let index = self.entries.iter().position(|e| e.key == key)?;
        Some(self.entries.remove(index))
    }

    pub fn find_entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn find_entry_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find_entry(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single keyed text entry with its translation status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Entry {
    /// Unique key within the store (`<data name="...">` in `.resw`).
    pub key: String,

    /// The text value.
    pub value: String,

    /// Translation status. `None` for entries written before statuses were tracked.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub status: Option<EntryStatus>,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = Some(status);
        self
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.status {
            Some(status) => write!(
                f,
                "Entry {{ key: {}, value: {}, status: {} }}",
                self.key, self.value, status
            ),
            None => write!(f, "Entry {{ key: {}, value: {} }}", self.key, self.value),
        }
    }
}

/// Translation status of an entry.
///
/// Stored in resource files as a `status:` marker string; see the [`Display`] and
/// [`FromStr`] implementations for the exact forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum EntryStatus {
    /// The value is final and is never touched again by automation.
    Complete,

    /// The value still mirrors the reference text and should be translated.
    Incomplete,

    /// The last translation attempt failed for the given reason.
    Error(String),

    /// Translation failed twice in a row or the locale is unsupported.
    /// Automation skips the entry until someone edits it by hand.
    PermanentError(Option<String>),
}

impl EntryStatus {
    /// `Error` or `PermanentError`.
    pub fn is_error(&self) -> bool {
        matches!(self, EntryStatus::Error(_) | EntryStatus::PermanentError(_))
    }

    /// Statuses whose value automation must never overwrite.
    pub fn is_final(&self) -> bool {
        matches!(self, EntryStatus::Complete | EntryStatus::PermanentError(_))
    }

    /// The escalated status after a failed attempt, given the status before it.
    ///
    /// A second consecutive failure becomes permanent.
    pub fn after_failure(previous: Option<&EntryStatus>, reason: &str) -> EntryStatus {
        match previous {
            Some(EntryStatus::Error(_)) => EntryStatus::PermanentError(Some(reason.to_string())),
            _ => EntryStatus::Error(reason.to_string()),
        }
    }
}

impl Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryStatus::Complete => write!(f, "{}", COMPLETE_MARKER),
            EntryStatus::Incomplete => write!(f, "{}", INCOMPLETE_MARKER),
            EntryStatus::Error(reason) if needs_escape(reason) => {
                write!(f, "{}{}{}", ERROR_PREFIX, REASON_ESCAPE, reason)
            }
            EntryStatus::Error(reason) => write!(f, "{}{}", ERROR_PREFIX, reason),
            EntryStatus::PermanentError(None) => write!(f, "{}", PERMANENT_MARKER),
            EntryStatus::PermanentError(Some(reason)) => {
                write!(f, "{}:{}", PERMANENT_MARKER, reason)
            }
        }
    }
}

impl FromStr for EntryStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let marker = s.trim();
        if !marker.starts_with(STATUS_PREFIX) {
            return Err(Error::UnknownStatus(marker.to_string()));
        }

        if marker == COMPLETE_MARKER {
            return Ok(EntryStatus::Complete);
        }
        if marker == INCOMPLETE_MARKER {
            return Ok(EntryStatus::Incomplete);
        }
        if let Some(rest) = marker.strip_prefix(PERMANENT_MARKER) {
            return match rest.strip_prefix(':') {
                Some(reason) if !reason.is_empty() => {
                    Ok(EntryStatus::PermanentError(Some(reason.to_string())))
                }
                _ if rest.is_empty() || rest == ":" => Ok(EntryStatus::PermanentError(None)),
                // e.g. "status:error:permanently broken" is an ordinary error reason
                _ => Ok(EntryStatus::Error(
                    marker[ERROR_PREFIX.len()..].to_string(),
                )),
            };
        }
        if let Some(reason) = marker.strip_prefix(ERROR_PREFIX) {
            let reason = reason.strip_prefix(REASON_ESCAPE).unwrap_or(reason);
            return Ok(EntryStatus::Error(reason.to_string()));
        }

        Err(Error::UnknownStatus(marker.to_string()))
    }
}

/// A key queued for a translation attempt in the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    pub key: String,
    /// The reference (source-language) value to translate.
    pub source: String,
}

impl WorkItem {
    pub fn new(key: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: source.into(),
        }
    }
}
