//! Status classification of target entries against the reference store.
//!
//! [`classify`] decides, for every reference key, whether the target entry needs a
//! translation attempt or only a status correction. [`completion_sweep`] makes sure every
//! entry of a store ends up with a status, including stores written before statuses
//! were tracked.
//!
//! An entry whose value differs from the reference value is treated as translated. This
//! is a heuristic: a word that is legitimately identical in both languages, or a manual
//! placeholder edit, cannot be told apart from a real translation.

use serde::Serialize;

use crate::{
    languages::TechnicalKeys,
    types::{Entry, EntryStatus, LocaleStore, WorkItem},
};

/// A status correction produced by [`classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusUpdate {
    /// Set the status of an existing entry.
    Mark { key: String, status: EntryStatus },
    /// Create a missing entry.
    Insert {
        key: String,
        value: String,
        status: EntryStatus,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Entries needing a translation attempt, in reference order.
    pub work: Vec<WorkItem>,
    /// Status corrections for entries that need no translation.
    pub updates: Vec<StatusUpdate>,
}

/// Classifies every reference key against `target`.
///
/// Rules, in order:
/// 1. technical keys are forced `Complete` and never queued;
/// 2. keys missing from the target are queued;
/// 3. a target value that differs from the reference value is `Complete`, whatever its
///    stored status (a human or an earlier run translated it);
/// 4. an unchanged value marked `Complete` or `PermanentError` is left alone;
/// 5. anything else (`Incomplete`, `Error`, no status) is queued.
///
/// Keys present only in the target are ignored.
pub fn classify(
    reference: &LocaleStore,
    target: &LocaleStore,
    technical_keys: &TechnicalKeys,
) -> Classification {
    let mut classification = Classification::default();

    for source in &reference.entries {
        let key = source.key.as_str();
        let existing = target.find_entry(key);

        if technical_keys.contains(key) {
            match existing {
                Some(entry) if entry.status == Some(EntryStatus::Complete) => {}
                Some(_) => classification.updates.push(StatusUpdate::Mark {
                    key: key.to_string(),
                    status: EntryStatus::Complete,
                }),
                None => classification.updates.push(StatusUpdate::Insert {
                    key: key.to_string(),
                    value: source.value.clone(),
                    status: EntryStatus::Complete,
                }),
            }
            continue;
        }

        let Some(entry) = existing else {
            classification
                .work
                .push(WorkItem::new(key, source.value.clone()));
            continue;
        };

        if entry.value != source.value {
            if entry.status != Some(EntryStatus::Complete) {
                classification.updates.push(StatusUpdate::Mark {
                    key: key.to_string(),
                    status: EntryStatus::Complete,
                });
            }
            continue;
        }

        match &entry.status {
            Some(EntryStatus::Complete) | Some(EntryStatus::PermanentError(_)) => {}
            Some(EntryStatus::Incomplete) | Some(EntryStatus::Error(_)) | None => {
                classification
                    .work
                    .push(WorkItem::new(key, source.value.clone()));
            }
        }
    }

    classification
}

/// Applies `updates` to `target`, returning how many entries changed.
pub fn apply_updates(target: &mut LocaleStore, updates: &[StatusUpdate]) -> usize {
    let mut changed = 0;
    for update in updates {
        match update {
            StatusUpdate::Mark { key, status } => {
                if let Some(entry) = target.find_entry_mut(key)
                    && entry.status.as_ref() != Some(status)
                {
                    entry.status = Some(status.clone());
                    changed += 1;
                }
            }
            StatusUpdate::Insert { key, value, status } => {
                if !target.contains_key(key) {
                    target.add_entry(
                        Entry::new(key.clone(), value.clone()).with_status(status.clone()),
                    );
                    changed += 1;
                }
            }
        }
    }
    changed
}

/// Gives every entry of `store` a status, returning how many entries changed.
///
/// `reference` is `None` when `store` is itself the reference store; its unmarked entries
/// become `Complete`. In a target store an unmarked entry is `Complete` when its value
/// diverges from the reference value and `Incomplete` otherwise; unmarked keys the
/// reference does not know are `Incomplete`. Technical keys are always `Complete`.
/// Existing statuses are kept, so running the sweep twice changes nothing the second time.
pub fn completion_sweep(
    store: &mut LocaleStore,
    reference: Option<&LocaleStore>,
    technical_keys: &TechnicalKeys,
) -> usize {
    let mut changed = 0;

    for entry in &mut store.entries {
        let status = if technical_keys.contains(&entry.key) {
            if entry.status == Some(EntryStatus::Complete) {
                continue;
            }
            EntryStatus::Complete
        } else if entry.status.is_some() {
            continue;
        } else {
            match reference {
                None => EntryStatus::Complete,
                Some(reference) => match reference.find_entry(&entry.key) {
                    Some(source) if source.value != entry.value => EntryStatus::Complete,
                    Some(_) | None => EntryStatus::Incomplete,
                },
            }
        };

        entry.status = Some(status);
        changed += 1;
    }

    changed
}
