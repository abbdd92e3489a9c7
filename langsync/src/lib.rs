#![forbid(unsafe_code)]
//! Translation status reconciliation for per-locale resource stores.
//!
//! Keeps a set of locale stores (one `Resources.resw` per locale) in sync with a
//! reference locale, tracking for every entry whether its translation is complete,
//! pending or failed.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use langsync::{LibreTranslate, ReconcileOptions, Reconciler, ReswDirectory, ThreadSleeper};
//! use langsync::service::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
//!
//! let store = ReswDirectory::new("Strings");
//! let service = LibreTranslate::new(DEFAULT_ENDPOINT, DEFAULT_TIMEOUT)?;
//! let options = ReconcileOptions::default();
//! let mut reconciler = Reconciler::new(store, service, ThreadSleeper, options);
//! let report = reconciler.run()?;
//! println!("{} locales processed", report.locales.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Statuses
//!
//! Every entry carries one of `status:complete`, `status:incomplete`,
//! `status:error:<reason>` or `status:error:permanent[:<reason>]` in its `<comment>`.
//! Complete and permanently failed entries are never touched by automation; an entry whose
//! value differs from the reference value counts as translated.

pub mod classifier;
pub mod error;
pub mod formats;
pub mod gateway;
pub mod languages;
pub mod operations;
pub mod reconcile;
pub mod service;
pub mod store;
pub mod traits;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    classifier::{Classification, StatusUpdate, apply_updates, classify, completion_sweep},
    error::Error,
    gateway::{
        Failure, Gateway, RetryPolicy, ServiceError, Sleeper, ThreadSleeper, TranslationService,
        Translated,
    },
    languages::{LanguageMap, ServiceLanguage, TechnicalKeys},
    operations::{
        EditReport, EditState, LanguageStatus, RunSummary, StatusReport, StoreSummary, add_entry,
        remove_entry, status_report, summarize_run, summarize_store,
    },
    reconcile::{LocaleOutcome, LocaleReport, ReconcileOptions, Reconciler, RunReport},
    service::LibreTranslate,
    store::{MemoryStore, ReswDirectory},
    traits::{Parser, StoreAdapter},
    types::{Entry, EntryStatus, LocaleStore, WorkItem},
};
