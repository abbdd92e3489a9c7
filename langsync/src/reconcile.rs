//! The reconciliation driver.
//!
//! [`Reconciler::run`] walks every target locale in alphabetical order. For each one it
//! classifies the entries against the reference store, persists the status corrections,
//! sends the remaining work through the [`Gateway`] and writes the outcomes back in
//! batches. A final completion sweep leaves no entry without a status.
//!
//! Outcomes are always applied to a freshly loaded copy of the store, so edits made by
//! someone else while the run is in progress are respected: an entry that stopped
//! mirroring the reference value is kept as is and marked complete.

use std::{collections::BTreeSet, time::Duration};

use serde::Serialize;

use crate::{
    classifier::{apply_updates, classify, completion_sweep},
    error::Error,
    gateway::{
        Failure, Gateway, INVALID_LANGUAGE_REASON, RetryPolicy, Sleeper, TranslationService,
        Translated,
    },
    languages::{LanguageMap, ServiceLanguage, TechnicalKeys},
    traits::StoreAdapter,
    types::{Entry, EntryStatus, LocaleStore, WorkItem},
};

pub const DEFAULT_REFERENCE_LOCALE: &str = "en-US";

/// Immutable settings of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Locale whose store is authoritative for keys and source text.
    pub reference_locale: String,
    /// Service language code of the reference text.
    pub source_language: String,
    pub technical_keys: TechnicalKeys,
    pub language_map: LanguageMap,
    pub retry: RetryPolicy,
    /// Outcomes are persisted every `batch_size` items and after the last one.
    pub batch_size: usize,
    /// Consecutive failures before the driver pauses for `failure_cooldown`.
    pub failure_threshold: usize,
    pub failure_cooldown: Duration,
    /// Pause between two work items.
    pub item_delay: Duration,
    /// Pause between two locales.
    pub inter_locale_delay: Duration,
    /// Restricts the run to these target locales.
    pub only: Option<BTreeSet<String>>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            reference_locale: DEFAULT_REFERENCE_LOCALE.to_string(),
            source_language: "en".to_string(),
            technical_keys: TechnicalKeys::default(),
            language_map: LanguageMap::default(),
            retry: RetryPolicy::default(),
            batch_size: 5,
            failure_threshold: 5,
            failure_cooldown: Duration::from_secs(2),
            item_delay: Duration::from_millis(200),
            inter_locale_delay: Duration::from_secs(1),
            only: None,
        }
    }
}

impl ReconcileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_locale(mut self, locale: impl Into<String>) -> Self {
        self.reference_locale = locale.into();
        self
    }

    pub fn with_source_language(mut self, language: impl Into<String>) -> Self {
        self.source_language = language.into();
        self
    }

    pub fn with_technical_keys(mut self, technical_keys: TechnicalKeys) -> Self {
        self.technical_keys = technical_keys;
        self
    }

    pub fn with_language_map(mut self, language_map: LanguageMap) -> Self {
        self.language_map = language_map;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_failure_throttle(mut self, threshold: usize, cooldown: Duration) -> Self {
        self.failure_threshold = threshold;
        self.failure_cooldown = cooldown;
        self
    }

    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    pub fn with_inter_locale_delay(mut self, delay: Duration) -> Self {
        self.inter_locale_delay = delay;
        self
    }

    pub fn with_only<I, S>(mut self, locales: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = locales.map(|l| l.into_iter().map(Into::into).collect());
        self
    }

    /// Disables every pause. Useful in tests and dry runs.
    pub fn without_delays(mut self) -> Self {
        self.failure_cooldown = Duration::ZERO;
        self.item_delay = Duration::ZERO;
        self.inter_locale_delay = Duration::ZERO;
        self.retry.backoff_unit = Duration::ZERO;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.reference_locale.trim().is_empty() {
            return Err(Error::config_error("reference locale must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(Error::config_error("batch_size must be at least 1"));
        }
        if self.failure_threshold == 0 {
            return Err(Error::config_error("failure_threshold must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config_error("max_attempts must be at least 1"));
        }
        Ok(())
    }
}

/// Terminal state of one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum LocaleOutcome {
    #[default]
    Done,
    /// The service cannot translate into this locale; all pending entries were marked
    /// permanently failed.
    SkippedInvalidLanguage,
    /// Loading or saving the locale failed; the run went on with the next locale.
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocaleReport {
    pub locale: String,
    pub outcome: LocaleOutcome,
    /// Entries that needed a translation attempt.
    pub queued: usize,
    pub translated: usize,
    /// Entries the service returned unchanged.
    pub unchanged: usize,
    /// Entries marked complete without a translation (divergent or technical).
    pub marked_complete: usize,
    pub errors: usize,
    pub permanent_errors: usize,
    /// Entries given a status by the completion sweep.
    pub swept: usize,
    pub saves: usize,
}

impl LocaleReport {
    fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub reference_locale: String,
    /// Reference entries given a status before the run.
    pub reference_swept: usize,
    pub locales: Vec<LocaleReport>,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &LocaleReport> {
        self.locales
            .iter()
            .filter(|l| matches!(l.outcome, LocaleOutcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}

/// What happened to one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Translated(String),
    Unchanged,
    Failed(String),
    Permanent(String),
}

impl From<Result<Translated, Failure>> for Outcome {
    fn from(result: Result<Translated, Failure>) -> Self {
        match result {
            Ok(Translated::Text(text)) => Outcome::Translated(text),
            Ok(Translated::Unchanged) => Outcome::Unchanged,
            Err(Failure::Transient(reason)) => Outcome::Failed(reason),
            Err(Failure::Permanent(reason)) => Outcome::Permanent(reason),
        }
    }
}

#[derive(Debug)]
struct Pending {
    item: WorkItem,
    outcome: Outcome,
}

pub struct Reconciler<A, S, P> {
    adapter: A,
    gateway: Gateway<S>,
    sleeper: P,
    options: ReconcileOptions,
}

impl<A, S, P> Reconciler<A, S, P>
where
    A: StoreAdapter,
    S: TranslationService,
    P: Sleeper,
{
    pub fn new(adapter: A, service: S, sleeper: P, options: ReconcileOptions) -> Self {
        let gateway = Gateway::new(service, options.source_language.clone(), options.retry);
        Self {
            adapter,
            gateway,
            sleeper,
            options,
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn service(&self) -> &S {
        self.gateway.service()
    }

    pub fn sleeper(&self) -> &P {
        &self.sleeper
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    /// Reconciles every target locale against the reference store.
    ///
    /// Fails only when the options are invalid or the reference store cannot be read or
    /// written. Errors of a single target locale are recorded in its report as
    /// [`LocaleOutcome::Failed`].
    pub fn run(&mut self) -> Result<RunReport, Error> {
        self.options.validate()?;

        let reference_locale = self.options.reference_locale.clone();
        let mut reference = self.adapter.load(&reference_locale)?;
        let reference_swept =
            completion_sweep(&mut reference, None, &self.options.technical_keys);
        if reference_swept > 0 {
            self.adapter.save(&reference)?;
            tracing::info!(
                locale = %reference_locale,
                "marked {} reference entries complete",
                reference_swept
            );
        }

        let mut report = RunReport {
            reference_locale,
            reference_swept,
            locales: Vec::new(),
        };

        let locales = self.target_locales()?;
        tracing::info!(
            "reconciling {} locales against {}",
            locales.len(),
            report.reference_locale
        );

        for (index, locale) in locales.iter().enumerate() {
            if index > 0 {
                self.sleeper.sleep(self.options.inter_locale_delay);
            }

            let mut locale_report = LocaleReport::new(locale);
            match self.reconcile_locale(&reference, locale, &mut locale_report) {
                Ok(outcome) => locale_report.outcome = outcome,
                Err(e) => {
                    tracing::error!(locale = %locale, "reconciliation failed: {}", e);
                    locale_report.outcome = LocaleOutcome::Failed(e.to_string());
                }
            }
            tracing::info!(
                locale = %locale,
                queued = locale_report.queued,
                translated = locale_report.translated,
                unchanged = locale_report.unchanged,
                errors = locale_report.errors,
                permanent_errors = locale_report.permanent_errors,
                "finished: {:?}",
                locale_report.outcome
            );
            report.locales.push(locale_report);
        }

        Ok(report)
    }

    fn target_locales(&self) -> Result<Vec<String>, Error> {
        let available: BTreeSet<String> = self
            .adapter
            .locales()?
            .into_iter()
            .filter(|l| *l != self.options.reference_locale)
            .collect();

        let Some(only) = &self.options.only else {
            return Ok(available.into_iter().collect());
        };
        for missing in only.difference(&available) {
            tracing::warn!(locale = %missing, "requested locale not found, skipping");
        }
        Ok(available.intersection(only).cloned().collect())
    }

    fn reconcile_locale(
        &mut self,
        reference: &LocaleStore,
        locale: &str,
        report: &mut LocaleReport,
    ) -> Result<LocaleOutcome, Error> {
        let mut target = self.adapter.load(locale)?;
        let classification = classify(reference, &target, &self.options.technical_keys);
        report.queued = classification.work.len();

        let corrected = apply_updates(&mut target, &classification.updates);
        if corrected > 0 {
            report.marked_complete += corrected;
            self.adapter.save(&target)?;
            report.saves += 1;
        }

        if classification.work.is_empty() {
            tracing::debug!(locale, "nothing to translate");
            self.sweep(reference, locale, report)?;
            return Ok(LocaleOutcome::Done);
        }

        let target_language = match self.options.language_map.resolve(locale) {
            ServiceLanguage::Code(code) => code,
            ServiceLanguage::Unsupported => {
                tracing::warn!(locale, "language not supported by the translation service");
                let mut pending = classification
                    .work
                    .into_iter()
                    .map(|item| Pending {
                        item,
                        outcome: Outcome::Permanent(INVALID_LANGUAGE_REASON.to_string()),
                    })
                    .collect();
                self.flush(locale, &mut pending, report)?;
                self.sweep(reference, locale, report)?;
                return Ok(LocaleOutcome::SkippedInvalidLanguage);
            }
        };

        tracing::info!(
            locale,
            target_language = %target_language,
            "translating {} entries",
            report.queued
        );

        let batch_size = self.options.batch_size;
        let total = classification.work.len();
        let mut work = classification.work.into_iter();
        let mut pending: Vec<Pending> = Vec::with_capacity(batch_size);
        let mut consecutive_failures = 0;
        let mut processed = 0;

        while let Some(item) = work.next() {
            processed += 1;
            let result = self
                .gateway
                .translate(&item.source, &target_language, &mut self.sleeper);

            if let Err(Failure::Permanent(reason)) = &result {
                tracing::warn!(
                    locale,
                    key = %item.key,
                    "{}, marking remaining {} entries permanently failed",
                    reason,
                    total - processed + 1
                );
                let reason = reason.clone();
                pending.push(Pending {
                    item,
                    outcome: Outcome::Permanent(reason.clone()),
                });
                pending.extend(work.map(|item| Pending {
                    item,
                    outcome: Outcome::Permanent(reason.clone()),
                }));
                self.flush(locale, &mut pending, report)?;
                self.sweep(reference, locale, report)?;
                return Ok(LocaleOutcome::SkippedInvalidLanguage);
            }

            let outcome = Outcome::from(result);
            if matches!(outcome, Outcome::Failed(_)) {
                consecutive_failures += 1;
            } else {
                consecutive_failures = 0;
            }
            tracing::debug!(locale, key = %item.key, "{}/{}: {:?}", processed, total, outcome);
            pending.push(Pending { item, outcome });

            if pending.len() >= batch_size || processed == total {
                self.flush(locale, &mut pending, report)?;
            }

            if processed < total {
                if consecutive_failures >= self.options.failure_threshold {
                    tracing::warn!(
                        locale,
                        "{} consecutive failures, pausing for {:?}",
                        consecutive_failures,
                        self.options.failure_cooldown
                    );
                    self.sleeper.sleep(self.options.failure_cooldown);
                    consecutive_failures = 0;
                } else {
                    self.sleeper.sleep(self.options.item_delay);
                }
            }
        }

        self.sweep(reference, locale, report)?;
        Ok(LocaleOutcome::Done)
    }

    /// Applies `pending` to the latest persisted state of `locale` and saves it.
    fn flush(
        &mut self,
        locale: &str,
        pending: &mut Vec<Pending>,
        report: &mut LocaleReport,
    ) -> Result<(), Error> {
        if pending.is_empty() {
            return Ok(());
        }
        let mut store = self.adapter.load(locale)?;
        for Pending { item, outcome } in pending.drain(..) {
            apply_outcome(&mut store, &item, outcome, report);
        }
        self.adapter.save(&store)?;
        report.saves += 1;
        Ok(())
    }

    fn sweep(
        &mut self,
        reference: &LocaleStore,
        locale: &str,
        report: &mut LocaleReport,
    ) -> Result<(), Error> {
        let mut store = self.adapter.load(locale)?;
        let changed = completion_sweep(&mut store, Some(reference), &self.options.technical_keys);
        if changed > 0 {
            tracing::debug!(locale, "completion sweep set {} statuses", changed);
            self.adapter.save(&store)?;
            report.swept += changed;
            report.saves += 1;
        }
        Ok(())
    }
}

fn apply_outcome(
    store: &mut LocaleStore,
    item: &WorkItem,
    outcome: Outcome,
    report: &mut LocaleReport,
) {
    let Some(entry) = store.find_entry_mut(&item.key) else {
        let entry = match outcome {
            Outcome::Translated(text) => {
                report.translated += 1;
                Entry::new(item.key.clone(), text).with_status(EntryStatus::Complete)
            }
            Outcome::Unchanged => {
                report.unchanged += 1;
                Entry::new(item.key.clone(), item.source.clone())
                    .with_status(EntryStatus::Complete)
            }
            Outcome::Failed(reason) => {
                report.errors += 1;
                Entry::new(item.key.clone(), item.source.clone())
                    .with_status(EntryStatus::Error(reason))
            }
            Outcome::Permanent(reason) => {
                report.permanent_errors += 1;
                Entry::new(item.key.clone(), item.source.clone())
                    .with_status(EntryStatus::PermanentError(Some(reason)))
            }
        };
        store.add_entry(entry);
        return;
    };

    if entry.value != item.source {
        if entry.status != Some(EntryStatus::Complete) {
            tracing::debug!(key = %item.key, "edited during the run, keeping the current value");
            entry.status = Some(EntryStatus::Complete);
            report.marked_complete += 1;
        }
        return;
    }
    if entry.status.as_ref().is_some_and(EntryStatus::is_final) {
        return;
    }

    match outcome {
        Outcome::Translated(text) => {
            entry.value = text;
            entry.status = Some(EntryStatus::Complete);
            report.translated += 1;
        }
        Outcome::Unchanged => {
            entry.status = Some(EntryStatus::Complete);
            report.unchanged += 1;
        }
        Outcome::Failed(reason) => {
            let status = EntryStatus::after_failure(entry.status.as_ref(), &reason);
            if matches!(status, EntryStatus::PermanentError(_)) {
                report.permanent_errors += 1;
            } else {
                report.errors += 1;
            }
            entry.status = Some(status);
        }
        Outcome::Permanent(reason) => {
            entry.status = Some(EntryStatus::PermanentError(Some(reason)));
            report.permanent_errors += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{gateway::ServiceError, store::MemoryStore};

    #[derive(Default)]
    struct RecordingSleeper(Vec<Duration>);

    impl Sleeper for RecordingSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.0.push(duration);
        }
    }

    type Script = fn(&str, &str) -> Result<String, ServiceError>;

    /// Answers with `script(text, target)` and records every call.
    struct FakeService {
        script: Script,
        calls: Vec<(String, String)>,
    }

    impl FakeService {
        fn new(script: Script) -> Self {
            Self {
                script,
                calls: Vec::new(),
            }
        }

        fn calls_for(&self, target: &str) -> usize {
            self.calls.iter().filter(|(_, t)| t == target).count()
        }
    }

    impl TranslationService for FakeService {
        fn translate(
            &mut self,
            text: &str,
            _source_language: &str,
            target_language: &str,
        ) -> Result<String, ServiceError> {
            self.calls
                .push((text.to_string(), target_language.to_string()));
            (self.script)(text, target_language)
        }
    }

    fn uppercase(text: &str, target: &str) -> Result<String, ServiceError> {
        Ok(format!("{}:{}", target, text.to_uppercase()))
    }

    fn always_fails(_: &str, _: &str) -> Result<String, ServiceError> {
        Err(ServiceError::Other("service unavailable".to_string()))
    }

    fn reference(entries: &[(&str, &str)]) -> LocaleStore {
        LocaleStore::with_entries(
            "en-US",
            entries
                .iter()
                .map(|(k, v)| Entry::new(*k, *v).with_status(EntryStatus::Complete))
                .collect(),
        )
    }

    fn options() -> ReconcileOptions {
        ReconcileOptions::default()
            .with_technical_keys(TechnicalKeys::new(["AppName"]))
            .without_delays()
    }

    fn run(
        memory: MemoryStore,
        script: Script,
        options: ReconcileOptions,
    ) -> (RunReport, Reconciler<MemoryStore, FakeService, RecordingSleeper>) {
        let mut reconciler = Reconciler::new(
            memory,
            FakeService::new(script),
            RecordingSleeper::default(),
            options,
        );
        let report = reconciler.run().unwrap();
        (report, reconciler)
    }

    fn entry<'a>(
        reconciler: &'a Reconciler<MemoryStore, FakeService, RecordingSleeper>,
        locale: &str,
        key: &str,
    ) -> &'a Entry {
        reconciler
            .adapter()
            .get(locale)
            .unwrap()
            .find_entry(key)
            .unwrap()
    }

    #[test]
    fn test_missing_entry_is_translated_and_created() {
        let memory = MemoryStore::new()
            .with_store(reference(&[("Greeting", "Hello")]))
            .with_store(LocaleStore::new("fr-FR"));
        let (report, reconciler) = run(memory, uppercase, options());

        let greeting = entry(&reconciler, "fr-FR", "Greeting");
        assert_eq!(greeting.value, "fr:HELLO");
        assert_eq!(greeting.status, Some(EntryStatus::Complete));
        assert_eq!(report.locales[0].translated, 1);
        assert_eq!(report.locales[0].outcome, LocaleOutcome::Done);
    }

    #[test]
    fn test_missing_entry_fails_twice_across_runs() {
        let memory = MemoryStore::new()
            .with_store(reference(&[("Greeting", "Hello")]))
            .with_store(LocaleStore::new("fr-FR"));
        let (_, reconciler) = run(memory, always_fails, options());
        let greeting = entry(&reconciler, "fr-FR", "Greeting");
        assert_eq!(greeting.value, "Hello");
        assert_eq!(
            greeting.status,
            Some(EntryStatus::Error("service unavailable".to_string()))
        );

        let (report, reconciler) = run(reconciler.into_adapter(), always_fails, options());
        let greeting = entry(&reconciler, "fr-FR", "Greeting");
        assert_eq!(greeting.value, "Hello");
        assert_eq!(
            greeting.status,
            Some(EntryStatus::PermanentError(Some(
                "service unavailable".to_string()
            )))
        );
        assert_eq!(report.locales[0].permanent_errors, 1);

        // a third run leaves it alone
        let (report, reconciler) = run(reconciler.into_adapter(), always_fails, options());
        assert_eq!(report.locales[0].queued, 0);
        assert_eq!(reconciler.service().calls.len(), 0);
    }

    #[test]
    fn test_divergent_value_is_complete_without_gateway_call() {
        let memory = MemoryStore::new()
            .with_store(reference(&[("Greeting", "Hello")]))
            .with_store(LocaleStore::with_entries(
                "fr-FR",
                vec![Entry::new("Greeting", "Bonjour")],
            ));
        let (report, reconciler) = run(memory, uppercase, options());

        let greeting = entry(&reconciler, "fr-FR", "Greeting");
        assert_eq!(greeting.value, "Bonjour");
        assert_eq!(greeting.status, Some(EntryStatus::Complete));
        assert!(reconciler.service().calls.is_empty());
        assert_eq!(report.locales[0].marked_complete, 1);
    }

    #[test]
    fn test_divergence_overrides_permanent_error() {
        let memory = MemoryStore::new()
            .with_store(reference(&[("Greeting", "Hello")]))
            .with_store(LocaleStore::with_entries(
                "fr-FR",
                vec![
                    Entry::new("Greeting", "Salut")
                        .with_status(EntryStatus::PermanentError(None)),
                ],
            ));
        let (_, reconciler) = run(memory, uppercase, options());
        assert_eq!(
            entry(&reconciler, "fr-FR", "Greeting").status,
            Some(EntryStatus::Complete)
        );
    }

    #[test]
    fn test_technical_keys_are_never_sent() {
        let memory = MemoryStore::new()
            .with_store(reference(&[("AppName", "Downloader"), ("Greeting", "Hello")]))
            .with_store(LocaleStore::with_entries(
                "de-DE",
                vec![Entry::new("AppName", "Downloader").with_status(EntryStatus::Incomplete)],
            ))
            .with_store(LocaleStore::new("it-IT"));
        let (_, reconciler) = run(memory, uppercase, options());

        for locale in ["de-DE", "it-IT"] {
            let app_name = entry(&reconciler, locale, "AppName");
            assert_eq!(app_name.value, "Downloader");
            assert_eq!(app_name.status, Some(EntryStatus::Complete));
        }
        assert!(
            reconciler
                .service()
                .calls
                .iter()
                .all(|(text, _)| text != "Downloader")
        );
    }

    #[test]
    fn test_invalid_language_short_circuits_locale() {
        fn reject_second(text: &str, _: &str) -> Result<String, ServiceError> {
            if text == "Two" {
                Err(ServiceError::InvalidTargetLanguage(
                    "invalid destination language".to_string(),
                ))
            } else {
                Ok(text.to_lowercase())
            }
        }

        let keys = [("A", "One"), ("B", "Two"), ("C", "Three"), ("D", "Four")];
        let memory = MemoryStore::new()
            .with_store(reference(&keys))
            .with_store(LocaleStore::new("xx-XX"))
            .with_store(LocaleStore::new("yy-YY"));
        let (report, reconciler) = run(memory, reject_second, options());

        let xx = &report.locales[0];
        assert_eq!(xx.outcome, LocaleOutcome::SkippedInvalidLanguage);
        assert_eq!(reconciler.service().calls_for("xx"), 2);
        assert_eq!(entry(&reconciler, "xx-XX", "A").status, Some(EntryStatus::Complete));
        for key in ["B", "C", "D"] {
            let e = entry(&reconciler, "xx-XX", key);
            assert_eq!(
                e.status,
                Some(EntryStatus::PermanentError(Some(
                    "invalid destination language".to_string()
                )))
            );
        }
        assert_eq!(xx.permanent_errors, 3);

        // other locales are unaffected
        assert_eq!(report.locales[1].outcome, LocaleOutcome::SkippedInvalidLanguage);
        assert_eq!(reconciler.service().calls_for("yy"), 2);
    }

    #[test]
    fn test_unsupported_locale_is_skipped_without_calls() {
        let memory = MemoryStore::new()
            .with_store(reference(&[("Greeting", "Hello")]))
            .with_store(LocaleStore::new("fj-FJ"));
        let (report, reconciler) = run(memory, uppercase, options());

        assert_eq!(report.locales[0].outcome, LocaleOutcome::SkippedInvalidLanguage);
        assert!(reconciler.service().calls.is_empty());
        let greeting = entry(&reconciler, "fj-FJ", "Greeting");
        assert_eq!(greeting.value, "Hello");
        assert!(matches!(greeting.status, Some(EntryStatus::PermanentError(_))));
    }

    #[test]
    fn test_outcomes_are_saved_in_batches() {
        let keys: Vec<(String, String)> = (1..=7)
            .map(|i| (format!("Key{}", i), format!("Text {}", i)))
            .collect();
        let borrowed: Vec<(&str, &str)> = keys
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let target = LocaleStore::with_entries(
            "es-ES",
            borrowed
                .iter()
                .map(|(k, v)| Entry::new(*k, *v).with_status(EntryStatus::Incomplete))
                .collect(),
        );
        let memory = MemoryStore::new()
            .with_store(reference(&borrowed))
            .with_store(target);
        let (report, reconciler) = run(memory, uppercase, options());

        assert_eq!(report.locales[0].queued, 7);
        assert_eq!(report.locales[0].translated, 7);
        assert_eq!(report.locales[0].saves, 2);
        assert_eq!(reconciler.adapter().save_count("es-ES"), 2);
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let memory = MemoryStore::new()
            .with_store(reference(&[("Greeting", "Hello"), ("Farewell", "Goodbye")]))
            .with_store(LocaleStore::with_entries(
                "fr-FR",
                vec![Entry::new("Legacy", "Ancien")],
            ));
        let (_, reconciler) = run(memory, uppercase, options());
        let after_first = reconciler.adapter().get("fr-FR").unwrap().clone();
        assert_eq!(
            after_first.find_entry("Legacy").unwrap().status,
            Some(EntryStatus::Incomplete)
        );

        let mut memory = reconciler.into_adapter();
        memory.saves.clear();
        let (report, reconciler) = run(memory, uppercase, options());
        assert_eq!(report.locales[0].queued, 0);
        assert_eq!(reconciler.adapter().save_count("fr-FR"), 0);
        assert_eq!(reconciler.adapter().get("fr-FR").unwrap(), &after_first);
    }

    #[test]
    fn test_failure_cooldown_after_threshold() {
        let keys: Vec<(String, String)> = (1..=7)
            .map(|i| (format!("Key{}", i), format!("Text {}", i)))
            .collect();
        let borrowed: Vec<(&str, &str)> = keys
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let memory = MemoryStore::new()
            .with_store(reference(&borrowed))
            .with_store(LocaleStore::new("es-ES"));
        let options = ReconcileOptions::default()
            .with_item_delay(Duration::from_millis(200))
            .with_failure_throttle(5, Duration::from_secs(2));
        let (report, reconciler) = run(memory, always_fails, options);

        assert_eq!(report.locales[0].errors, 7);
        let slept = &reconciler.sleeper().0;
        assert_eq!(slept.len(), 6);
        assert_eq!(slept[4], Duration::from_secs(2));
        assert!(
            slept
                .iter()
                .enumerate()
                .all(|(i, d)| i == 4 || *d == Duration::from_millis(200))
        );
    }

    #[test]
    fn test_reference_sweep_and_locale_filter() {
        let memory = MemoryStore::new()
            .with_store(LocaleStore::with_entries(
                "en-US",
                vec![Entry::new("Greeting", "Hello")],
            ))
            .with_store(LocaleStore::new("de-DE"))
            .with_store(LocaleStore::new("fr-FR"));
        let options = options().with_only(Some(["fr-FR", "zz-ZZ"]));
        let (report, reconciler) = run(memory, uppercase, options);

        assert_eq!(report.reference_swept, 1);
        assert_eq!(
            entry(&reconciler, "en-US", "Greeting").status,
            Some(EntryStatus::Complete)
        );
        let locales: Vec<&str> = report.locales.iter().map(|l| l.locale.as_str()).collect();
        assert_eq!(locales, vec!["fr-FR"]);
        assert!(reconciler.adapter().get("de-DE").unwrap().is_empty());
    }

    #[test]
    fn test_missing_reference_is_an_error() {
        let memory = MemoryStore::new().with_store(LocaleStore::new("fr-FR"));
        let mut reconciler = Reconciler::new(
            memory,
            FakeService::new(uppercase),
            RecordingSleeper::default(),
            options(),
        );
        assert!(matches!(reconciler.run(), Err(Error::LocaleNotFound(_))));
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let memory = MemoryStore::new().with_store(reference(&[("Greeting", "Hello")]));
        let mut reconciler = Reconciler::new(
            memory,
            FakeService::new(uppercase),
            RecordingSleeper::default(),
            options().with_batch_size(0),
        );
        assert!(matches!(reconciler.run(), Err(Error::Config(_))));
    }

    #[test]
    fn test_apply_outcome_respects_concurrent_edits() {
        let item = WorkItem::new("Greeting", "Hello");
        let mut report = LocaleReport::default();

        let mut edited = LocaleStore::with_entries(
            "fr-FR",
            vec![Entry::new("Greeting", "Coucou").with_status(EntryStatus::Incomplete)],
        );
        apply_outcome(&mut edited, &item, Outcome::Translated("Bonjour".to_string()), &mut report);
        let greeting = edited.find_entry("Greeting").unwrap();
        assert_eq!(greeting.value, "Coucou");
        assert_eq!(greeting.status, Some(EntryStatus::Complete));

        let mut finalized = LocaleStore::with_entries(
            "fr-FR",
            vec![Entry::new("Greeting", "Hello").with_status(EntryStatus::Complete)],
        );
        apply_outcome(&mut finalized, &item, Outcome::Failed("timeout".to_string()), &mut report);
        assert_eq!(
            finalized.find_entry("Greeting").unwrap().status,
            Some(EntryStatus::Complete)
        );
    }
}
