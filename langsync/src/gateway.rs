//! The translation gateway: retry, backoff and failure classification around a single
//! external "translate text" call.

use std::{thread, time::Duration};

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref PROVENANCE_PREFIX_REGEX: Regex = Regex::new(r"^\[(HQ|MT):\s*[^\]]+\]\s*").unwrap();
}

/// Reason recorded on entries of a locale the service does not support.
pub const INVALID_LANGUAGE_REASON: &str = "invalid destination language";

const RATE_LIMIT_INDICATORS: &[&str] = &["rate", "limit", "quota", "429", "too many", "throttle"];

/// A failed call to the translation service, classified where the failure happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Connection resets, timeouts and similar faults of the client itself.
    #[error("client fault: {0}")]
    ClientFault(String),

    #[error("invalid target language: {0}")]
    InvalidTargetLanguage(String),

    #[error("{0}")]
    Other(String),
}

impl ServiceError {
    /// Classifies a free-text error message.
    ///
    /// For errors whose status code alone does not decide the kind; the gateway itself
    /// never inspects messages.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains(INVALID_LANGUAGE_REASON) {
            ServiceError::InvalidTargetLanguage(message)
        } else if RATE_LIMIT_INDICATORS.iter().any(|i| lower.contains(i)) {
            ServiceError::RateLimited(message)
        } else {
            ServiceError::Other(message)
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::RateLimited(_) | ServiceError::ClientFault(_)
        )
    }
}

/// The external translation capability.
pub trait TranslationService {
    fn translate(
        &mut self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ServiceError>;
}

impl<F> TranslationService for F
where
    F: FnMut(&str, &str, &str) -> Result<String, ServiceError>,
{
    fn translate(
        &mut self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ServiceError> {
        self(text, source_language, target_language)
    }
}

/// Blocks the current thread for a while.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of calls per text, first attempt included.
    pub max_attempts: u32,
    /// Waits grow linearly: 2, 4, 6 … units.
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Wait after the failed attempt with zero-based index `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * 2 * (attempt + 1)
    }
}

/// Outcome of a successful gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translated {
    Text(String),
    /// The service returned the input unchanged; nothing needed translating.
    Unchanged,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// This entry failed; other entries of the locale may still succeed.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The locale itself is unusable; stop translating it.
    #[error("permanent failure: {0}")]
    Permanent(String),
}

impl Failure {
    pub fn reason(&self) -> &str {
        match self {
            Failure::Transient(reason) | Failure::Permanent(reason) => reason,
        }
    }
}

/// Removes a leading `[HQ: xx-XX]` / `[MT: xx-XX]` marker left by older tooling.
pub fn strip_provenance_prefix(text: &str) -> &str {
    match PROVENANCE_PREFIX_REGEX.find(text) {
        Some(found) => &text[found.end()..],
        None => text,
    }
}

/// Wraps a [`TranslationService`] with retry and failure classification.
#[derive(Debug)]
pub struct Gateway<S> {
    service: S,
    source_language: String,
    policy: RetryPolicy,
}

impl<S: TranslationService> Gateway<S> {
    pub fn new(service: S, source_language: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            service,
            source_language: source_language.into(),
            policy,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Translates `text` into `target_language`.
    ///
    /// Rate limits and client faults are retried up to the policy's attempt ceiling,
    /// sleeping between attempts. An unsupported target language is reported as
    /// [`Failure::Permanent`] at once; any other error as [`Failure::Transient`] without
    /// a retry.
    pub fn translate(
        &mut self,
        text: &str,
        target_language: &str,
        sleeper: &mut dyn Sleeper,
    ) -> Result<Translated, Failure> {
        let cleaned = strip_provenance_prefix(text);
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let error = match self
                .service
                .translate(cleaned, &self.source_language, target_language)
            {
                Ok(translated) if translated == cleaned => return Ok(Translated::Unchanged),
                Ok(translated) => return Ok(Translated::Text(translated)),
                Err(error) => error,
            };

            if let ServiceError::InvalidTargetLanguage(message) = &error {
                tracing::warn!(target_language, "{}", message);
                return Err(Failure::Permanent(INVALID_LANGUAGE_REASON.to_string()));
            }
            if !error.is_retryable() {
                tracing::warn!(target_language, "translation failed: {}", error);
                return Err(Failure::Transient(error.to_string()));
            }

            attempt += 1;
            if attempt >= max_attempts {
                tracing::warn!(
                    target_language,
                    "translation failed after {} attempts: {}",
                    max_attempts,
                    error
                );
                let kind = match error {
                    ServiceError::RateLimited(_) => "rate limited",
                    _ => "client fault",
                };
                return Err(Failure::Transient(format!(
                    "{} after {} attempts",
                    kind, max_attempts
                )));
            }

            let wait = self.policy.backoff(attempt - 1);
            tracing::warn!(
                target_language,
                "{}, waiting {:?} before retry {}/{}",
                error,
                wait,
                attempt + 1,
                max_attempts
            );
            sleeper.sleep(wait);
        }
    }
}
