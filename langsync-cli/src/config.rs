//! `langsync.toml` loading.
//!
//! Every field is optional; command-line flags override whatever the file sets.
//!
//! ```toml
//! strings_dir = "Strings"
//! reference_locale = "en-US"
//! technical_keys = ["AppName", "URLPresetButton.Content"]
//!
//! [service]
//! endpoint = "http://localhost:5000/translate"
//! timeout_secs = 30
//!
//! [sync]
//! batch_size = 5
//! max_attempts = 10
//!
//! [languages]
//! unsupported = ["fj-FJ"]
//! codes = { "fil-PH" = "tl" }
//! ```

use std::{collections::BTreeMap, path::Path, time::Duration};

use langsync::{LanguageMap, ReconcileOptions, TechnicalKeys};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "langsync.toml";
pub const DEFAULT_STRINGS_DIR: &str = "Strings";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub strings_dir: Option<String>,
    pub file_name: Option<String>,
    pub reference_locale: Option<String>,
    pub source_language: Option<String>,
    pub technical_keys: Option<Vec<String>>,
    pub service: Option<ServiceCfg>,
    pub sync: Option<SyncCfg>,
    pub languages: Option<LanguagesCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceCfg {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncCfg {
    pub batch_size: Option<usize>,
    pub max_attempts: Option<u32>,
    pub backoff_unit_ms: Option<u64>,
    pub failure_threshold: Option<usize>,
    pub failure_cooldown_ms: Option<u64>,
    pub item_delay_ms: Option<u64>,
    pub inter_locale_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguagesCfg {
    /// Locale → service language code, added to or replacing the built-in table.
    pub codes: Option<BTreeMap<String, String>>,
    /// Locales the service cannot translate into.
    pub unsupported: Option<Vec<String>>,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| format!("Invalid configuration: {}", e))
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read config '{}': {}", path.display(), e))?;
        Self::from_toml(&text).map_err(|e| format!("{} ({})", e, path.display()))
    }

    /// Loads `explicit` if given; otherwise `langsync.toml` in the working directory when
    /// it exists, or the defaults.
    pub fn discover(explicit: Option<&str>) -> Result<Self, String> {
        match explicit {
            Some(path) => Self::load(Path::new(path)),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    tracing::debug!("using {}", DEFAULT_CONFIG_FILE);
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn strings_dir(&self) -> &str {
        self.strings_dir.as_deref().unwrap_or(DEFAULT_STRINGS_DIR)
    }

    pub fn file_name(&self) -> &str {
        self.file_name
            .as_deref()
            .unwrap_or(langsync::store::DEFAULT_FILE_NAME)
    }

    pub fn reference_locale(&self) -> &str {
        self.reference_locale
            .as_deref()
            .unwrap_or(langsync::reconcile::DEFAULT_REFERENCE_LOCALE)
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.service.as_ref()?.endpoint.as_deref()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.service.as_ref()?.api_key.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.service
            .as_ref()
            .and_then(|s| s.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(langsync::service::DEFAULT_TIMEOUT)
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        let mut options =
            ReconcileOptions::default().with_reference_locale(self.reference_locale());
        if let Some(source_language) = &self.source_language {
            options = options.with_source_language(source_language.clone());
        }
        if let Some(keys) = &self.technical_keys {
            options = options.with_technical_keys(TechnicalKeys::new(keys.iter().cloned()));
        }

        if let Some(languages) = &self.languages {
            let mut map = LanguageMap::default();
            for (locale, code) in languages.codes.iter().flatten() {
                map = map.with_code(locale.clone(), code.clone());
            }
            for locale in languages.unsupported.iter().flatten() {
                map = map.with_unsupported(locale.clone());
            }
            options = options.with_language_map(map);
        }

        if let Some(sync) = &self.sync {
            if let Some(batch_size) = sync.batch_size {
                options = options.with_batch_size(batch_size);
            }
            let mut retry = options.retry;
            if let Some(max_attempts) = sync.max_attempts {
                retry.max_attempts = max_attempts;
            }
            if let Some(unit) = sync.backoff_unit_ms {
                retry.backoff_unit = Duration::from_millis(unit);
            }
            let threshold = sync.failure_threshold.unwrap_or(options.failure_threshold);
            let cooldown = sync
                .failure_cooldown_ms
                .map(Duration::from_millis)
                .unwrap_or(options.failure_cooldown);
            options = options
                .with_retry(retry)
                .with_failure_throttle(threshold, cooldown);
            if let Some(delay) = sync.item_delay_ms {
                options = options.with_item_delay(Duration::from_millis(delay));
            }
            if let Some(delay) = sync.inter_locale_delay_ms {
                options = options.with_inter_locale_delay(Duration::from_millis(delay));
            }
        }

        options
    }
}
