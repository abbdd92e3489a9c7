//! Static lookup tables: locale → translation service language code, and the keys that
//! are never translated.

use std::collections::{BTreeMap, BTreeSet};

use unic_langid::LanguageIdentifier;

/// How a locale is addressed on the translation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceLanguage {
    Code(String),
    /// The service has no equivalent for this locale.
    Unsupported,
}

/// Locale identifier → service language code.
///
/// Locales missing from the table fall back to their primary language subtag
/// (`pl-PL` → `pl`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageMap {
    codes: BTreeMap<String, ServiceLanguage>,
}

const DEFAULT_CODES: &[(&str, &str)] = &[
    ("af-ZA", "af"),
    ("am-ET", "am"),
    ("az-AZ", "az"),
    ("bs-BA", "bs"),
    ("ca-ES", "ca"),
    ("ceb-PH", "ceb"),
    ("cs-CZ", "cs"),
    ("cy-GB", "cy"),
    ("da-DK", "da"),
    ("de-DE", "de"),
    ("es-ES", "es"),
    ("fi-FI", "fi"),
    ("fil-PH", "tl"),
    ("fr-FR", "fr"),
    ("gl-ES", "gl"),
    ("haw-US", "haw"),
    ("id-ID", "id"),
    ("it-IT", "it"),
    ("ja-JP", "ja"),
    ("jv-Latn-ID", "jw"),
    ("ky-KG", "ky"),
    ("lb-LU", "lb"),
    ("lo-LA", "lo"),
    ("mg-MG", "mg"),
    ("mi-NZ", "mi"),
    ("mk-MK", "mk"),
    ("ml-IN", "ml"),
    ("mn-MN", "mn"),
    ("mr-IN", "mr"),
    ("ms-MY", "ms"),
    ("mt-MT", "mt"),
    ("my-MM", "my"),
    ("ne-NP", "ne"),
    ("nl-NL", "nl"),
    ("no-NO", "no"),
    ("nr-Latn-ZA", "nr"),
    ("nso-Latn-ZA", "nso"),
    ("or-IN", "or"),
    ("pl-PL", "pl"),
    ("pt-BR", "pt"),
    ("pt-PT", "pt"),
    ("ro-RO", "ro"),
    ("ru-RU", "ru"),
    ("rw-RW", "rw"),
    ("si-LK", "si"),
    ("sk-SK", "sk"),
    ("sl-SI", "sl"),
    ("sm-WS", "sm"),
    ("sn-Latn-ZW", "sn"),
    ("so-SO", "so"),
    ("sq-AL", "sq"),
    ("sr-Latn-RS", "sr"),
    ("ss-Latn-ZA", "ss"),
    ("st-Latn-ZA", "st"),
    ("su-Latn-ID", "su"),
    ("sv-SE", "sv"),
    ("sw-KE", "sw"),
    ("ta-IN", "ta"),
    ("te-IN", "te"),
    ("tg-TJ", "tg"),
    ("th-TH", "th"),
    ("tk-TM", "tk"),
    ("tn-Latn-ZA", "tn"),
    ("to-TO", "to"),
    ("tr-TR", "tr"),
    ("ts-Latn-ZA", "ts"),
    ("ty-Latn-PF", "ty"),
    ("ug-CN", "ug"),
    ("uk-UA", "uk"),
    ("ur-PK", "ur"),
    ("uz-UZ", "uz"),
    ("ve-Latn-ZA", "ve"),
    ("vi-VN", "vi"),
    ("xh-ZA", "xh"),
    ("yo-NG", "yo"),
    ("zh-CN", "zh-cn"),
    ("zh-TW", "zh-tw"),
    ("zu-ZA", "zu"),
];

const DEFAULT_UNSUPPORTED: &[&str] = &["fj-FJ"];

impl Default for LanguageMap {
    fn default() -> Self {
        let mut map = Self::empty();
        for (locale, code) in DEFAULT_CODES {
            map = map.with_code(*locale, *code);
        }
        for locale in DEFAULT_UNSUPPORTED {
            map = map.with_unsupported(*locale);
        }
        map
    }
}

impl LanguageMap {
    /// A table with no explicit mappings; every locale uses the subtag fallback.
    pub fn empty() -> Self {
        Self {
            codes: BTreeMap::new(),
        }
    }

    pub fn with_code(mut self, locale: impl Into<String>, code: impl Into<String>) -> Self {
        self.codes
            .insert(locale.into(), ServiceLanguage::Code(code.into()));
        self
    }

    pub fn with_unsupported(mut self, locale: impl Into<String>) -> Self {
        self.codes.insert(locale.into(), ServiceLanguage::Unsupported);
        self
    }

    pub fn resolve(&self, locale: &str) -> ServiceLanguage {
        if let Some(language) = self.codes.get(locale) {
            return language.clone();
        }
        ServiceLanguage::Code(primary_subtag(locale))
    }
}

fn primary_subtag(locale: &str) -> String {
    match locale.parse::<LanguageIdentifier>() {
        Ok(id) => id.language.as_str().to_string(),
        Err(_) => locale
            .split(['-', '_'])
            .next()
            .unwrap_or(locale)
            .to_ascii_lowercase(),
    }
}

/// Keys that are never translated (product names, unit abbreviations).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechnicalKeys(BTreeSet<String>);

const DEFAULT_TECHNICAL_KEYS: &[&str] = &[
    "AppName",
    "KBComboBoxItem.Content",
    "MBComboBoxItem.Content",
    "GBComboBoxItem.Content",
    "URLPresetButton.Content",
];

impl Default for TechnicalKeys {
    fn default() -> Self {
        Self::new(DEFAULT_TECHNICAL_KEYS.iter().copied())
    }
}

impl TechnicalKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
