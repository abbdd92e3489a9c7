use std::path::Path;
use unic_langid::LanguageIdentifier;

/// Validation context for the different commands
#[derive(Debug, Default)]
pub struct ValidationContext {
    pub strings_dir: Option<String>,
    pub language_codes: Vec<String>,
    pub entry_key: Option<String>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strings_dir(mut self, dir: &str) -> Self {
        self.strings_dir = Some(dir.to_string());
        self
    }

    pub fn with_language_code(mut self, lang: &str) -> Self {
        self.language_codes.push(lang.to_string());
        self
    }

    pub fn with_language_codes<'a>(mut self, langs: impl IntoIterator<Item = &'a String>) -> Self {
        self.language_codes.extend(langs.into_iter().cloned());
        self
    }

    pub fn with_entry_key(mut self, key: &str) -> Self {
        self.entry_key = Some(key.to_string());
        self
    }
}

/// Validate the strings directory exists and is a directory
pub fn validate_strings_dir(path: &str) -> Result<(), String> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        return Err(format!("Directory does not exist: {}", path));
    }

    if !path_obj.is_dir() {
        return Err(format!("Path is not a directory: {}", path));
    }

    Ok(())
}

/// Validate language code format using unic-langid
pub fn validate_language_code(lang: &str) -> Result<(), String> {
    if lang.is_empty() {
        return Err("Language code cannot be empty".to_string());
    }

    match lang.parse::<LanguageIdentifier>() {
        Ok(lang_id) => {
            let lang_str = lang_id.to_string();
            if lang_str.starts_with('-') || lang_str.ends_with('-') || lang_str == "und" {
                return Err(format!(
                    "Invalid language code format: {}. Expected valid BCP 47 language identifier",
                    lang
                ));
            }
            Ok(())
        }
        Err(_) => Err(format!(
            "Invalid language code format: {}. Expected valid BCP 47 language identifier",
            lang
        )),
    }
}

/// Validate a resource key: non-empty, no surrounding whitespace
pub fn validate_entry_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("Entry key cannot be empty".to_string());
    }
    if key.trim() != key {
        return Err(format!(
            "Entry key '{}' has leading or trailing whitespace",
            key
        ));
    }
    Ok(())
}

/// Validate a complete validation context
pub fn validate_context(context: &ValidationContext) -> Result<(), String> {
    if let Some(ref dir) = context.strings_dir {
        validate_strings_dir(dir)
            .map_err(|e| format!("Strings directory validation failed: {}", e))?;
    }

    for lang in &context.language_codes {
        validate_language_code(lang)
            .map_err(|e| format!("Language code validation failed: {}", e))?;
    }

    if let Some(ref key) = context.entry_key {
        validate_entry_key(key).map_err(|e| format!("Entry key validation failed: {}", e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_language_code() {
        assert!(validate_language_code("en-US").is_ok());
        assert!(validate_language_code("sr-Latn-RS").is_ok());
        assert!(validate_language_code("fil-PH").is_ok());
        assert!(validate_language_code("").is_err());
        assert!(validate_language_code("not a locale").is_err());
    }

    #[test]
    fn test_validate_entry_key() {
        assert!(validate_entry_key("SaveButton.Content").is_ok());
        assert!(validate_entry_key("").is_err());
        assert!(validate_entry_key(" Save").is_err());
    }

    #[test]
    fn test_validate_context() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_str().unwrap();

        let ok = ValidationContext::new()
            .with_strings_dir(dir)
            .with_language_code("fr-FR")
            .with_entry_key("Greeting");
        assert!(validate_context(&ok).is_ok());

        let missing = ValidationContext::new().with_strings_dir("/definitely/not/here");
        let err = validate_context(&missing).unwrap_err();
        assert!(err.contains("Directory does not exist"));

        let bad_lang = ValidationContext::new().with_language_code("12345678910");
        assert!(validate_context(&bad_lang).is_err());
    }
}
