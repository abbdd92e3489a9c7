//! All error types for the langsync crate.
//!
//! These are returned from fallible store, configuration and transport operations.
//! Translation failures of individual entries are not errors: they are recorded as
//! entry statuses (see [`crate::types::EntryStatus`]).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid data: {0}")]
    DataMismatch(String),

    #[error("invalid resource: {0}")]
    InvalidResource(String),

    #[error("unknown status marker `{0}`")]
    UnknownStatus(String),

    #[error("locale `{0}` not found")]
    LocaleNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a new configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = Error::Io(io_error);
        assert!(error.to_string().contains("I/O error"));
    }

    #[test]
    fn test_unknown_status_error() {
        let error = Error::UnknownStatus("status:maybe".to_string());
        assert_eq!(error.to_string(), "unknown status marker `status:maybe`");
    }

    #[test]
    fn test_locale_not_found_error() {
        let error = Error::LocaleNotFound("xx-XX".to_string());
        assert_eq!(error.to_string(), "locale `xx-XX` not found");
    }

    #[test]
    fn test_config_error() {
        let error = Error::config_error("batch_size must be at least 1");
        assert_eq!(
            error.to_string(),
            "configuration error: batch_size must be at least 1"
        );
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            Error::DataMismatch("test".to_string()),
            Error::InvalidResource("test".to_string()),
            Error::UnknownStatus("test".to_string()),
            Error::LocaleNotFound("test".to_string()),
            Error::Config("test".to_string()),
        ];

        for error in errors {
            let display = format!("{}", error);
            assert!(!display.is_empty());
            assert!(display.contains("test"));
        }
    }
}
