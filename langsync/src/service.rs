//! A [`TranslationService`] backed by a LibreTranslate-compatible HTTP endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    gateway::{ServiceError, TranslationService},
};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/translate";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct LibreTranslate {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct Request<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct Response {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl LibreTranslate {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: None,
            client,
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TranslationService for LibreTranslate {
    fn translate(
        &mut self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&Request {
                q: text,
                source: source_language,
                target: target_language,
                format: "text",
                api_key: self.api_key.as_deref(),
            })
            .send()
            .map_err(|e| ServiceError::ClientFault(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body: Response = response
                .json()
                .map_err(|e| ServiceError::Other(format!("malformed response: {}", e)))?;
            return body.translated_text.ok_or_else(|| {
                ServiceError::Other("translation service returned no text".to_string())
            });
        }

        let message = response
            .json::<ErrorBody>()
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| status.to_string());
        Err(classify_http_error(status.as_u16(), message))
    }
}

fn classify_http_error(status: u16, message: String) -> ServiceError {
    match status {
        429 => ServiceError::RateLimited(message),
        400 if is_language_rejection(&message) => ServiceError::InvalidTargetLanguage(message),
        _ => ServiceError::from_message(message),
    }
}

fn is_language_rejection(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("not supported")
        || (lower.contains("invalid")
            && (lower.contains("language")
                || lower.contains("target")
                || lower.contains("destination")))
}
