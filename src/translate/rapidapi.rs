use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{DubError, Result};
use super::TranslationClient;

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

/// Client for the RapidAPI Google Translator v2 endpoint
pub struct RapidApiTranslator {
    client: Client,
    endpoint: String,
    host: String,
    api_key: String,
}

impl RapidApiTranslator {
    pub fn new(config: &TranslateConfig, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            host: config.host.clone(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl TranslationClient for RapidApiTranslator {
    async fn translate(&self, text: &str, target_code: &str) -> Result<Option<String>> {
        let request = TranslateRequest {
            q: text,
            source: "auto",
            target: target_code,
            format: "text",
        };

        debug!("Sending translation request to: {}", self.endpoint);

        let response = self.client
            .post(&self.endpoint)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .json(&request)
            .send()
            .await
            .map_err(|e| DubError::Translation(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let body: Value = response.json().await
            .map_err(|e| DubError::Translation(format!("Failed to parse response: {}", e)))?;
        Ok(extract_translation(&body))
    }
}

fn status_error(status: StatusCode) -> DubError {
    let message = match status {
        StatusCode::UNAUTHORIZED => "Invalid API key for the translation service".to_string(),
        StatusCode::FORBIDDEN => "Access to the translation service is forbidden; check the subscription".to_string(),
        StatusCode::TOO_MANY_REQUESTS => "Translation rate limit exceeded".to_string(),
        other => format!("Translation service returned HTTP {}", other),
    };
    DubError::Translation(message)
}

/// `data.translations[0].translatedText`, when present and non-empty
fn extract_translation(body: &Value) -> Option<String> {
    body.pointer("/data/translations/0/translatedText")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
