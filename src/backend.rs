//! Client for the summary and suggestion functions
//!
//! Endpoints (relative to the configured base URL):
//! - POST /opsummering `{text}` → `{summary}`
//! - POST /forslag `{text, profile}` → `{suggestion}`
//!
//! One request per call: no retry, and no timeout unless configured.

use crate::error::{Error, Result};
use crate::settings::Settings;
use crate::utils::safe_truncate;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Shown when the backend answers without a suggestion
pub const SUGGESTION_PLACEHOLDER: &str = "Intet forslag modtaget";

#[derive(Debug, Serialize)]
struct SummaryRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SuggestionRequest<'a> {
    text: &'a str,
    profile: &'a str,
}

pub struct BackendClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("laeringsassistent/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.backend_url()?,
            settings.api_key(),
            settings.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Summarize curriculum text. A response without `summary` gives an empty string.
    pub async fn summarize(&self, text: &str) -> Result<String> {
        log::debug!("Summarizing {} bytes: {}", text.len(), safe_truncate(text, 120));
        let json = self.post("opsummering", &SummaryRequest { text }).await?;
        Ok(string_field(&json, "summary").unwrap_or_default())
    }

    /// Ask for an activity suggestion. Missing or empty answers give the placeholder.
    pub async fn suggest(&self, text: &str, profile: &str) -> Result<String> {
        let json = self
            .post("forslag", &SuggestionRequest { text, profile })
            .await?;
        Ok(string_field(&json, "suggestion")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| SUGGESTION_PLACEHOLDER.to_string()))
    }

    async fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<serde_json::Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        log::debug!("POST {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!("{} returned {}: {}", endpoint, status, body)));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Backend(format!("{} returned invalid JSON: {}", endpoint, e)))
    }
}

fn string_field(json: &serde_json::Value, name: &str) -> Option<String> {
    json.get(name).and_then(|v| v.as_str()).map(String::from)
}
