//! HTTP client for a self-hosted LanguageTool server
//!
//! Speaks the `/v2/languages` and `/v2/check` endpoints of the Java server.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{ProxyError, Result};

/// Client bound to one LanguageTool server
#[derive(Debug, Clone)]
pub struct LanguageToolClient {
    client: Client,
    base_url: String,
}

/// Language advertised by `/v2/languages`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineLanguage {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub long_code: Option<String>,
}

#[derive(Serialize)]
struct CheckForm<'a> {
    text: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<EngineMatch>,
}

/// One match as returned by the engine
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineMatch {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub short_message: Option<String>,
    #[serde(default)]
    pub replacements: Vec<EngineReplacement>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub context: Option<EngineContext>,
    #[serde(default)]
    pub rule: Option<EngineRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineReplacement {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineContext {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub length: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineRule {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Outcome of a reachability probe, kept apart so callers can report
/// refusals and timeouts differently from bad statuses
#[derive(Debug)]
pub enum ProbeOutcome {
    Ok,
    Status(StatusCode),
    Refused,
    Timeout,
    Failed(String),
}

/// Normalise a configured server URL, rejecting empty or malformed values
pub fn normalize_server_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ProxyError::Config(
            "LANGTOOL_SERVER is not configured. Please set the Java server URL.".to_string(),
        ));
    }

    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| ProxyError::Config(format!("Invalid LANGTOOL_SERVER '{}': {}", trimmed, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProxyError::Config(format!(
            "Invalid LANGTOOL_SERVER '{}': unsupported scheme '{}'",
            trimmed,
            url.scheme()
        )));
    }

    Ok(trimmed.to_string())
}

impl LanguageToolClient {
    /// Create a client for `base_url` with a transport-level timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = normalize_server_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Fetch the supported languages; doubles as the handshake at startup
    pub async fn languages(&self) -> Result<Vec<EngineLanguage>> {
        let response = self
            .client
            .get(format!("{}/v2/languages", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ProxyError::Protocol(format!(
                "LanguageTool server returned status code {}",
                status.as_u16()
            )));
        }

        response.json::<Vec<EngineLanguage>>().await.map_err(|e| {
            ProxyError::Protocol(format!("Unexpected /v2/languages response: {}", e))
        })
    }

    /// Check `text` in `language`. Every failure is reported as
    /// [`ProxyError::CheckFailed`]; nothing is retried.
    pub async fn check(&self, text: &str, language: &str) -> Result<Vec<EngineMatch>> {
        let response = self
            .client
            .post(format!("{}/v2/check", self.base_url))
            .form(&CheckForm { text, language })
            .send()
            .await
            .map_err(|e| ProxyError::CheckFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProxyError::CheckFailed(format!(
                "LanguageTool server error: {} - {}",
                status,
                body.trim()
            )));
        }

        let parsed: CheckResponse = response
            .json()
            .await
            .map_err(|e| ProxyError::CheckFailed(format!("Invalid check response: {}", e)))?;

        Ok(parsed.matches)
    }

    /// Probe `/v2/languages` with its own timeout
    pub async fn probe(&self, timeout: Duration) -> ProbeOutcome {
        let result = self
            .client
            .get(format!("{}/v2/languages", self.base_url))
            .timeout(timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::OK => ProbeOutcome::Ok,
            Ok(response) => ProbeOutcome::Status(response.status()),
            Err(e) if e.is_timeout() => ProbeOutcome::Timeout,
            Err(e) if e.is_connect() => ProbeOutcome::Refused,
            Err(e) => ProbeOutcome::Failed(e.to_string()),
        }
    }
}
