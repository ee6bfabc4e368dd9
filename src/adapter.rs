//! Engine client adapter
//!
//! Owns the connection to the LanguageTool server together with the
//! availability state reported by the diagnostic endpoints.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::cache::clear_engine_cache;
use crate::config::Config;
use crate::engine::{EngineMatch, LanguageToolClient, ProbeOutcome};
use crate::error::Result;

pub const JAVA_SERVER_HINT: &str = "Make sure Java server is running: java -cp languagetool-server.jar \
     org.languagetool.server.HTTPServer --port 8011 --public";

/// Availability of the LanguageTool server as seen by this process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceState {
    pub available: bool,
    pub last_error: Option<String>,
    pub server_url: String,
}

/// Result of a check call through the adapter
#[derive(Debug)]
pub enum CheckOutcome {
    /// No engine; the caller answers with the degraded-mode match
    Unavailable,
    Checked(Vec<EngineMatch>),
}

/// Result of [`EngineAdapter::reinitialize`]
#[derive(Debug, Clone)]
pub struct Reinitialized {
    pub state: ServiceState,
    pub cache_cleared: bool,
}

struct Inner {
    state: ServiceState,
    client: Option<LanguageToolClient>,
}

pub struct EngineAdapter {
    timeout: Duration,
    probe_timeout: Duration,
    cache_dir: Option<PathBuf>,
    inner: RwLock<Inner>,
    reinit_lock: Mutex<()>,
}

impl EngineAdapter {
    /// Create an adapter that has not contacted the engine yet
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: Duration::from_secs(config.engine.timeout_secs),
            probe_timeout: Duration::from_secs(config.engine.probe_timeout_secs),
            cache_dir: config.cache_dir(),
            inner: RwLock::new(Inner {
                state: ServiceState {
                    available: false,
                    last_error: None,
                    server_url: config.engine.url.trim().to_string(),
                },
                client: None,
            }),
            reinit_lock: Mutex::new(()),
        }
    }

    /// Create an adapter and run the startup handshake
    pub async fn connect(config: &Config) -> Self {
        let adapter = Self::new(config);
        adapter.initialize().await;
        adapter
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> ServiceState {
        self.inner.read().await.state.clone()
    }

    pub async fn server_url(&self) -> String {
        self.inner.read().await.state.server_url.clone()
    }

    /// Connect to the configured server. Failures are recorded in the state
    /// and never returned; the result tells whether the engine is usable.
    pub async fn initialize(&self) -> bool {
        let _guard = self.reinit_lock.lock().await;
        self.initialize_locked().await
    }

    async fn initialize_locked(&self) -> bool {
        let server_url = self.server_url().await;
        tracing::info!("Initializing LanguageTool with remote server: {}", server_url);

        let result = self.handshake(&server_url).await;
        let mut inner = self.inner.write().await;
        match result {
            Ok(client) => {
                inner.state.available = true;
                inner.state.last_error = None;
                inner.client = Some(client);
                tracing::info!("LanguageTool remote server initialized successfully");
                true
            }
            Err(e) => {
                inner.state.available = false;
                inner.state.last_error = Some(e.to_string());
                inner.client = None;
                tracing::warn!("Failed to connect to remote server: {}", e);
                tracing::warn!("  Server URL: {}", server_url);
                tracing::warn!("  {}", JAVA_SERVER_HINT);
                false
            }
        }
    }

    async fn handshake(&self, server_url: &str) -> Result<LanguageToolClient> {
        let client = LanguageToolClient::new(server_url, self.timeout)?;
        let languages = client.languages().await?;
        tracing::debug!("LanguageTool server supports {} languages", languages.len());
        Ok(client)
    }

    /// Check `text` against the engine, if there is one
    pub async fn check_text(&self, text: &str, language: &str) -> Result<CheckOutcome> {
        // Clone out of the lock so slow checks never hold it
        let client = self.inner.read().await.client.clone();
        match client {
            Some(client) => Ok(CheckOutcome::Checked(client.check(text, language).await?)),
            None => Ok(CheckOutcome::Unavailable),
        }
    }

    /// Best-effort removal of cached engine artifacts
    pub async fn clear_cache(&self) -> bool {
        let Some(cache_dir) = self.cache_dir.clone() else {
            tracing::debug!("No cache directory configured");
            return false;
        };

        match tokio::task::spawn_blocking(move || clear_engine_cache(&cache_dir)).await {
            Ok(cleared) => cleared,
            Err(e) => {
                tracing::warn!("Error clearing cache: {}", e);
                false
            }
        }
    }

    /// Clear the cache, reset to unavailable and initialize again.
    /// Concurrent calls run one after another.
    pub async fn reinitialize(&self) -> Reinitialized {
        let _guard = self.reinit_lock.lock().await;
        tracing::info!("Manual reinitialization requested...");

        let cache_cleared = self.clear_cache().await;

        {
            let mut inner = self.inner.write().await;
            inner.client = None;
            inner.state.available = false;
            inner.state.last_error = None;
        }

        self.initialize_locked().await;

        Reinitialized {
            state: self.state().await,
            cache_cleared,
        }
    }

    /// Probe the configured server. `None` means no server is configured;
    /// a malformed URL is reported as a failed probe.
    pub async fn probe(&self) -> Option<ProbeOutcome> {
        let server_url = self.server_url().await;
        if server_url.is_empty() {
            tracing::debug!("Skipping probe: no server configured");
            return None;
        }

        match LanguageToolClient::new(&server_url, self.probe_timeout) {
            Ok(client) => Some(client.probe(self.probe_timeout).await),
            Err(e) => Some(ProbeOutcome::Failed(e.to_string())),
        }
    }
}
