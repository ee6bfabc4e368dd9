//! Configuration management for the LanguageTool proxy
//!
//! Handles loading of `langtool-proxy.toml` and environment overrides.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable selecting the LanguageTool server URL
pub const ENV_SERVER: &str = "LANGTOOL_SERVER";
pub const ENV_BIND: &str = "LANGTOOL_PROXY_BIND";
pub const ENV_PORT: &str = "LANGTOOL_PROXY_PORT";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// LanguageTool server settings
    #[serde(default)]
    pub engine: EngineConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by the CORS layer
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// LanguageTool server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the LanguageTool Java server. Empty means unconfigured.
    #[serde(default = "default_engine_url")]
    pub url: String,

    /// Transport timeout applied to check calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout for `/test-connection` probes
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Local resource cache of the engine (cleared by `/reinit`)
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_engine_url(),
            timeout_secs: default_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            cache_dir: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8010
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:3001".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:3001".to_string(),
    ]
}

fn default_engine_url() -> String {
    "http://localhost:8011".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_probe_timeout_secs() -> u64 {
    5
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "langtool-proxy")
            .map(|dirs| dirs.config_dir().join("langtool-proxy.toml"))
    }

    /// Load configuration from the working directory or the user config
    /// directory, then apply environment overrides
    pub fn load_from_default() -> Self {
        let mut config = Self::load_file_from_default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn load_file_from_default() -> Self {
        let workspace_path = PathBuf::from("langtool-proxy.toml");
        if workspace_path.exists() {
            match Self::load(&workspace_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring {}: {}", workspace_path.display(), e),
            }
        }

        if let Some(default_path) = Self::default_path() {
            if let Ok(config) = Self::load(&default_path) {
                return config;
            }
        }

        Config::default()
    }

    /// Apply overrides from a variable lookup (normally `std::env::var`)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SERVER) {
            self.engine.url = url;
        }

        if let Some(bind) = lookup(ENV_BIND) {
            if !bind.is_empty() {
                self.server.bind = bind;
            }
        }

        if let Some(port) = lookup(ENV_PORT) {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid {}={:?}", ENV_PORT, port),
            }
        }
    }

    /// Engine resource cache, defaulting to the user cache directory
    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.engine.cache_dir.clone().or_else(|| {
            directories::BaseDirs::new().map(|dirs| dirs.cache_dir().join("language_tool_python"))
        })
    }

    /// Socket address string for the HTTP listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}
