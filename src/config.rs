//! Server configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Runtime configuration for the trivia server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Directory holding `<question set>.json` files.
    #[serde(default = "default_question_dir")]
    question_dir: PathBuf,

    /// Answer window after a countdown starts, in milliseconds.
    #[serde(default = "default_answer_window_ms")]
    answer_window_ms: u64,

    /// Host to bind the HTTP transport to.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind the HTTP transport to.
    #[serde(default = "default_port")]
    port: u16,

    /// Tracing filter, used when `RUST_LOG` is unset.
    #[serde(default)]
    log_filter: Option<String>,
}

fn default_question_dir() -> PathBuf {
    PathBuf::from("questions")
}

// 5 s client countdown plus 500 ms grace.
fn default_answer_window_ms() -> u64 {
    5_500
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            question_dir: default_question_dir(),
            answer_window_ms: default_answer_window_ms(),
            host: default_host(),
            port: default_port(),
            log_filter: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on invalid TOML or field types.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        info!(question_dir = %config.question_dir.display(), "Config loaded");
        Ok(config)
    }

    /// Loads `path` if it exists, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but is invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Answer window as a [`Duration`].
    pub fn answer_window(&self) -> Duration {
        Duration::from_millis(self.answer_window_ms)
    }

    /// Overrides the question directory.
    pub fn with_question_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.question_dir = dir.into();
        self
    }

    /// Overrides the bind address.
    pub fn with_bind(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
