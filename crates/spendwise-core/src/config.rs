//! Configuration for SpendWise
//!
//! Config is resolved in two layers:
//! 1. Optional file at `<data_dir>/spendwise/config.toml`
//!    (`~/.local/share/spendwise/config.toml` on Linux)
//! 2. Environment variable overrides
//!
//! ```toml
//! db = "/home/me/spendwise.db"
//!
//! [oracle]
//! backend = "gemini"            # gemini | openai_compatible | ollama | mock | none
//! model = "gemini-3-flash-preview"
//! timeout_secs = 10
//!
//! [dashboard]
//! daily_window_days = 7
//! ```
//!
//! Environment variables:
//! - `SPENDWISE_DB`: Database path
//! - `AI_BACKEND`: Oracle backend
//! - `GEMINI_API_KEY` (or `API_KEY`), `GEMINI_MODEL`, `GEMINI_HOST`
//! - `OPENAI_COMPATIBLE_HOST`, `OPENAI_COMPATIBLE_MODEL`, `OPENAI_COMPATIBLE_API_KEY`
//! - `OLLAMA_HOST`, `OLLAMA_MODEL`
//! - `ORACLE_TIMEOUT_SECS`: Request timeout for the oracle call

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

pub const DEFAULT_GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DAILY_WINDOW: u32 = 7;

/// Which category oracle to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleBackendKind {
    #[default]
    Gemini,
    OpenaiCompatible,
    Ollama,
    Mock,
    /// Never consult an oracle
    None,
}

impl std::str::FromStr for OracleBackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                Ok(Self::OpenaiCompatible)
            }
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            "none" | "off" | "disabled" => Ok(Self::None),
            _ => Err(format!("Unknown oracle backend: {}", s)),
        }
    }
}

/// Settings for the external category oracle
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub backend: OracleBackendKind,
    /// Server URL (required for openai_compatible and ollama)
    pub host: Option<String>,
    pub model: Option<String>,
    /// Credential (required for gemini, optional for openai_compatible)
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Number of trailing days in the daily trend series
    pub daily_window_days: Option<u32>,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database path override
    pub db: Option<PathBuf>,
    pub oracle: OracleConfig,
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Load the config file (if any) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let raw = fs::read_to_string(&path)?;
                Self::from_toml_str(&raw)?
            }
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Location of the optional config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("spendwise").join("config.toml"))
    }

    /// Parse a TOML config document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config.toml: {}", e)))
    }

    /// Apply overrides from a key lookup (normally the process environment)
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(db) = get("SPENDWISE_DB") {
            self.db = Some(PathBuf::from(db));
        }

        if let Some(backend) = get("AI_BACKEND") {
            match backend.parse() {
                Ok(kind) => self.oracle.backend = kind,
                Err(e) => warn!(backend = %backend, "{}, keeping configured backend", e),
            }
        }

        if let Some(secs) = get("ORACLE_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => self.oracle.timeout_secs = Some(secs),
                Err(_) => warn!(value = %secs, "Ignoring invalid ORACLE_TIMEOUT_SECS"),
            }
        }

        let (host_var, model_var, key_vars): (&str, &str, &[&str]) = match self.oracle.backend {
            OracleBackendKind::Gemini => ("GEMINI_HOST", "GEMINI_MODEL", &["GEMINI_API_KEY", "API_KEY"]),
            OracleBackendKind::OpenaiCompatible => (
                "OPENAI_COMPATIBLE_HOST",
                "OPENAI_COMPATIBLE_MODEL",
                &["OPENAI_COMPATIBLE_API_KEY"],
            ),
            OracleBackendKind::Ollama => ("OLLAMA_HOST", "OLLAMA_MODEL", &[]),
            OracleBackendKind::Mock | OracleBackendKind::None => return,
        };

        if let Some(host) = get(host_var) {
            self.oracle.host = Some(host);
        }
        if let Some(model) = get(model_var) {
            self.oracle.model = Some(model);
        }
        if let Some(key) = key_vars.iter().find_map(|k| get(k)) {
            self.oracle.api_key = Some(key);
        }
    }

    pub fn daily_window_days(&self) -> u32 {
        self.dashboard
            .daily_window_days
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DAILY_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.oracle.backend, OracleBackendKind::Gemini);
        assert!(config.oracle.api_key.is_none());
        assert_eq!(config.oracle.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.daily_window_days(), 7);
    }

    #[test]
    fn test_parse_toml() {
        let config = Config::from_toml_str(
            r#"
            db = "/tmp/sw.db"

            [oracle]
            backend = "ollama"
            host = "http://localhost:11434"
            timeout_secs = 3

            [dashboard]
            daily_window_days = 14
            "#,
        )
        .unwrap();
        assert_eq!(config.db, Some(PathBuf::from("/tmp/sw.db")));
        assert_eq!(config.oracle.backend, OracleBackendKind::Ollama);
        assert_eq!(config.oracle.timeout(), Duration::from_secs(3));
        assert_eq!(config.daily_window_days(), 14);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml_str("oracle = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_gemini_key_from_env() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[("API_KEY", "secret")]));
        assert_eq!(config.oracle.api_key.as_deref(), Some("secret"));

        let mut config = Config::default();
        config.apply_overrides(lookup(&[("API_KEY", "old"), ("GEMINI_API_KEY", "new")]));
        assert_eq!(config.oracle.api_key.as_deref(), Some("new"));
    }

    #[test]
    fn test_backend_override() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("AI_BACKEND", "openai"),
            ("OPENAI_COMPATIBLE_HOST", "http://localhost:8000"),
            ("ORACLE_TIMEOUT_SECS", "2"),
        ]));
        assert_eq!(config.oracle.backend, OracleBackendKind::OpenaiCompatible);
        assert_eq!(config.oracle.host.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.oracle.timeout_secs, Some(2));
    }

    #[test]
    fn test_unknown_backend_keeps_current() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[("AI_BACKEND", "skynet")]));
        assert_eq!(config.oracle.backend, OracleBackendKind::Gemini);
    }

    #[test]
    fn test_zero_window_falls_back() {
        let mut config = Config::default();
        config.dashboard.daily_window_days = Some(0);
        assert_eq!(config.daily_window_days(), 7);
    }
}
