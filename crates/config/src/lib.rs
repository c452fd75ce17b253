//! Configuration loading, validation, and management for OpenCursor.
//!
//! Loads configuration from `~/.opencursor/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.opencursor/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Which backend to talk to ("ollama", "openai", "openrouter", ...)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name passed to the backend
    #[serde(default = "default_model")]
    pub model: String,

    /// Backend host URL
    #[serde(default = "default_host")]
    pub host: String,

    /// API key for hosted backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum model turns per autonomous task
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Workspace root; defaults to the current directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,

    /// Built-in tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "qwen3_14b_q6k:latest".into()
}
fn default_host() -> String {
    "http://localhost:11434".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_iterations() -> u32 {
    25
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("host", &self.host)
            .field("api_key", &redact(&self.api_key))
            .field("temperature", &self.temperature)
            .field("max_iterations", &self.max_iterations)
            .field("workspace", &self.workspace)
            .field("tools", &self.tools)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// First words allowed for `run_terminal_cmd`. Empty = any command.
    #[serde(default)]
    pub allowed_commands: Vec<String>,

    /// Path prefixes file tools may never touch.
    #[serde(default = "default_forbidden_paths")]
    pub forbidden_paths: Vec<String>,

    /// Reject absolute paths outside the workspace root.
    #[serde(default)]
    pub restrict_to_workspace: bool,

    #[serde(default = "default_max_grep_results")]
    pub max_grep_results: usize,

    #[serde(default = "default_max_file_search_results")]
    pub max_file_search_results: usize,

    /// Characters kept per page by `fetch_webpage`.
    #[serde(default = "default_max_fetch_chars")]
    pub max_fetch_chars: usize,
}

fn default_forbidden_paths() -> Vec<String> {
    vec![
        "~/.ssh".into(),
        "~/.gnupg".into(),
        "~/.aws".into(),
        "/etc/shadow".into(),
    ]
}
fn default_max_grep_results() -> usize {
    50
}
fn default_max_file_search_results() -> usize {
    10
}
fn default_max_fetch_chars() -> usize {
    20_000
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            allowed_commands: vec![],
            forbidden_paths: default_forbidden_paths(),
            restrict_to_workspace: false,
            max_grep_results: default_max_grep_results(),
            max_file_search_results: default_max_file_search_results(),
            max_fetch_chars: default_max_fetch_chars(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.opencursor/config.toml).
    ///
    /// Environment variables override the file:
    /// - `OPENCURSOR_PROVIDER`, `OPENCURSOR_MODEL`, `OPENCURSOR_HOST`
    /// - `OPENCURSOR_API_KEY`, then `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("OPENCURSOR_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = lookup("OPENCURSOR_MODEL") {
            self.model = model;
        }
        if let Some(host) = lookup("OPENCURSOR_HOST") {
            self.host = host;
        }
        if self.api_key.is_none() {
            self.api_key = lookup("OPENCURSOR_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".opencursor")
    }

    /// The workspace root: configured path, else the current directory.
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_iterations must be at least 1".into(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError("host must not be empty".into()));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `config --init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            host: default_host(),
            api_key: None,
            temperature: default_temperature(),
            max_iterations: default_max_iterations(),
            workspace: None,
            tools: ToolsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.max_iterations, 25);
        assert!(config.validate().is_ok());
        assert!(config.tools.allowed_commands.is_empty());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.tools.max_grep_results, 50);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let config = AppConfig {
            max_iterations: 0,
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider, "ollama");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
model = "llama3.1:8b"
max_iterations = 10

[tools]
allowed_commands = ["ls", "cargo"]
restrict_to_workspace = true
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "llama3.1:8b");
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.host, "http://localhost:11434");
        assert_eq!(config.tools.allowed_commands, vec!["ls", "cargo"]);
        assert!(config.tools.restrict_to_workspace);
        assert_eq!(config.tools.max_file_search_results, 10);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_iterations = \"many\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("OPENCURSOR_MODEL", "gpt-4o-mini"),
            ("OPENCURSOR_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.provider, "openai");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.host, "http://localhost:11434");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let out = format!("{config:?}");
        assert!(!out.contains("sk-secret"));
        assert!(out.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("qwen3_14b_q6k"));
        assert!(toml_str.contains("max_iterations = 25"));
    }
}
