//! Configuration loader and validator for the article reader.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub app: App,
    pub api: Api,
    #[serde(default)]
    pub reading: Reading,
    #[serde(default)]
    pub content: Content,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
}

/// Backend endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    /// Base URL every endpoint path is joined onto, e.g. `https://site/api/`.
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Reading progress and telemetry thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Reading {
    pub words_per_minute: u32,
    /// Offset added to the scroll position to compensate for a sticky header.
    pub section_lookahead_px: f64,
    /// Sessions at or below this many seconds never emit a `read` event.
    pub min_read_seconds: u64,
    /// Progress percentage from which a read counts as completed.
    pub completion_threshold: f64,
    pub floating_actions_offset_px: f64,
}

/// Format resolution policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Content {
    /// Substrings whose presence classifies text content as Markdown.
    pub markdown_indicators: Vec<String>,
}

fn default_user_agent() -> String {
    "newsview/0.1".to_string()
}

impl Default for Reading {
    fn default() -> Self {
        Self {
            words_per_minute: 200,
            section_lookahead_px: 150.0,
            min_read_seconds: 10,
            completion_threshold: 90.0,
            floating_actions_offset_px: 300.0,
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Self {
            markdown_indicators: crate::content::format::DEFAULT_MARKDOWN_INDICATORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(self.resolved_data_dir())
    }

    /// `app.data_dir` with a leading `~/` expanded against `$HOME`.
    pub fn resolved_data_dir(&self) -> String {
        match self.app.data_dir.strip_prefix("~/") {
            Some(rest) => match std::env::var("HOME") {
                Ok(home) => format!("{}/{}", home.trim_end_matches('/'), rest),
                Err(_) => self.app.data_dir.clone(),
            },
            None => self.app.data_dir.clone(),
        }
    }

    /// SQLite URL for the local interaction store; `DATABASE_URL` wins when set.
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| format!("sqlite://{}/newsview.db", self.resolved_data_dir()))
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }

    if cfg.api.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api.base_url must be non-empty"));
    }
    if reqwest::Url::parse(&cfg.api.base_url).is_err() {
        return Err(ConfigError::Invalid("api.base_url must be an absolute URL"));
    }

    let r = &cfg.reading;
    if r.words_per_minute == 0 {
        return Err(ConfigError::Invalid("reading.words_per_minute must be > 0"));
    }
    if !r.section_lookahead_px.is_finite() || r.section_lookahead_px < 0.0 {
        return Err(ConfigError::Invalid(
            "reading.section_lookahead_px must be a non-negative number",
        ));
    }
    if !(0.0..=100.0).contains(&r.completion_threshold) {
        return Err(ConfigError::Invalid(
            "reading.completion_threshold must be within 0..=100",
        ));
    }

    if cfg
        .content
        .markdown_indicators
        .iter()
        .any(|i| i.is_empty())
    {
        return Err(ConfigError::Invalid(
            "content.markdown_indicators must not contain empty entries",
        ));
    }

    Ok(())
}

/// Returns the reference YAML configuration.
pub fn example() -> &'static str {
    r##"app:
  data_dir: "./data"

api:
  base_url: "http://localhost:3000/api/"
  user_agent: "newsview/0.1"

reading:
  words_per_minute: 200
  section_lookahead_px: 150
  min_read_seconds: 10
  completion_threshold: 90
  floating_actions_offset_px: 300

content:
  markdown_indicators: ["#", "**", "*", "![", "[", "|", ">", "-", "```"]
"##
}
