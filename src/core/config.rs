//! Configuration: platform lookup, color rules and environment overrides
//!
//! Every environment read goes through an injected lookup function so the
//! rules can be exercised without touching the process environment.

use super::error::{LoggerError, Result};
use super::severity::Severity;
use super::sink::DEFAULT_SINK_CAPACITY;
use super::transformer::Transformer;
use crate::transformers::{AppendLogTransformer, CloudFunctionTransformer, JsonTransformer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::IsTerminal;
use std::str::FromStr;
use std::sync::Arc;

/// Variables whose presence selects the cloud-function format
const CLOUD_FUNCTION_VARS: [&str; 3] = ["K_SERVICE", "FUNCTION_TARGET", "FUNCTION_NAME"];

/// Variables whose presence selects the append-log format
const APPEND_LOG_VARS: [&str; 2] = ["AWS_LAMBDA_FUNCTION_NAME", "LAMBDA_TASK_ROOT"];

/// Deployment target, deciding the default wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// Generic JSON lines
    Json,
    /// Cloud-function JSON with platform severities
    CloudFunction,
    /// Tab-separated append-log lines
    AppendLog,
    /// Human-readable, optionally colored
    Terminal,
}

impl Platform {
    /// Select a platform from deployment variables
    ///
    /// Falls back to `Terminal` when the output is an interactive terminal
    /// and `Json` otherwise.
    pub fn detect(env: impl Fn(&str) -> Option<String>, is_terminal: bool) -> Self {
        let present = |name: &&str| env(*name).is_some_and(|v| !v.is_empty());

        if CLOUD_FUNCTION_VARS.iter().any(present) {
            Platform::CloudFunction
        } else if APPEND_LOG_VARS.iter().any(present) {
            Platform::AppendLog
        } else if is_terminal {
            Platform::Terminal
        } else {
            Platform::Json
        }
    }

    /// [`Platform::detect`] against the process environment and stdout
    pub fn from_process_env() -> Self {
        Self::detect(process_env, std::io::stdout().is_terminal())
    }

    /// Default transformer for this platform
    ///
    /// Without the `console` feature, `Terminal` renders generic JSON.
    pub fn transformer(&self, colors: bool) -> Arc<dyn Transformer> {
        match self {
            Platform::Json => Arc::new(JsonTransformer),
            Platform::CloudFunction => Arc::new(CloudFunctionTransformer),
            Platform::AppendLog => Arc::new(AppendLogTransformer),
            #[cfg(feature = "console")]
            Platform::Terminal => Arc::new(crate::transformers::PrettyTransformer::new(colors)),
            #[cfg(not(feature = "console"))]
            Platform::Terminal => {
                let _ = colors;
                Arc::new(JsonTransformer)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Json => "json",
            Platform::CloudFunction => "cloud-function",
            Platform::AppendLog => "append-log",
            Platform::Terminal => "terminal",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "json" => Ok(Platform::Json),
            "cloud-function" | "gcp" => Ok(Platform::CloudFunction),
            "append-log" | "lambda" | "aws" => Ok(Platform::AppendLog),
            "terminal" | "pretty" => Ok(Platform::Terminal),
            _ => Err(LoggerError::config("platform", format!("unknown platform '{}'", s))),
        }
    }
}

/// Decide whether terminal output is colored
///
/// `NO_COLOR` (any value) or `TERM=dumb` always disables color. Otherwise
/// `FORCE_COLOR` (other than `0`) enables it, and failing that color follows
/// `is_terminal`.
pub fn color_enabled(env: impl Fn(&str) -> Option<String>, is_terminal: bool) -> bool {
    if env("NO_COLOR").is_some() || env("TERM").as_deref() == Some("dumb") {
        return false;
    }
    match env("FORCE_COLOR") {
        Some(value) => value != "0",
        None => is_terminal,
    }
}

/// Lookup against the real process environment
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Serializable logger settings
///
/// # Example
///
/// ```
/// use rust_log_pipeline::{LoggerConfig, Platform, Severity};
///
/// let config: LoggerConfig =
///     serde_json::from_str(r#"{"level": "debug", "platform": "append-log"}"#).unwrap();
/// assert_eq!(config.level, Severity::Debug);
/// assert_eq!(config.platform, Some(Platform::AppendLog));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum severity that enters the pipeline
    pub level: Severity,
    /// Explicit platform; detected when `None`
    pub platform: Option<Platform>,
    /// Stamped into `ctx.name`
    pub name: Option<String>,
    /// Redaction paths into `data`
    pub redact: Vec<String>,
    pub censor: Option<String>,
    pub sink_capacity: usize,
    pub caller_annotation: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Severity::Info,
            platform: None,
            name: None,
            redact: Vec::new(),
            censor: None,
            sink_capacity: DEFAULT_SINK_CAPACITY,
            caller_annotation: false,
        }
    }
}

impl LoggerConfig {
    /// Read `LOG_LEVEL`, `LOG_PLATFORM`, `LOG_NAME` and `LOG_REDACT` from the
    /// process environment
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(process_env)
    }

    /// Like [`LoggerConfig::from_env`] with an injected lookup
    pub fn from_env_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(level) = env("LOG_LEVEL") {
            config.level = level
                .parse()
                .map_err(|e: String| LoggerError::config("LOG_LEVEL", e))?;
        }
        if let Some(platform) = env("LOG_PLATFORM") {
            config.platform = Some(platform.parse()?);
        }
        if let Some(name) = env("LOG_NAME").filter(|n| !n.is_empty()) {
            config.name = Some(name);
        }
        if let Some(paths) = env("LOG_REDACT") {
            config.redact = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(config)
    }
}
