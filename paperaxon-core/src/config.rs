//! Configuration for the paperaxon client

use crate::AxonError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration as TOML
pub const DEFAULT_CONFIG: &str = r#"# PaperAxon client configuration

[service]
# Backend origin; every endpoint lives under <base_url>/api
base_url = "http://127.0.0.1:18527"
# Per-request timeout. Leave unset for none.
# request_timeout = "30s"

[tasks]
# Delay between two status checks of a running task
poll_interval = "2s"
# Give up waiting after this long (the backend job keeps running)
timeout = "15m"
"#;

/// PaperAxon client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub tasks: TaskConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub request_timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
    /// Empty string disables the deadline
    #[serde(default = "default_task_timeout")]
    pub timeout: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:18527".to_string()
}
fn default_poll_interval() -> String {
    "2s".to_string()
}
fn default_task_timeout() -> String {
    "15m".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: None,
        }
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            timeout: default_task_timeout(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| AxonError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.service.base_url.trim().is_empty() {
            return Err(AxonError::ConfigParse("service.base_url is empty".to_string()));
        }
        if let Some(raw) = &self.service.request_timeout {
            require_duration("service.request_timeout", raw)?;
        }
        let interval = require_duration("tasks.poll_interval", &self.tasks.poll_interval)?;
        if interval.is_zero() {
            return Err(AxonError::ConfigParse(
                "tasks.poll_interval must be greater than zero".to_string(),
            ));
        }
        if !self.tasks.timeout.trim().is_empty() {
            require_duration("tasks.timeout", &self.tasks.timeout)?;
        }
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.service.base_url
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.service
            .request_timeout
            .as_deref()
            .and_then(parse_duration)
    }

    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        parse_duration(&self.tasks.poll_interval).unwrap_or(Duration::from_secs(2))
    }

    /// Get task deadline as Duration, `None` when disabled
    pub fn task_timeout(&self) -> Option<Duration> {
        parse_duration(&self.tasks.timeout)
    }
}

fn require_duration(field: &str, raw: &str) -> crate::Result<Duration> {
    parse_duration(raw).ok_or_else(|| {
        AxonError::ConfigParse(format!("{}: invalid duration '{}'", field, raw))
    })
}

/// Parse duration string (e.g., "500ms", "2s", "15m", "1h")
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(num_str) = s.strip_suffix("ms") {
        return num_str.parse().ok().map(Duration::from_millis);
    }

    let unit_start = s.len() - s.chars().last()?.len_utf8();
    let (num_str, unit) = s.split_at(unit_start);
    let num: u64 = num_str.parse().ok()?;

    match unit {
        "s" => Some(Duration::from_secs(num)),
        "m" => num.checked_mul(60).map(Duration::from_secs),
        "h" => num.checked_mul(3600).map(Duration::from_secs),
        _ => None,
    }
}
