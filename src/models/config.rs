//! Application configuration structures.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the aggregated feed comes from and how to fetch it
    #[serde(default)]
    pub source: SourceConfig,

    /// Refresh loop timing
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// HTTP surface settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Optional on-disk mirror of each snapshot
    #[serde(default)]
    pub output: OutputConfig,

    /// Log filter settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Franchise rules tried before the generic episode pattern
    #[serde(default = "defaults::show_rules")]
    pub shows: Vec<ShowRule>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(AppError::validation("source.url is empty"));
        }
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.refresh.interval_secs == 0 {
            return Err(AppError::validation("refresh.interval_secs must be > 0"));
        }
        self.server.socket_addr()?;
        for rule in &self.shows {
            rule.validate()?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            refresh: RefreshConfig::default(),
            server: ServerConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            shows: defaults::show_rules(),
        }
    }
}

/// Feed source and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// `http(s)://` or `file://` URL of the aggregated feed
    #[serde(default = "defaults::feed_url")]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-attempt retrieval timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::feed_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Refresh loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between refresh attempts (also the first-run retry interval)
    #[serde(default = "defaults::refresh_interval")]
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::refresh_interval(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to serve on
    #[serde(default = "defaults::addr")]
    pub addr: String,
}

impl ServerConfig {
    /// Parse the configured listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.addr
            .parse()
            .map_err(|e| AppError::validation(format!("server.addr '{}': {}", self.addr, e)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::addr(),
        }
    }
}

/// On-disk output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Directory to mirror `<slug>.xml` files into after every refresh
    #[serde(default)]
    pub dir: Option<String>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// A franchise rule mapping matching titles onto one canonical show.
///
/// Exactly one of `prefix` or `pattern` must be set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowRule {
    /// Literal title prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Regular expression searched anywhere in the title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Canonical show name for matching titles
    pub show: String,
}

impl ShowRule {
    /// Rule matching titles that start with `prefix`.
    pub fn prefix(prefix: impl Into<String>, show: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            pattern: None,
            show: show.into(),
        }
    }

    /// Rule matching titles in which `pattern` is found.
    pub fn pattern(pattern: impl Into<String>, show: impl Into<String>) -> Self {
        Self {
            prefix: None,
            pattern: Some(pattern.into()),
            show: show.into(),
        }
    }

    /// Check the rule is well-formed and its pattern compiles.
    pub fn validate(&self) -> Result<()> {
        if self.show.trim().is_empty() {
            return Err(AppError::validation("show rule has an empty show name"));
        }
        match (&self.prefix, &self.pattern) {
            (Some(_), None) => Ok(()),
            (None, Some(pattern)) => regex::Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| AppError::pattern(pattern, e)),
            _ => Err(AppError::validation(format!(
                "show rule for '{}' needs exactly one of prefix or pattern",
                self.show
            ))),
        }
    }
}

mod defaults {
    use super::ShowRule;

    // Source defaults
    pub fn feed_url() -> String {
        "https://feed.podbean.com/badlandsmedia/feed.xml".into()
    }
    pub fn user_agent() -> String {
        concat!("feedsplit/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        5
    }

    // Refresh defaults
    pub fn refresh_interval() -> u64 {
        300
    }

    // Server defaults
    pub fn addr() -> String {
        "0.0.0.0:52390".into()
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }

    // Show rule defaults
    pub fn show_rules() -> Vec<ShowRule> {
        vec![
            ShowRule::prefix("Altered State", "Altered State"),
            ShowRule::pattern(
                r"WWG1WGA(?: After Dark Ep. \d+:|: After Dark Ep. \d+ –) .*",
                "WWG1WGA After Dark",
            ),
            ShowRule::pattern(r"Y[- ]Chromes Ep. \d+: .*", "Y-Chromes"),
        ]
    }
}
