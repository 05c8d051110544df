use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure for saverepos
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Local root under which `owner/repo` mirrors are created
    #[serde(default = "default_base_directory")]
    pub base_directory: String,

    /// Base URL of the Gitea server (the CLI positional argument wins)
    #[serde(default)]
    pub server_url: Option<String>,

    /// Log verbosity when RUST_LOG is not set
    #[serde(default)]
    pub log_level: LogLevel,

    /// Value of the `limit` query parameter sent to the search API
    #[serde(default)]
    pub page_size: Option<u32>,

    /// HTTP request timeout in seconds, no timeout when unset
    #[serde(default)]
    pub request_timeout: Option<u64>,

    /// Exit successfully even if some clones or pulls failed
    #[serde(default)]
    pub allow_failures: bool,
}

/// Log verbosity accepted by `--loglevel`
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    #[default]
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(format!(
                "invalid log level '{}' (expected DEBUG, INFO, WARNING or ERROR)",
                s
            )),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_string()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        };
        f.write_str(name)
    }
}

fn default_base_directory() -> String {
    "repos".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            server_url: None,
            log_level: LogLevel::default(),
            page_size: None,
            request_timeout: None,
            allow_failures: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    ///
    /// Unlike an explicit `--config`, a missing default file is not an error
    /// and is never created.
    pub fn load_or_default() -> Result<Self> {
        match Self::default_config_path() {
            Ok(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.expand_paths()?;

        Ok(config)
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("saverepos").join("config.yml"))
    }

    /// Expand `~` and environment variables in the base directory
    ///
    /// Applied once, to values read from a config file.
    pub fn expand_paths(&mut self) -> Result<()> {
        self.base_directory = shellexpand::full(&self.base_directory)
            .context("Failed to expand base_directory path")?
            .into_owned();

        Ok(())
    }

    /// Replace the base directory with a command line value
    ///
    /// The shell has already expanded it, so only a leading `~` is resolved
    /// and `$` is kept literally.
    pub fn set_base_directory(&mut self, dir: &str) {
        self.base_directory = shellexpand::tilde(dir).into_owned();
    }

    pub fn base_dir(&self) -> PathBuf {
        PathBuf::from(&self.base_directory)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout.map(Duration::from_secs)
    }
}
