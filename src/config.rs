use crate::extract::ScanMode;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Directory created next to the executable when no output root is set.
pub const OUTPUT_DIR_NAME: &str = "S4Y Output";

/// Prefix of the environment variables read by [`Settings::load`].
pub const ENV_PREFIX: &str = "S4Y";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    #[error("Can't locate the running executable: {0}")]
    ExecutableError(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Run settings: defaults, overridden by `S4Y_*` environment variables,
/// overridden in turn by command-line flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Root of the per-domain output directories
    #[serde(default)]
    pub output_root: Option<PathBuf>,

    /// Request timeout in seconds, 0 waits forever
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after a failed fetch
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Backoff before the first retry, doubled for each one after
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default)]
    pub scan: ScanMode,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_root: None,
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
            scan: ScanMode::default(),
        }
    }
}

impl Settings {

    /// Reads settings from the `S4Y_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::from_config(
            ::config::Config::builder()
                .add_source(::config::Environment::with_prefix(ENV_PREFIX))
                .build()?,
        )
    }

    pub fn from_config(config: ::config::Config) -> Result<Self> {
        Ok(config.try_deserialize()?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// The configured output root, or `S4Y Output` beside the executable.
    pub fn output_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.output_root {
            return Ok(root.clone());
        }

        let exe = std::env::current_exe().map_err(SettingsError::ExecutableError)?;
        let dir = exe.parent().map(PathBuf::from).unwrap_or_default();

        Ok(dir.join(OUTPUT_DIR_NAME))
    }
}
