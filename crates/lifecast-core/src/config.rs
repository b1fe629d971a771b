//! Configuration loading and typed config structures for Lifecast.
//!
//! The configuration lives in `lifecast-config.yaml`. Every field has a
//! default, so an absent file or an absent section is fine. Environment
//! variables override the listen address for container deployments.

use std::path::Path;

use serde::Deserialize;

/// Hard ceiling on either grid axis.
///
/// World-state frames encode coordinates as `u16`, so no axis may exceed
/// `u16::MAX + 1` cells.
pub const MAX_DIMENSION: u32 = 1 << 16;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held an unusable value.
    #[error("invalid value for {var}: {value}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration, mirroring `lifecast-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LifecastConfig {
    /// HTTP listen address.
    #[serde(default)]
    pub server: ServerSettings,

    /// Simulation limits and pacing.
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Per-listener transport settings.
    #[serde(default)]
    pub listener: ListenerSettings,
}

impl LifecastConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `LIFECAST_HOST` and `LIFECAST_PORT` override `server.host` and
    /// `server.port` when set.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying env overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.server.apply_env_overrides()?;
        Ok(config)
    }
}

/// HTTP listen address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// Bind host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    /// Override host and port from `LIFECAST_HOST` / `LIFECAST_PORT`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("LIFECAST_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("LIFECAST_PORT") {
            self.port = val.parse().map_err(|_parse_err| ConfigError::InvalidEnv {
                var: "LIFECAST_PORT",
                value: val.clone(),
            })?;
        }
        Ok(())
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Simulation limits and pacing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationSettings {
    /// Largest width or height an instance may declare (and the exclusive
    /// bound on seed coordinates). Clamped to [`MAX_DIMENSION`].
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// Pause between generations in milliseconds. Zero means the run loop
    /// only yields to the scheduler between generations.
    #[serde(default)]
    pub generation_interval_ms: u64,
}

impl SimulationSettings {
    /// The configured maximum, clamped to what the wire format can carry.
    pub fn effective_max_dimension(&self) -> u32 {
        self.max_dimension.min(MAX_DIMENSION)
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            generation_interval_ms: 0,
        }
    }
}

/// Per-listener transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenerSettings {
    /// World-state frames buffered per listener before new ones are
    /// dropped for it. Control replies do not pass through this queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Deadline for writing one frame to the transport.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    /// A listener that sends nothing for this long is disconnected. The
    /// server pings at half this interval and pongs count as activity.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            write_timeout_ms: default_write_timeout_ms(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

const fn default_max_dimension() -> u32 {
    1024
}

const fn default_queue_capacity() -> usize {
    64
}

const fn default_write_timeout_ms() -> u64 {
    5_000
}

const fn default_idle_timeout_secs() -> u64 {
    60
}
