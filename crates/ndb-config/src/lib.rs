//! Shared configuration for the ndb command-line bridge.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, an optional
//! TOML file, `NDB_*` environment variables and finally command-line flags.
//! Only ambient concerns live here (which bus to use and how to log); the
//! identity of the remote object is fixed by the engine.

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod bus;
mod defaults;
mod logging;

pub use bus::BusKind;
pub use defaults::{
    DEFAULT_LOG_FILTER, default_bus, default_log_filter, default_log_filter_string,
    default_log_format,
};
pub use logging::LogFormat;

/// Resolved configuration for a single CLI run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "NDB")]
pub struct Config {
    /// Bus hosting the remote object.
    #[serde(default = "default_bus")]
    #[ortho_config(default = default_bus())]
    pub bus: BusKind,
    /// `tracing` filter expression applied to diagnostics.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for diagnostics.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Bus the CLI should connect to.
    #[must_use]
    pub const fn bus(&self) -> BusKind {
        self.bus
    }

    /// Filter expression for the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Format used when rendering diagnostics.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
