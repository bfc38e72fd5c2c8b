//! Configuration loading for ticklog.
//!
//! Configuration is read once at startup. Missing or malformed required
//! fields are fatal: [`TicklogConfig::settings`] returns a [`ConfigError`]
//! and the daemon declines to start.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/ticklog/config.toml` (system)
//! 2. `~/.config/ticklog/config.toml` (user)
//! 3. `./ticklog.toml` (local override, replaced by `--config <path>`)
//! 4. Environment variables (`TICKLOG_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [logger]
//! name = "logger"
//! data_port_name = "/data:i"
//! rpc_port_name = "/rpc"
//! sampling_time = 0.005
//!
//! [paths]
//! output_dir = "~/datasets"
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod sections;
pub mod settings;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{BindConfig, LoggerConfig, PathsConfig, TelemetryConfig};
pub use settings::{ipc_endpoint, port_name, LoggerSettings};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Missing required field {field}")]
    MissingField { field: &'static str },

    #[error("Field {field} in {origin} must be a {expected}")]
    InvalidType {
        field: String,
        expected: &'static str,
        origin: String,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Complete ticklog configuration.
#[derive(Debug, Clone, Default)]
pub struct TicklogConfig {
    pub logger: LoggerConfig,
    pub paths: PathsConfig,
    pub bind: BindConfig,
    pub telemetry: TelemetryConfig,
}

impl TicklogConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` in place of `./ticklog.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = TicklogConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_into(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources)?;

        Ok((config, sources))
    }

    /// Validate and resolve into the settings the daemon runs with.
    pub fn settings(&self) -> Result<LoggerSettings, ConfigError> {
        LoggerSettings::from_config(self)
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Build TOML manually for nicer formatting
        let mut output = String::new();

        output.push_str("# ticklog configuration\n\n");

        output.push_str("[logger]\n");
        push_optional(&mut output, "name", self.logger.name.as_deref());
        push_optional(&mut output, "data_port_name", self.logger.data_port_name.as_deref());
        push_optional(&mut output, "rpc_port_name", self.logger.rpc_port_name.as_deref());
        output.push_str(&format!("sampling_time = {:?}\n", self.logger.sampling_time));

        output.push_str("\n[paths]\n");
        output.push_str(&format!(
            "output_dir = \"{}\"\n",
            self.paths.output_dir.display()
        ));
        output.push_str(&format!(
            "socket_dir = \"{}\"\n",
            self.paths.socket_dir.display()
        ));

        output.push_str("\n[bind]\n");
        push_optional(&mut output, "data_endpoint", self.bind.data_endpoint.as_deref());
        push_optional(&mut output, "rpc_endpoint", self.bind.rpc_endpoint.as_deref());

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output
    }
}

fn push_optional(output: &mut String, key: &str, value: Option<&str>) {
    match value {
        Some(v) => output.push_str(&format!("{key} = \"{v}\"\n")),
        None => output.push_str(&format!("# {key} = (unset)\n")),
    }
}
