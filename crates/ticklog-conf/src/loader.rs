//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, TicklogConfig};
use serde::de::DeserializeOwned;
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided it replaces the local override. Unlike the
/// standard locations it is returned even when missing, so that a typo on
/// the command line surfaces as a read error instead of silently loading
/// nothing.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/ticklog/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("ticklog/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("ticklog.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file and apply every key it sets on top of `config`.
pub fn load_into(config: &mut TicklogConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Apply the keys present in `contents`; absent keys keep their current value.
pub(crate) fn apply_toml(
    config: &mut TicklogConfig,
    contents: &str,
    path: &Path,
) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let origin = path.display().to_string();

    if let Some(logger) = section(&table, "logger", &origin)? {
        if let Some(v) = string_field(logger, "logger", "name", &origin)? {
            config.logger.name = Some(v);
        }
        if let Some(v) = string_field(logger, "logger", "data_port_name", &origin)? {
            config.logger.data_port_name = Some(v);
        }
        if let Some(v) = string_field(logger, "logger", "rpc_port_name", &origin)? {
            config.logger.rpc_port_name = Some(v);
        }
        if let Some(v) = float_field(logger, "logger", "sampling_time", &origin)? {
            config.logger.sampling_time = v;
        }
    }

    if let Some(paths) = section(&table, "paths", &origin)? {
        if let Some(v) = string_field(paths, "paths", "output_dir", &origin)? {
            config.paths.output_dir = expand_path(&v);
        }
        if let Some(v) = string_field(paths, "paths", "socket_dir", &origin)? {
            config.paths.socket_dir = expand_path(&v);
        }
    }

    if let Some(bind) = section(&table, "bind", &origin)? {
        if let Some(v) = string_field(bind, "bind", "data_endpoint", &origin)? {
            config.bind.data_endpoint = Some(v);
        }
        if let Some(v) = string_field(bind, "bind", "rpc_endpoint", &origin)? {
            config.bind.rpc_endpoint = Some(v);
        }
    }

    if let Some(telemetry) = section(&table, "telemetry", &origin)? {
        if let Some(v) = string_field(telemetry, "telemetry", "log_level", &origin)? {
            config.telemetry.log_level = v;
        }
    }

    Ok(())
}

fn section<'a>(
    table: &'a toml::Table,
    name: &str,
    origin: &str,
) -> Result<Option<&'a toml::Table>, ConfigError> {
    match table.get(name) {
        None => Ok(None),
        Some(toml::Value::Table(t)) => Ok(Some(t)),
        Some(_) => Err(ConfigError::InvalidType {
            field: name.to_string(),
            expected: "table",
            origin: origin.to_string(),
        }),
    }
}

/// Decode `section.key` through serde, reporting a wrong TOML type as
/// [`ConfigError::InvalidType`].
fn field<T: DeserializeOwned>(
    table: &toml::Table,
    section: &str,
    key: &str,
    expected: &'static str,
    origin: &str,
) -> Result<Option<T>, ConfigError> {
    table
        .get(key)
        .map(|value| value.clone().try_into::<T>())
        .transpose()
        .map_err(|_| ConfigError::InvalidType {
            field: format!("{section}.{key}"),
            expected,
            origin: origin.to_string(),
        })
}

fn string_field(
    table: &toml::Table,
    section: &str,
    key: &str,
    origin: &str,
) -> Result<Option<String>, ConfigError> {
    field(table, section, key, "string", origin)
}

/// Floats and integers are both accepted.
fn float_field(
    table: &toml::Table,
    section: &str,
    key: &str,
    origin: &str,
) -> Result<Option<f64>, ConfigError> {
    field(table, section, key, "number", origin)
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(
    config: &mut TicklogConfig,
    sources: &mut ConfigSources,
) -> Result<(), ConfigError> {
    apply_overrides_from(config, sources, |key| env::var(key).ok())
}

/// Apply overrides using `lookup` in place of the process environment.
pub fn apply_overrides_from<F>(
    config: &mut TicklogConfig,
    sources: &mut ConfigSources,
    lookup: F,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("TICKLOG_NAME") {
        config.logger.name = Some(v);
        sources.env_overrides.push("TICKLOG_NAME".to_string());
    }
    if let Some(v) = lookup("TICKLOG_DATA_PORT_NAME") {
        config.logger.data_port_name = Some(v);
        sources.env_overrides.push("TICKLOG_DATA_PORT_NAME".to_string());
    }
    if let Some(v) = lookup("TICKLOG_RPC_PORT_NAME") {
        config.logger.rpc_port_name = Some(v);
        sources.env_overrides.push("TICKLOG_RPC_PORT_NAME".to_string());
    }
    if let Some(v) = lookup("TICKLOG_SAMPLING_TIME") {
        config.logger.sampling_time = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
            field: "logger.sampling_time".to_string(),
            message: format!("TICKLOG_SAMPLING_TIME={v:?} is not a number"),
        })?;
        sources.env_overrides.push("TICKLOG_SAMPLING_TIME".to_string());
    }

    if let Some(v) = lookup("TICKLOG_OUTPUT_DIR") {
        config.paths.output_dir = expand_path(&v);
        sources.env_overrides.push("TICKLOG_OUTPUT_DIR".to_string());
    }
    if let Some(v) = lookup("TICKLOG_SOCKET_DIR") {
        config.paths.socket_dir = expand_path(&v);
        sources.env_overrides.push("TICKLOG_SOCKET_DIR".to_string());
    }

    if let Some(v) = lookup("TICKLOG_DATA_ENDPOINT") {
        config.bind.data_endpoint = Some(v);
        sources.env_overrides.push("TICKLOG_DATA_ENDPOINT".to_string());
    }
    if let Some(v) = lookup("TICKLOG_RPC_ENDPOINT") {
        config.bind.rpc_endpoint = Some(v);
        sources.env_overrides.push("TICKLOG_RPC_ENDPOINT".to_string());
    }

    if let Some(v) = lookup("TICKLOG_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("TICKLOG_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    Ok(())
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
