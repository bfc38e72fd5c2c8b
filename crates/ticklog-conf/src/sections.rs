//! Configuration sections as they appear in `ticklog.toml`.

use std::path::PathBuf;

/// Identity and port naming of the logger process.
///
/// `name`, `data_port_name` and `rpc_port_name` have no defaults; a config
/// that leaves any of them unset fails validation.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Process identity, used as the first segment of both port names.
    pub name: Option<String>,

    /// Suffix of the input port, e.g. `/data:i`.
    pub data_port_name: Option<String>,

    /// Suffix of the command port, e.g. `/rpc`.
    pub rpc_port_name: Option<String>,

    /// Polling period in seconds.
    /// Default: 0.005
    pub sampling_time: f64,
}

impl LoggerConfig {
    pub const DEFAULT_SAMPLING_TIME: f64 = 0.005;
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: None,
            data_port_name: None,
            rpc_port_name: None,
            sampling_time: Self::DEFAULT_SAMPLING_TIME,
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// Directory that receives `Dataset_*.txt` files.
    /// Default: current directory
    pub output_dir: PathBuf,

    /// Directory for derived `ipc://` endpoints.
    /// Default: /tmp
    pub socket_dir: PathBuf,
}

impl PathsConfig {
    fn default_output_dir() -> PathBuf {
        PathBuf::from(".")
    }

    fn default_socket_dir() -> PathBuf {
        PathBuf::from("/tmp")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: Self::default_output_dir(),
            socket_dir: Self::default_socket_dir(),
        }
    }
}

/// Explicit ZMQ endpoints. When unset, endpoints are derived from the
/// port names under `paths.socket_dir`.
#[derive(Debug, Clone, Default)]
pub struct BindConfig {
    /// SUB endpoint for sample vectors, e.g. `tcp://0.0.0.0:5590`.
    pub data_endpoint: Option<String>,

    /// ROUTER endpoint for commands, e.g. `tcp://0.0.0.0:5591`.
    pub rpc_endpoint: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive).
    /// Default: info
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_defaults() {
        let logger = LoggerConfig::default();
        assert!(logger.name.is_none());
        assert!(logger.data_port_name.is_none());
        assert!(logger.rpc_port_name.is_none());
        assert_eq!(logger.sampling_time, 0.005);
    }

    #[test]
    fn test_paths_defaults() {
        let paths = PathsConfig::default();
        assert_eq!(paths.output_dir, PathBuf::from("."));
        assert_eq!(paths.socket_dir, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_telemetry_defaults() {
        assert_eq!(TelemetryConfig::default().log_level, "info");
    }
}
