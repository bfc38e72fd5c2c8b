//! Validated settings handed to the logger at startup.

use crate::{ConfigError, TicklogConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything the daemon needs, with required fields guaranteed present.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerSettings {
    pub name: String,
    /// Full input port name, `/<name><data_port_name>`.
    pub data_port: String,
    /// Full command port name, `/<name><rpc_port_name>`.
    pub rpc_port: String,
    pub data_endpoint: String,
    pub rpc_endpoint: String,
    pub sampling_period: Duration,
    pub output_dir: PathBuf,
}

impl LoggerSettings {
    pub fn from_config(config: &TicklogConfig) -> Result<Self, ConfigError> {
        let name = required(&config.logger.name, "logger.name")?;
        let data_suffix = required(&config.logger.data_port_name, "logger.data_port_name")?;
        let rpc_suffix = required(&config.logger.rpc_port_name, "logger.rpc_port_name")?;

        let sampling_period = sampling_period(config.logger.sampling_time)?;

        let data_port = port_name(name, data_suffix);
        let rpc_port = port_name(name, rpc_suffix);

        let data_endpoint = config
            .bind
            .data_endpoint
            .clone()
            .unwrap_or_else(|| ipc_endpoint(&config.paths.socket_dir, &data_port));
        let rpc_endpoint = config
            .bind
            .rpc_endpoint
            .clone()
            .unwrap_or_else(|| ipc_endpoint(&config.paths.socket_dir, &rpc_port));

        Ok(Self {
            name: name.to_string(),
            data_port,
            rpc_port,
            data_endpoint,
            rpc_endpoint,
            sampling_period,
            output_dir: config.paths.output_dir.clone(),
        })
    }
}

/// Polling period from seconds. Values that round to zero or overflow a
/// `Duration` are rejected; the ticker needs a non-zero period.
fn sampling_period(seconds: f64) -> Result<Duration, ConfigError> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(ConfigError::InvalidValue {
            field: "logger.sampling_time".to_string(),
            message: format!("must be a positive number of seconds, got {seconds}"),
        }),
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ConfigError> {
    value.as_deref().ok_or(ConfigError::MissingField { field })
}

/// Full port name: `"/" + name + suffix`.
pub fn port_name(name: &str, suffix: &str) -> String {
    format!("/{}{}", name.trim_start_matches('/'), suffix)
}

/// `ipc://` endpoint for a port name: the leading `/` is dropped and the
/// remaining `/` separators become `.`, so every port maps to a single file
/// directly under `socket_dir`.
pub fn ipc_endpoint(socket_dir: &Path, port: &str) -> String {
    let file_name = port.trim_start_matches('/').replace('/', ".");
    format!("ipc://{}", socket_dir.join(file_name).display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> TicklogConfig {
        let mut config = TicklogConfig::default();
        config.logger.name = Some("logger".to_string());
        config.logger.data_port_name = Some("/data:i".to_string());
        config.logger.rpc_port_name = Some("/rpc".to_string());
        config
    }

    #[test]
    fn test_port_names() {
        assert_eq!(port_name("logger", "/data:i"), "/logger/data:i");
        assert_eq!(port_name("/logger", "/rpc"), "/logger/rpc");
    }

    #[test]
    fn test_ipc_endpoint_flattens_port_name() {
        let endpoint = ipc_endpoint(Path::new("/tmp"), "/logger/data:i");
        assert_eq!(endpoint, "ipc:///tmp/logger.data:i");
    }

    #[test]
    fn test_settings_derive_endpoints() {
        let settings = LoggerSettings::from_config(&complete_config()).unwrap();
        assert_eq!(settings.data_port, "/logger/data:i");
        assert_eq!(settings.rpc_port, "/logger/rpc");
        assert_eq!(settings.data_endpoint, "ipc:///tmp/logger.data:i");
        assert_eq!(settings.rpc_endpoint, "ipc:///tmp/logger.rpc");
        assert_eq!(settings.sampling_period, Duration::from_millis(5));
    }

    #[test]
    fn test_explicit_endpoints_win() {
        let mut config = complete_config();
        config.bind.data_endpoint = Some("tcp://127.0.0.1:5590".to_string());
        let settings = LoggerSettings::from_config(&config).unwrap();
        assert_eq!(settings.data_endpoint, "tcp://127.0.0.1:5590");
        assert_eq!(settings.rpc_endpoint, "ipc:///tmp/logger.rpc");
    }

    #[test]
    fn test_missing_required_fields() {
        for field in ["logger.name", "logger.data_port_name", "logger.rpc_port_name"] {
            let mut config = complete_config();
            match field {
                "logger.name" => config.logger.name = None,
                "logger.data_port_name" => config.logger.data_port_name = None,
                _ => config.logger.rpc_port_name = None,
            }
            let err = LoggerSettings::from_config(&config).unwrap_err();
            assert!(
                matches!(err, ConfigError::MissingField { field: f } if f == field),
                "expected missing {field}, got {err}"
            );
        }
    }

    #[test]
    fn test_sampling_time_must_be_positive() {
        for bad in [0.0, -0.5, f64::NAN, f64::INFINITY, 1e30, 1e-12] {
            let mut config = complete_config();
            config.logger.sampling_time = bad;
            assert!(
                matches!(
                    LoggerSettings::from_config(&config),
                    Err(ConfigError::InvalidValue { .. })
                ),
                "sampling_time = {bad} was accepted"
            );
        }
    }

    #[test]
    fn test_sub_millisecond_sampling_time() {
        let mut config = complete_config();
        config.logger.sampling_time = 0.0005;
        let settings = LoggerSettings::from_config(&config).unwrap();
        assert_eq!(settings.sampling_period, Duration::from_micros(500));
    }
}
