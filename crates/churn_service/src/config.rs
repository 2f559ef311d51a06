//! Service configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `CHURN_*` environment variables. Command-line flags are applied last via
//! [`ConfigOverrides`].

use crate::errors::{Result, ServiceError};
use axum::http::StatusCode;
use churn_core::{ModelKind, UnknownCategoryPolicy, UnknownKeyPolicy};
use config::{Config, Environment, File as ConfigFile};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file read when `--config` is not given and the file exists
pub const DEFAULT_CONFIG_PATH: &str = "config/churn-service.toml";

/// Prefix of recognised environment variables
pub const ENV_PREFIX: &str = "CHURN";

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub model_dir: PathBuf,
    pub model_key: String,
    pub log_level: String,
    /// `pretty` or `compact`
    pub log_format: String,
    pub unknown_keys: UnknownKeyPolicy,
    pub unknown_categories: UnknownCategoryPolicy,
    /// Status returned by prediction routes while no model is loaded
    pub unavailable_status: StatusCode,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            model_dir: PathBuf::from("models"),
            model_key: ModelKind::LogisticRegression.as_key().to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            unknown_keys: UnknownKeyPolicy::default(),
            unknown_categories: UnknownCategoryPolicy::default(),
            unavailable_status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Command-line values that take precedence over file and environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_addr: Option<String>,
    pub model_dir: Option<PathBuf>,
    pub model_key: Option<String>,
    pub log_level: Option<String>,
}

impl ServiceConfig {
    /// Load from file and environment.
    ///
    /// An explicit `path` must exist; otherwise [`DEFAULT_CONFIG_PATH`] is
    /// used only when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let resolved = match path {
            Some(path) if !path.exists() => {
                return Err(ServiceError::InvalidConfig(format!(
                    "configuration file {} not found (specified via --config)",
                    path.display()
                )));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|p| p.exists()),
        };

        Self::from_sources(resolved.as_deref(), Environment::with_prefix(ENV_PREFIX))
    }

    /// Merge an optional file with an environment source; the environment wins
    pub fn from_sources(file: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            debug!("reading configuration from {}", path.display());
            builder = builder.add_source(ConfigFile::from(path));
        }
        builder = builder.add_source(env);

        Self::from_config(&builder.build()?)
    }

    /// Resolve every field from merged configuration sources
    pub fn from_config(config: &Config) -> Result<Self> {
        let defaults = Self::default();

        let unknown_keys = match get_string_value(config, &["UNKNOWN_KEYS", "unknown_keys"]) {
            Some(raw) => raw.parse().map_err(ServiceError::InvalidConfig)?,
            None => defaults.unknown_keys,
        };
        let unknown_categories =
            match get_string_value(config, &["UNKNOWN_CATEGORIES", "unknown_categories"]) {
                Some(raw) => raw.parse().map_err(ServiceError::InvalidConfig)?,
                None => defaults.unknown_categories,
            };
        let unavailable_status =
            match get_string_value(config, &["UNAVAILABLE_STATUS", "unavailable_status"]) {
                Some(raw) => parse_unavailable_status(&raw)?,
                None => defaults.unavailable_status,
            };

        let cfg = Self {
            bind_addr: get_string_value(config, &["BIND_ADDR", "bind_addr"])
                .unwrap_or(defaults.bind_addr),
            model_dir: get_string_value(config, &["MODEL_DIR", "model_dir"])
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            model_key: get_string_value(config, &["MODEL_KEY", "model_key"])
                .unwrap_or(defaults.model_key),
            log_level: get_string_value(config, &["LOG_LEVEL", "log_level"])
                .unwrap_or(defaults.log_level),
            log_format: get_string_value(config, &["LOG_FORMAT", "log_format"])
                .map(|value| value.to_lowercase())
                .unwrap_or(defaults.log_format),
            unknown_keys,
            unknown_categories,
            unavailable_status,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<()> {
        if let Some(bind_addr) = overrides.bind_addr {
            self.bind_addr = bind_addr;
        }
        if let Some(model_dir) = overrides.model_dir {
            self.model_dir = model_dir;
        }
        if let Some(model_key) = overrides.model_key {
            self.model_key = model_key;
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = log_level;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.trim().is_empty() {
            return Err(ServiceError::InvalidConfig("bind_addr is empty".to_string()));
        }
        if !matches!(self.log_format.as_str(), "pretty" | "compact") {
            return Err(ServiceError::InvalidConfig(format!(
                "log_format must be pretty or compact, got {}",
                self.log_format
            )));
        }
        Ok(())
    }
}

/// Only server-error statuses are allowed for the unavailable state
fn parse_unavailable_status(raw: &str) -> Result<StatusCode> {
    let code: u16 = raw
        .parse()
        .map_err(|_| ServiceError::InvalidConfig(format!("unavailable_status {raw:?} is not a number")))?;
    match StatusCode::from_u16(code) {
        Ok(status) if status.is_server_error() => Ok(status),
        _ => Err(ServiceError::InvalidConfig(format!(
            "unavailable_status must be a 5xx code, got {code}"
        ))),
    }
}

fn get_string_value(config: &Config, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        config
            .get_string(key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use std::collections::HashMap;
    use std::io::Write;

    fn from_toml(toml: &str) -> Result<ServiceConfig> {
        let config = Config::builder()
            .add_source(ConfigFile::from_str(toml, FileFormat::Toml))
            .build()?;
        ServiceConfig::from_config(&config)
    }

    #[test]
    fn test_defaults_when_empty() {
        assert_eq!(from_toml("").unwrap(), ServiceConfig::default());
    }

    #[test]
    fn test_file_values() {
        let cfg = from_toml(
            r#"
            bind_addr = "0.0.0.0:8080"
            model_dir = "/var/lib/churn"
            model_key = "xgbc"
            log_format = "Compact"
            unknown_keys = "reject"
            unknown_categories = "ignore"
            unavailable_status = 503
            "#,
        )
        .unwrap();

        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.model_dir, PathBuf::from("/var/lib/churn"));
        assert_eq!(cfg.model_key, "xgbc");
        assert_eq!(cfg.log_format, "compact");
        assert_eq!(cfg.unknown_keys, UnknownKeyPolicy::Reject);
        assert_eq!(cfg.unknown_categories, UnknownCategoryPolicy::Ignore);
        assert_eq!(cfg.unavailable_status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(from_toml("unavailable_status = 404").is_err());
        assert!(from_toml("unavailable_status = \"soon\"").is_err());
        assert!(from_toml("unknown_keys = \"maybe\"").is_err());
        assert!(from_toml("log_format = \"xml\"").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut cfg = from_toml("model_key = \"rfc\"").unwrap();
        cfg.apply_overrides(ConfigOverrides {
            model_key: Some("lr".to_string()),
            bind_addr: Some("127.0.0.1:9000".to_string()),
            ..ConfigOverrides::default()
        })
        .unwrap();

        assert_eq!(cfg.model_key, "lr");
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.model_dir, PathBuf::from("models"));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "model_dir = \"trained\"").unwrap();
        file.flush().unwrap();

        let cfg = ServiceConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.model_dir, PathBuf::from("trained"));
    }

    #[test]
    fn test_environment_beats_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "model_key = \"rfc\"\nlog_level = \"debug\"\nunavailable_status = 500").unwrap();
        file.flush().unwrap();

        let vars: HashMap<String, String> = [
            ("CHURN_MODEL_KEY", "xgbc"),
            ("CHURN_UNAVAILABLE_STATUS", "503"),
            ("CHURN_UNKNOWN_KEYS", "reject"),
            ("OTHER_MODEL_DIR", "/elsewhere"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let env = Environment::with_prefix(ENV_PREFIX).source(Some(vars));

        let cfg = ServiceConfig::from_sources(Some(file.path()), env).unwrap();
        assert_eq!(cfg.model_key, "xgbc");
        assert_eq!(cfg.unavailable_status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(cfg.unknown_keys, UnknownKeyPolicy::Reject);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.model_dir, PathBuf::from("models"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServiceConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
