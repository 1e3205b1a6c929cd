//! Configuration manager for roster.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
const DEFAULT_NAME: &str = "roster";
const DEFAULT_PORT: u16 = 8080;
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Instance name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Listening port.
    #[serde(default = "default_port", skip_serializing)]
    pub port: u16,
    #[serde(default)]
    pub version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to PostgreSQL configuration.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
    /// Related to Argon2 configuration.
    #[serde(skip_serializing)]
    pub argon2: Option<Argon2>,
    /// Related to traces, logs and metrics export.
    #[serde(default, skip_serializing)]
    pub telemetry: Telemetry,
}

fn default_name() -> String {
    DEFAULT_NAME.to_owned()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: default_name(),
            port: DEFAULT_PORT,
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            postgres: None,
            argon2: None,
            telemetry: Telemetry::default(),
        }
    }
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// Argon2 configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Argon2 {
    /// Memory used while hashing, in KiB.
    pub memory_cost: u32,
    /// Iterations of hash.
    pub iterations: u32,
    /// Parallelism degree.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: usize,
}

impl Default for Argon2 {
    fn default() -> Self {
        Self {
            memory_cost: 1024 * 64, // 64 MiB.
            iterations: 4,
            parallelism: 2,
            hash_length: 32,
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Telemetry {
    /// OTLP gRPC collector, e.g. `http://localhost:4317`.
    /// Traces and logs are only exported when set.
    pub otlp_endpoint: Option<String>,
    /// Expose Prometheus metrics on `/metrics`.
    #[serde(default = "enabled")]
    pub metrics: bool,
}

fn enabled() -> bool {
    true
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            metrics: true,
        }
    }
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Reads the configuration file from, in order, the path set with
    /// [`Configuration::path`], the `CONFIG_PATH` variable or `config.yaml`.
    pub fn read(self) -> Arc<Self> {
        let file_path = if self.path.is_file() {
            self.path.clone()
        } else if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            PathBuf::from(path)
        } else {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        let config = match File::open(&file_path) {
            Ok(file) => match serde_yaml::from_reader::<_, Configuration>(file) {
                Ok(config) => Self {
                    version: VERSION.to_owned(),
                    path: file_path,
                    ..config
                },
                Err(err) => self.error(err),
            },
            Err(err) => self.error(err),
        };

        Arc::new(config)
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "configuration file cannot be read, using defaults");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let yaml = r#"
name: directory
port: 9000
postgres:
  address: db:5432
  database: people
  pool_size: 4
argon2:
  memory_cost: 1024
  iterations: 1
  parallelism: 1
  hash_length: 32
telemetry:
  otlp_endpoint: http://collector:4317
  metrics: false
"#;
        let config: Configuration = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.name, "directory");
        assert_eq!(config.port, 9000);
        let postgres = config.postgres.unwrap();
        assert_eq!(postgres.address, "db:5432");
        assert_eq!(postgres.database.as_deref(), Some("people"));
        assert_eq!(postgres.username, None);
        assert_eq!(postgres.pool_size, Some(4));
        assert_eq!(config.argon2.unwrap().memory_cost, 1024);
        assert_eq!(
            config.telemetry.otlp_endpoint.as_deref(),
            Some("http://collector:4317")
        );
        assert!(!config.telemetry.metrics);
    }

    #[test]
    fn test_defaults_on_sparse_file() {
        let config: Configuration = serde_yaml::from_str("postgres:\n  address: localhost\n").unwrap();

        assert_eq!(config.name, DEFAULT_NAME);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.argon2.is_none());
        assert!(config.telemetry.metrics);
        assert!(config.telemetry.otlp_endpoint.is_none());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Configuration::default()
            .path(PathBuf::from("does/not/exist.yaml"))
            .read();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.version, VERSION);
    }
}
