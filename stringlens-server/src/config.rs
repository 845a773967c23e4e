// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Stringlens Server Configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpServerConfig {
    /// HTTP API listen address (e.g., "127.0.0.1:47200")
    #[serde(default = "default_http_addr")]
    pub listen_addr: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Enable CORS (allows any origin)
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,

    /// Maximum request body size in bytes. Raised to fit `limits.max_value_length`
    /// when set lower; see [`ServerConfig::body_limit`].
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding the record log
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Keep records in memory only; nothing is written to `data_dir`
    #[serde(default)]
    pub in_memory: bool,

    /// Compact the record log on startup when it is mostly dead entries
    #[serde(default = "default_compact_on_open")]
    pub compact_on_open: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Maximum characters in an analyzed value, after trimming
    #[serde(default = "default_max_value_length")]
    pub max_value_length: usize,

    /// Maximum characters in a natural language query, after trimming
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("Unknown log format '{}' (expected pretty or json)", other),
        }
    }
}

/// Where [`ServerConfig::load`] found its base configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// A path was given but does not exist; defaults were used
    Missing(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => {
                tracing::info!("Loaded configuration from file: {:?}", path)
            }
            ConfigSource::Missing(path) => {
                tracing::warn!("Config file not found: {:?}, using defaults", path)
            }
            ConfigSource::Defaults => tracing::info!("No config file given, using defaults"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,

    /// Filter directives; RUST_LOG takes precedence when set
    #[serde(default)]
    pub filter: Option<String>,
}

// Default values
fn default_http_addr() -> String {
    "127.0.0.1:47200".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_enable_cors() -> bool {
    true
}

fn default_max_body_bytes() -> usize {
    required_body_bytes(default_max_value_length())
}

/// Largest JSON encoding of one character: a `\uXXXX\uXXXX` surrogate pair
const MAX_ESCAPED_CHAR_BYTES: usize = 12;

/// Room for the braces, the field name, and whitespace
const BODY_OVERHEAD_BYTES: usize = 4 * 1024;

/// Body size needed to post a value of `max_value_length` characters, however
/// the client escapes it
fn required_body_bytes(max_value_length: usize) -> usize {
    max_value_length
        .saturating_mul(MAX_ESCAPED_CHAR_BYTES)
        .saturating_add(BODY_OVERHEAD_BYTES)
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./stringlens-data")
}

fn default_compact_on_open() -> bool {
    true
}

fn default_max_value_length() -> usize {
    10_000
}

fn default_max_query_length() -> usize {
    stringlens_query::MAX_QUERY_LENGTH
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_http_addr(),
            request_timeout_secs: default_request_timeout(),
            enable_cors: default_enable_cors(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            in_memory: false,
            compact_on_open: default_compact_on_open(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_value_length: default_max_value_length(),
            max_query_length: default_max_query_length(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with priority: env > file > defaults.
    ///
    /// Runs before tracing is installed, so the returned [`ConfigSource`] is
    /// logged by the caller once it is.
    pub fn load(config_file: Option<PathBuf>) -> Result<(Self, ConfigSource)> {
        let (config, source) = match config_file {
            Some(path) if path.exists() => (Self::from_file(&path)?, ConfigSource::File(path)),
            Some(path) => (Self::default(), ConfigSource::Missing(path)),
            None => (Self::default(), ConfigSource::Defaults),
        };

        Ok((config.apply_env(|name| std::env::var(name).ok())?, source))
    }

    /// Override fields from environment variables that are set
    ///
    /// Supported environment variables:
    /// - STRINGLENS_HTTP_ADDR: HTTP listen address (default: 127.0.0.1:47200)
    /// - STRINGLENS_REQUEST_TIMEOUT: Request timeout in seconds (default: 30)
    /// - STRINGLENS_ENABLE_CORS: Enable CORS (default: true)
    /// - STRINGLENS_DATA_DIR: Data directory path (default: ./stringlens-data)
    /// - STRINGLENS_IN_MEMORY: Do not persist records (default: false)
    /// - STRINGLENS_MAX_VALUE_LENGTH: Maximum analyzed value length (default: 10000)
    /// - STRINGLENS_MAX_QUERY_LENGTH: Maximum natural language query length (default: 500)
    /// - STRINGLENS_LOG_FORMAT: pretty or json (default: pretty)
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(addr) = lookup("STRINGLENS_HTTP_ADDR") {
            self.server.listen_addr = addr;
        }
        if let Some(timeout) = lookup("STRINGLENS_REQUEST_TIMEOUT") {
            self.server.request_timeout_secs = timeout.parse()?;
        }
        if let Some(cors) = lookup("STRINGLENS_ENABLE_CORS") {
            self.server.enable_cors = cors.parse()?;
        }
        if let Some(data_dir) = lookup("STRINGLENS_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }
        if let Some(in_memory) = lookup("STRINGLENS_IN_MEMORY") {
            self.storage.in_memory = in_memory.parse()?;
        }
        if let Some(max) = lookup("STRINGLENS_MAX_VALUE_LENGTH") {
            self.limits.max_value_length = max.parse()?;
        }
        if let Some(max) = lookup("STRINGLENS_MAX_QUERY_LENGTH") {
            self.limits.max_query_length = max.parse()?;
        }
        if let Some(format) = lookup("STRINGLENS_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }

        Ok(self)
    }

    /// Request body limit in bytes, never below what a maximum-length value needs
    pub fn body_limit(&self) -> usize {
        self.server
            .max_body_bytes
            .max(required_body_bytes(self.limits.max_value_length))
    }

    /// Parse listen address as SocketAddr
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(self.server.listen_addr.parse()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        if self.limits.max_value_length == 0 || self.limits.max_query_length == 0 {
            anyhow::bail!("Input length limits must be greater than zero");
        }

        if self.server.request_timeout_secs == 0 {
            anyhow::bail!("Request timeout must be greater than zero");
        }

        if !self.storage.in_memory && !self.storage.data_dir.exists() {
            std::fs::create_dir_all(&self.storage.data_dir)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:47200");
        assert_eq!(config.limits.max_value_length, 10_000);
        assert_eq!(config.limits.max_query_length, 500);
        assert!(!config.storage.in_memory);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_apply_env() {
        let config = ServerConfig::default()
            .apply_env(env(&[
                ("STRINGLENS_HTTP_ADDR", "0.0.0.0:8080"),
                ("STRINGLENS_IN_MEMORY", "true"),
                ("STRINGLENS_LOG_FORMAT", "JSON"),
            ]))
            .unwrap();

        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert!(config.storage.in_memory);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.server.request_timeout_secs, 30);
    }

    #[test]
    fn test_apply_env_rejects_garbage() {
        let result = ServerConfig::default().apply_env(env(&[("STRINGLENS_REQUEST_TIMEOUT", "soon")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            listen_addr = "127.0.0.1:9000"

            [limits]
            max_query_length = 200
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.limits.max_query_length, 200);
        assert_eq!(config.limits.max_value_length, 10_000);
    }

    #[test]
    fn test_body_limit_fits_escaped_max_value() {
        let config = ServerConfig::default();
        assert!(config.body_limit() >= 10_000 * 12);

        let mut config = ServerConfig::default();
        config.server.max_body_bytes = 1024;
        config.limits.max_value_length = 20_000;
        assert!(config.body_limit() >= 20_000 * 12);

        config.server.max_body_bytes = 10 * 1024 * 1024;
        assert_eq!(config.body_limit(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_load_reports_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stringlens.toml");

        let (_, source) = ServerConfig::load(Some(path.clone())).unwrap();
        assert_eq!(source, ConfigSource::Missing(path.clone()));

        std::fs::write(&path, "[limits]\nmax_query_length = 42\n").unwrap();
        let (config, source) = ServerConfig::load(Some(path.clone())).unwrap();
        assert_eq!(source, ConfigSource::File(path));
        assert_eq!(config.limits.max_query_length, 42);

        let (_, source) = ServerConfig::load(None).unwrap();
        assert_eq!(source, ConfigSource::Defaults);
    }

    #[test]
    fn test_validation() {
        let mut config = ServerConfig::default();
        config.storage.in_memory = true;
        assert!(config.validate().is_ok());

        config.server.listen_addr = "not an address".to_string();
        assert!(config.validate().is_err());
    }
}
