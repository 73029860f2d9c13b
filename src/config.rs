//! Configuration management for the `rsa-jwks` binary.
//!
//! Settings come from built-in defaults, an optional `config.{yaml,toml,json}`
//! file and `RSA_JWKS_`-prefixed environment variables, in increasing order
//! of precedence. The library types never read configuration themselves.

use std::path::PathBuf;

use serde::Deserialize;

use crate::jwks::DEFAULT_JWKS_PATH;
use crate::key::KeyConfigBuilder;

pub const ENV_PREFIX: &str = "RSA_JWKS";

/// Application configuration settings.
#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    /// Address the server binds to.
    pub host: String,
    /// Port number the server will listen on.
    pub port: u16,
    /// Route the key set is served on.
    pub jwks_path: String,
    #[serde(default)]
    pub key: KeySettings,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Signing key source. Set exactly one of `bits` or `private_key_path`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct KeySettings {
    /// Key id published as `kid`.
    pub kid: Option<String>,
    /// Generate a new key of this many bits.
    pub bits: Option<usize>,
    /// Import the PEM private key at this path.
    pub private_key_path: Option<PathBuf>,
}

impl KeySettings {
    /// Maps the settings onto a builder. Conflicting or missing choices are
    /// left for [`KeyConfigBuilder::build`] to report.
    pub fn to_builder(&self) -> KeyConfigBuilder {
        let mut builder = KeyConfigBuilder::new();
        if let Some(bits) = self.bits {
            builder = builder.generate_key(bits);
        }
        if let Some(path) = &self.private_key_path {
            builder = builder.import_key(path.clone());
        }
        if let Some(kid) = &self.kid {
            builder = builder.key_id(kid.clone());
        }
        builder
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LoggingFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Logging and trace export settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Level for this crate and everything not listed below.
    pub level: LogLevel,
    /// Level for axum's own events.
    pub axum_level: LogLevel,
    pub format: LoggingFormat,
    /// Export spans over OTLP/gRPC. The endpoint is taken from the standard
    /// `OTEL_EXPORTER_OTLP_*` variables.
    pub otlp_enabled: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            axum_level: LogLevel::Warn,
            format: LoggingFormat::default(),
            otlp_enabled: false,
            service_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

/// Loads configuration, looking for an optional file named `name` with any
/// extension the `config` crate understands.
#[tracing::instrument]
pub fn load_config(name: &str) -> Result<Settings, config::ConfigError> {
    let cfg = config::Config::builder()
        .set_default("host", "127.0.0.1")?
        .set_default("port", 8080)?
        .set_default("jwks_path", DEFAULT_JWKS_PATH)?
        .add_source(config::File::with_name(name).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .inspect_err(|e| tracing::error!("Failed to build configuration: {}", e))?;

    cfg.try_deserialize::<Settings>()
        .inspect_err(|e| tracing::error!("Failed to deserialize configuration: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::env;

    const MISSING_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/test/no-such-config");

    #[test]
    fn test_defaults_without_file() {
        let settings = load_config(MISSING_FILE).unwrap();

        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.jwks_path, DEFAULT_JWKS_PATH);
        assert_eq!(settings.telemetry.format, LoggingFormat::Pretty);
        assert!(!settings.telemetry.otlp_enabled);
    }

    #[test]
    fn test_load_config_env_override() {
        // Set an environment variable that should override the defaults
        unsafe {
            env::set_var("RSA_JWKS_PORT", "9999");
            env::set_var("RSA_JWKS_TELEMETRY__SERVICE_NAME", "env-service");
        }

        let settings = load_config(MISSING_FILE);

        // Clean up
        unsafe {
            env::remove_var("RSA_JWKS_PORT");
            env::remove_var("RSA_JWKS_TELEMETRY__SERVICE_NAME");
        }

        let settings = settings.unwrap();
        assert_eq!(settings.port, 9999);
        assert_eq!(settings.telemetry.service_name, "env-service");
    }

    #[test]
    fn test_file_settings_build_key_config() {
        let settings =
            load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/test/settings")).unwrap();

        assert_eq!(settings.key.kid.as_deref(), Some("file-key"));
        assert_eq!(settings.telemetry.format, LoggingFormat::Json);
        assert_eq!(settings.telemetry.level, LogLevel::Debug);

        // the fixture path is relative to the crate root
        let mut key = settings.key.clone();
        key.private_key_path = key
            .private_key_path
            .map(|p| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(p));
        let config = key.to_builder().build().unwrap();
        assert_eq!(config.key().key_id(), "file-key");
    }

    #[test]
    fn test_conflicting_key_settings() {
        let key = KeySettings {
            kid: Some("k".to_string()),
            bits: Some(2048),
            private_key_path: Some(PathBuf::from("test/private_key.pem")),
        };
        let err = key.to_builder().build().unwrap_err();
        assert!(matches!(err, ConfigError::BothSourcesSelected));

        let err = KeySettings::default().to_builder().build().unwrap_err();
        assert!(matches!(err, ConfigError::NoSourceSelected));
    }
}
