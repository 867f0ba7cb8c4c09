//! Top-level [`JetConfig`] and its builder.

use serde::{Deserialize, Serialize};

use crate::{CapabilitiesConfig, ConfigError, LogFormat, LoggingConfig, RuntimeConfig};

/// Complete host configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and the
/// environment.
///
/// # Example
///
/// ```
/// use jet_config::JetConfig;
///
/// let config = JetConfig::default();
/// assert_eq!(config.runtime.max_concurrent_invocations, 64);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct JetConfig {
    /// Invocation policy.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Capabilities granted to handlers.
    #[serde(default)]
    pub capabilities: CapabilitiesConfig,

    /// Host log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl JetConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use jet_config::{JetConfig, RuntimeConfig};
    ///
    /// let config = JetConfig::builder()
    ///     .runtime(RuntimeConfig {
    ///         max_concurrent_invocations: 1,
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.runtime.max_concurrent_invocations, 1);
    /// ```
    #[must_use]
    pub fn builder() -> JetConfigBuilder {
        JetConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` or `ConfigError::MissingField` if:
    /// - `runtime.max_concurrent_invocations` is zero
    /// - `runtime.invocation_timeout_ms` is zero
    /// - the fetch capability is enabled with a zero timeout
    /// - the file capability is enabled without a root
    /// - `logging.level` is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runtime.max_concurrent_invocations == 0 {
            return Err(ConfigError::invalid_value(
                "runtime.max_concurrent_invocations",
                "must be greater than 0",
            ));
        }

        if self.runtime.invocation_timeout_ms == Some(0) {
            return Err(ConfigError::invalid_value(
                "runtime.invocation_timeout_ms",
                "must be greater than 0 when set",
            ));
        }

        let fetch = &self.capabilities.fetch;
        if fetch.enabled && fetch.timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "capabilities.fetch.timeout_ms",
                "must be greater than 0",
            ));
        }

        let files = &self.capabilities.files;
        if files.enabled && files.root.is_none() {
            return Err(ConfigError::missing_field("capabilities.files.root"));
        }

        if self.logging.enabled {
            jet_telemetry::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Create a development preset: pretty debug logs, short timeout.
    #[must_use]
    pub fn development() -> Self {
        Self {
            runtime: RuntimeConfig {
                invocation_timeout_ms: Some(30_000),
                ..Default::default()
            },
            capabilities: CapabilitiesConfig::default(),
            logging: LoggingConfig {
                enabled: true,
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }

    /// Create a production preset: JSON logs, bounded invocations.
    #[must_use]
    pub fn production() -> Self {
        Self {
            runtime: RuntimeConfig {
                invocation_timeout_ms: Some(10_000),
                max_concurrent_invocations: 256,
                catch_panics: true,
            },
            capabilities: CapabilitiesConfig::default(),
            logging: LoggingConfig {
                enabled: true,
                level: "info".to_string(),
                format: LogFormat::Json,
            },
        }
    }
}

/// Builder for [`JetConfig`].
#[derive(Debug, Default)]
pub struct JetConfigBuilder {
    config: JetConfig,
}

impl JetConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the runtime section.
    #[must_use]
    pub fn runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.config.runtime = runtime;
        self
    }

    /// Set the capabilities section.
    #[must_use]
    pub fn capabilities(mut self, capabilities: CapabilitiesConfig) -> Self {
        self.config.capabilities = capabilities;
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Build the configuration without validation.
    #[must_use]
    pub fn build(self) -> JetConfig {
        self.config
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<JetConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FetchConfig, FilesConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert!(JetConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder_all_sections() {
        let config = JetConfig::builder()
            .runtime(RuntimeConfig {
                invocation_timeout_ms: Some(250),
                ..Default::default()
            })
            .capabilities(CapabilitiesConfig {
                logging: false,
                ..Default::default()
            })
            .logging(LoggingConfig {
                level: "warn".to_string(),
                ..Default::default()
            })
            .build();

        assert_eq!(config.runtime.invocation_timeout_ms, Some(250));
        assert!(!config.capabilities.logging);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = JetConfig::builder()
            .runtime(RuntimeConfig {
                max_concurrent_invocations: 0,
                ..Default::default()
            })
            .build();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_concurrent_invocations"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = JetConfig::builder()
            .runtime(RuntimeConfig {
                invocation_timeout_ms: Some(0),
                ..Default::default()
            })
            .build();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_fetch_timeout() {
        let mut config = JetConfig::default();
        config.capabilities.fetch = FetchConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.capabilities.fetch.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_files_without_root() {
        let mut config = JetConfig::default();
        config.capabilities.files = FilesConfig {
            enabled: true,
            root: None,
            allow_write: false,
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }

    #[test]
    fn test_validate_bad_log_level() {
        let config = JetConfig::builder()
            .logging(LoggingConfig {
                level: "jet=shouting".to_string(),
                ..Default::default()
            })
            .build();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_development_preset() {
        let config = JetConfig::development();
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_preset() {
        let config = JetConfig::production();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.runtime.invocation_timeout_ms, Some(10_000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_build_validated_failure() {
        let result = JetConfig::builder()
            .runtime(RuntimeConfig {
                max_concurrent_invocations: 0,
                ..Default::default()
            })
            .build_validated();
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_roundtrip_shape() {
        let toml = toml::to_string(&JetConfig::production()).unwrap();
        assert!(toml.contains("[runtime]"));
        assert!(toml.contains("[capabilities.fetch]"));
        assert!(toml.contains("[logging]"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<JetConfig, _> = toml::from_str("[server]\nport = 8080\n");
        assert!(result.is_err());
    }
}
