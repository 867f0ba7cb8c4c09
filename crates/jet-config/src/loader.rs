//! Layered configuration loading.
//!
//! Layers apply in order, later ones overriding earlier ones:
//! 1. Built-in defaults (or a preset)
//! 2. A TOML or JSON file
//! 3. Environment variables, optionally seeded from a `.env` file

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, JetConfig, LogFormat};

/// Environment prefix used by the `jet` binary.
pub const DEFAULT_ENV_PREFIX: &str = "JET";

/// Configuration loader.
///
/// # Example
///
/// ```no_run
/// use jet_config::ConfigLoader;
///
/// # fn main() -> Result<(), jet_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("jet.toml")?
///     .with_env_prefix("JET")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: JetConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader starting from [`JetConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: JetConfig::default(),
            env_prefix: None,
        }
    }

    /// Reset to default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = JetConfig::default();
        self
    }

    /// Start from the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use jet_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = JetConfig::development();
        self
    }

    /// Start from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = JetConfig::production();
        self
    }

    /// Merge a `.toml` or `.json` file over the current values.
    ///
    /// Keys the file leaves out keep their current value, so a partial file
    /// refines a preset instead of replacing it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed,
    /// contains unknown fields or has an unsupported extension.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .filter(|e| e == "toml" || e == "json")
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.merge(&content, &format)?;
        Ok(self)
    }

    /// Load a file if it exists, otherwise keep the current values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merge a string in the given format (`toml` or `json`) over the
    /// current values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use jet_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[runtime]\ninvocation_timeout_ms = 500\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.runtime.invocation_timeout_ms, Some(500));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.merge(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Read overrides from `PREFIX__SECTION__KEY` environment variables,
    /// e.g. `JET__RUNTIME__MAX_CONCURRENT_INVOCATIONS=8`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the current directory into the process
    /// environment. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply environment overrides, validate and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(mut self) -> Result<JetConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> JetConfig {
        self.config
    }

    fn merge(&mut self, content: &str, format: &str) -> Result<(), ConfigError> {
        self.config = match format {
            "toml" => {
                let mut merged = toml::Value::try_from(&self.config)?;
                let overlay = toml::Value::Table(toml::from_str::<toml::Table>(content)?);
                merge_toml(&mut merged, overlay);
                merged.try_into()?
            }
            "json" => {
                let mut merged = serde_json::to_value(&self.config)?;
                let overlay = serde_json::from_str::<serde_json::Value>(content)?;
                merge_json(&mut merged, overlay);
                serde_json::from_value(merged)?
            }
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        Ok(())
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with(&marker))
            .collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let path = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = path.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["RUNTIME", "INVOCATION_TIMEOUT_MS"] => {
                config.runtime.invocation_timeout_ms =
                    if value.is_empty() || value.eq_ignore_ascii_case("none") {
                        None
                    } else {
                        Some(value.parse().map_err(|_| {
                            ConfigError::env_parse_error(key, "expected integer or 'none'")
                        })?)
                    };
            }
            ["RUNTIME", "MAX_CONCURRENT_INVOCATIONS"] => {
                config.runtime.max_concurrent_invocations = parse_int(key, value)?;
            }
            ["RUNTIME", "CATCH_PANICS"] => {
                config.runtime.catch_panics = parse_flag(key, value)?;
            }

            ["CAPABILITIES", "LOGGING"] => {
                config.capabilities.logging = parse_flag(key, value)?;
            }
            ["CAPABILITIES", "FETCH", "ENABLED"] => {
                config.capabilities.fetch.enabled = parse_flag(key, value)?;
            }
            ["CAPABILITIES", "FETCH", "TIMEOUT_MS"] => {
                config.capabilities.fetch.timeout_ms = parse_int(key, value)?;
            }
            ["CAPABILITIES", "FETCH", "USER_AGENT"] => {
                config.capabilities.fetch.user_agent = value.to_string();
            }
            ["CAPABILITIES", "FILES", "ENABLED"] => {
                config.capabilities.files.enabled = parse_flag(key, value)?;
            }
            ["CAPABILITIES", "FILES", "ROOT"] => {
                config.capabilities.files.root = if value.is_empty() {
                    None
                } else {
                    Some(value.into())
                };
            }
            ["CAPABILITIES", "FILES", "ALLOW_WRITE"] => {
                config.capabilities.files.allow_write = parse_flag(key, value)?;
            }

            ["LOGGING", "ENABLED"] => {
                config.logging.enabled = parse_flag(key, value)?;
            }
            ["LOGGING", "LEVEL"] => {
                config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }

            // Unrecognized keys are left for other consumers of the prefix.
            _ => {}
        }

        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_int<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

/// Overlay `overlay` onto `base`, recursing into tables.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Overlay `overlay` onto `base`, recursing into objects.
fn merge_json(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
