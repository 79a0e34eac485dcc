//! Configuration validation.

use std::collections::HashSet;

use fanout_protocols::MatchPattern;
use fanout_protocols::platform::is_builtin;

use crate::error::ConfigError;
use crate::schema::Config;

/// Backstop timeouts above this are reported as a warning.
const LONG_TIMEOUT_SECS: u64 = 300;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_browser(config, &mut result);
        Self::validate_coordinator(config, &mut result);
        Self::validate_platforms(config, &mut result);

        Ok(result)
    }

    /// Validate and turn the first error into a [`ConfigError`].
    pub fn ensure_valid(config: &Config) -> Result<ValidationResult, ConfigError> {
        let result = Self::validate(config)?;
        if let Some(error) = result.errors.first() {
            return Err(ConfigError::InvalidValue {
                field: error.path.clone(),
                message: error.message.clone(),
            });
        }
        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        if config.browser.endpoint.is_none() && config.browser.debug_port == 0 {
            result.add_error(ValidationError::new(
                "browser.debug_port",
                "debug_port cannot be 0",
            ));
        }

        if let Some(ref endpoint) = config.browser.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                result.add_error(ValidationError::new(
                    "browser.endpoint",
                    "endpoint must start with http:// or https://",
                ));
            }
        }

        if !config.browser.scripts_dir.exists() {
            result.add_warning(ValidationWarning::new(
                "browser.scripts_dir",
                format!(
                    "Scripts directory does not exist: {:?}",
                    config.browser.scripts_dir
                ),
            ));
        }
    }

    fn validate_coordinator(config: &Config, result: &mut ValidationResult) {
        let coordinator = &config.coordinator;

        if coordinator.query_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "coordinator.query_timeout_secs",
                "query_timeout_secs must be greater than 0",
            ));
        } else if coordinator.query_timeout() <= coordinator.result_delay() {
            result.add_warning(ValidationWarning::new(
                "coordinator.query_timeout_secs",
                "query timeout is not longer than result_delay_ms, results may be reported as timeouts",
            ));
        }

        if coordinator.query_timeout_secs > LONG_TIMEOUT_SECS {
            result.add_warning(ValidationWarning::new(
                "coordinator.query_timeout_secs",
                format!(
                    "query_timeout_secs is very high (>{}), a stuck query delays tab restoration",
                    LONG_TIMEOUT_SECS
                ),
            ));
        }

        if coordinator.event_capacity == 0 {
            result.add_error(ValidationError::new(
                "coordinator.event_capacity",
                "event_capacity must be greater than 0",
            ));
        }
    }

    fn validate_platforms(config: &Config, result: &mut ValidationResult) {
        let mut known = HashSet::new();

        for (index, custom) in config.platforms.custom.iter().enumerate() {
            let path = format!("platforms.custom[{}]", index);

            if custom.id.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.id", path),
                    "Platform id cannot be empty",
                ));
            } else if !known.insert(custom.id.as_str()) {
                result.add_error(ValidationError::new(
                    format!("{}.id", path),
                    format!("Platform '{}' is defined more than once", custom.id),
                ));
            }

            if let Err(e) = MatchPattern::parse(&custom.url_pattern) {
                result.add_error(ValidationError::new(
                    format!("{}.url_pattern", path),
                    e.to_string(),
                ));
            }
        }

        if config.platforms.enabled.is_empty() {
            result.add_error(ValidationError::new(
                "platforms.enabled",
                "At least one platform must be enabled",
            ));
        }

        for id in &config.platforms.enabled {
            if !is_builtin(id) && !known.contains(id.as_str()) {
                result.add_warning(ValidationWarning::new(
                    "platforms.enabled",
                    format!("Unknown platform '{}' will be skipped", id),
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
