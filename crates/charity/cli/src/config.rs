//! Configuration for charityctl

use serde::{Deserialize, Serialize};

use crate::error::CliResult;

/// Main charityctl configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Factory configuration
    #[serde(default)]
    pub factory: FactoryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scripted simulation configuration
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Factory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Administrator address, as a label or 0x-prefixed hex
    #[serde(default = "default_admin")]
    pub admin: String,

    /// Template version stamped on new pools
    #[serde(default = "default_template_version")]
    pub template_version: u32,

    /// Template label
    #[serde(default = "default_template_label")]
    pub template_label: String,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            template_version: default_template_version(),
            template_label: default_template_label(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Scripted simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Donation asset for pools whose script step names none
    #[serde(default = "default_asset")]
    pub asset: String,

    /// Fixed clock origin in milliseconds since the epoch
    #[serde(default = "default_clock_start")]
    pub clock_start_ms: i64,

    /// Clock advance per reading, in milliseconds
    #[serde(default = "default_clock_step")]
    pub clock_step_ms: i64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            asset: default_asset(),
            clock_start_ms: default_clock_start(),
            clock_step_ms: default_clock_step(),
        }
    }
}

// Default value helpers
fn default_admin() -> String {
    "admin".to_string()
}

fn default_template_version() -> u32 {
    1
}

fn default_template_label() -> String {
    "charity-pool".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_asset() -> String {
    "USDC".to_string()
}

fn default_clock_start() -> i64 {
    // 2024-01-01T00:00:00Z
    1_704_067_200_000
}

fn default_clock_step() -> i64 {
    1_000
}

impl CliConfig {
    /// Load configuration from defaults, an optional file and
    /// `CHARITY_`-prefixed environment variables, in that order.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `CHARITY_SIMULATION__CLOCK_STEP_MS=500`.
    pub fn load(path: Option<&str>) -> CliResult<Self> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&CliConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CHARITY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.factory.admin, "admin");
        assert_eq!(config.factory.template_version, 1);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.simulation.asset, "USDC");
        assert_eq!(config.simulation.clock_step_ms, 1_000);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = CliConfig::load(None).unwrap();
        assert_eq!(config.factory.template_label, "charity-pool");
        assert_eq!(config.simulation.clock_start_ms, 1_704_067_200_000);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[factory]\ntemplate_version = 7\n\n[simulation]\nasset = \"EURC\"\nclock_step_ms = 5"
        )
        .unwrap();

        let config = CliConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.factory.template_version, 7);
        assert_eq!(config.factory.admin, "admin");
        assert_eq!(config.simulation.asset, "EURC");
        assert_eq!(config.simulation.clock_step_ms, 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[factory]\ntemplate_version = \"not a number\"").unwrap();

        let err = CliConfig::load(file.path().to_str()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(err.code(), "Config");
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let config = CliConfig::load(Some("/nonexistent/charityctl.toml")).unwrap();
        assert_eq!(config.factory.template_version, 1);
    }
}
