use crate::config::EngineConfig;
use crate::utils::error::{ArError, Result};
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest page the SuiteQL REST endpoint accepts.
pub const SUITEQL_MAX_PAGE: usize = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub source: Option<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// JSON file holding an array of rows, or `{ "items": [...] }`.
    File { path: String },
    /// Pre-authenticated SuiteQL REST endpoint.
    Suiteql(SuiteQlConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteQlConfig {
    pub endpoint: String,
    pub access_token: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_page_size() -> usize {
    SUITEQL_MAX_PAGE
}

fn default_lookback_days() -> u32 {
    365
}

fn default_max_rows() -> usize {
    5000
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ArError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| {
            ArError::configuration("toml_parsing", format!("TOML parsing error: {}", e))
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ArError::configuration("toml_parsing", e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for SuiteQlConfig {
    fn validate(&self) -> Result<()> {
        validate_url("source.endpoint", &self.endpoint)?;
        if self.access_token.trim().is_empty() || self.access_token.starts_with("${") {
            return Err(ArError::configuration(
                "source.access_token",
                "A pre-issued access token is required",
            ));
        }
        validate_range("source.page_size", self.page_size, 1, SUITEQL_MAX_PAGE)?;
        validate_positive_number("source.max_rows", self.max_rows, 1)?;
        if self.timeout_seconds == 0 {
            return Err(ArError::configuration(
                "source.timeout_seconds",
                "Timeout must be at least one second",
            ));
        }
        Ok(())
    }
}

impl Validate for SourceConfig {
    fn validate(&self) -> Result<()> {
        match self {
            SourceConfig::File { path } => validate_path("source.path", path),
            SourceConfig::Suiteql(config) => config.validate(),
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        if let Some(source) = &self.source {
            source.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_engine_overrides() {
        let toml_content = r#"
[engine.aging]
boundaries = [7, 14, 30]

[engine.risk]
overdue_ratio_weight = 0.5
age_severity_weight = 0.5
high_threshold = 0.8

[engine.ranking]
escalation_outstanding_threshold = 2500.0

[engine.report]
top_priority = 25
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.engine.aging.boundaries, [7, 14, 30]);
        assert_eq!(config.engine.aging.labels.overdue_31_plus, "31+");
        assert_eq!(config.engine.risk.overdue_ratio_weight, 0.5);
        assert_eq!(config.engine.risk.medium_threshold, 0.33);
        assert_eq!(config.engine.ranking.escalation_outstanding_threshold, 2500.0);
        assert_eq!(config.engine.report.top_priority, 25);
        assert!(config.source.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("AR_INTEL_TEST_TOKEN", "token-abc");

        let toml_content = r#"
[source]
type = "suiteql"
endpoint = "https://1234.suitetalk.api.netsuite.com/services/rest/query/v1/suiteql"
access_token = "${AR_INTEL_TEST_TOKEN}"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        match config.source {
            Some(SourceConfig::Suiteql(suiteql)) => {
                assert_eq!(suiteql.access_token, "token-abc");
                assert_eq!(suiteql.page_size, SUITEQL_MAX_PAGE);
                assert_eq!(suiteql.lookback_days, 365);
            }
            other => panic!("unexpected source: {:?}", other),
        }

        std::env::remove_var("AR_INTEL_TEST_TOKEN");
    }

    #[test]
    fn test_unresolved_token_fails_validation() {
        let toml_content = r#"
[source]
type = "suiteql"
endpoint = "https://example.com/suiteql"
access_token = "${AR_INTEL_DEFINITELY_UNSET}"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_weights_fail_validation() {
        let toml_content = r#"
[engine.risk]
overdue_ratio_weight = 0.9
age_severity_weight = 0.4
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ArError::ConfigurationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[source]
type = "file"
path = "invoices.json"

[engine.normalizer]
fail_fast = true
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert!(config.engine.normalizer.fail_fast);
        assert!(matches!(config.source, Some(SourceConfig::File { .. })));
    }
}
