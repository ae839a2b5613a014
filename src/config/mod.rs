#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::model::AgingBucket;
use crate::utils::error::{ArError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_strictly_ascending,
    validate_weight, validate_weights_sum, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Everything the scoring core reads. Passed explicitly into every
/// component; there is no global configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub aging: AgingConfig,
    pub risk: RiskConfig,
    pub ranking: RankingConfig,
    pub report: ReportConfig,
    pub normalizer: NormalizerConfig,
}

/// Inclusive upper bounds (in days past due) of the three middle buckets.
/// Zero days is always `current`; anything beyond the last bound is 31+.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgingConfig {
    pub boundaries: [u32; 3],
    pub labels: BucketLabels,
}

impl Default for AgingConfig {
    fn default() -> Self {
        Self {
            boundaries: [10, 20, 30],
            labels: BucketLabels::default(),
        }
    }
}

impl AgingConfig {
    pub fn label(&self, bucket: AgingBucket) -> &str {
        self.labels.get(bucket)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketLabels {
    pub current: String,
    pub overdue_0_10: String,
    pub overdue_11_20: String,
    pub overdue_21_30: String,
    pub overdue_31_plus: String,
}

impl Default for BucketLabels {
    fn default() -> Self {
        Self {
            current: "current".to_string(),
            overdue_0_10: "0-10".to_string(),
            overdue_11_20: "11-20".to_string(),
            overdue_21_30: "21-30".to_string(),
            overdue_31_plus: "31+".to_string(),
        }
    }
}

impl BucketLabels {
    pub fn get(&self, bucket: AgingBucket) -> &str {
        match bucket {
            AgingBucket::Current => &self.current,
            AgingBucket::Overdue0To10 => &self.overdue_0_10,
            AgingBucket::Overdue11To20 => &self.overdue_11_20,
            AgingBucket::Overdue21To30 => &self.overdue_21_30,
            AgingBucket::Overdue31Plus => &self.overdue_31_plus,
        }
    }
}

/// Severity weight per bucket, applied to outstanding amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketWeights {
    pub current: f64,
    pub overdue_0_10: f64,
    pub overdue_11_20: f64,
    pub overdue_21_30: f64,
    pub overdue_31_plus: f64,
}

impl Default for BucketWeights {
    fn default() -> Self {
        Self {
            current: 0.0,
            overdue_0_10: 1.0,
            overdue_11_20: 2.0,
            overdue_21_30: 3.0,
            overdue_31_plus: 5.0,
        }
    }
}

impl BucketWeights {
    pub fn get(&self, bucket: AgingBucket) -> f64 {
        match bucket {
            AgingBucket::Current => self.current,
            AgingBucket::Overdue0To10 => self.overdue_0_10,
            AgingBucket::Overdue11To20 => self.overdue_11_20,
            AgingBucket::Overdue21To30 => self.overdue_21_30,
            AgingBucket::Overdue31Plus => self.overdue_31_plus,
        }
    }

    pub fn max(&self) -> f64 {
        AgingBucket::ALL
            .iter()
            .map(|bucket| self.get(*bucket))
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub bucket_weights: BucketWeights,
    /// w1
    pub overdue_ratio_weight: f64,
    /// w2
    pub age_severity_weight: f64,
    pub medium_threshold: f64,
    pub high_threshold: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            bucket_weights: BucketWeights::default(),
            overdue_ratio_weight: 0.6,
            age_severity_weight: 0.4,
            medium_threshold: 0.33,
            high_threshold: 0.66,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub risk_weight: f64,
    pub exposure_weight: f64,
    pub aging_weight: f64,
    pub escalation_outstanding_threshold: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            risk_weight: 0.5,
            exposure_weight: 0.3,
            aging_weight: 0.2,
            escalation_outstanding_threshold: 5000.0,
        }
    }
}

/// Default result sizes for the agent-facing tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub top_overdue_customers: usize,
    pub top_risk_customers: usize,
    pub top_priority: usize,
    /// Customers owing less than this are left out of risk profiles and the queue.
    pub min_open_balance: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_overdue_customers: 10,
            top_risk_customers: 10,
            top_priority: 10,
            min_open_balance: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Abort the whole batch on the first bad record instead of collecting it.
    pub fail_fast: bool,
    /// chrono formats tried in order.
    pub date_formats: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            date_formats: vec!["%Y-%m-%d".to_string(), "%m/%d/%Y".to_string()],
        }
    }
}

impl Validate for AgingConfig {
    fn validate(&self) -> Result<()> {
        if self.boundaries[0] < 1 {
            return Err(ArError::configuration(
                "aging.boundaries",
                "First boundary must be at least 1 day",
            ));
        }
        validate_strictly_ascending("aging.boundaries", &self.boundaries)?;

        let mut seen = HashSet::new();
        for bucket in AgingBucket::ALL {
            let label = self.labels.get(bucket);
            validate_non_empty_string(&format!("aging.labels.{}", bucket.key()), label)?;
            if !seen.insert(label) {
                return Err(ArError::configuration(
                    format!("aging.labels.{}", bucket.key()),
                    format!("Label '{}' is used by more than one bucket", label),
                ));
            }
        }
        Ok(())
    }
}

impl Validate for RiskConfig {
    fn validate(&self) -> Result<()> {
        for bucket in AgingBucket::ALL {
            validate_weight(
                &format!("risk.bucket_weights.{}", bucket.key()),
                self.bucket_weights.get(bucket),
            )?;
        }
        let escalating: Vec<f64> = AgingBucket::ALL
            .iter()
            .map(|bucket| self.bucket_weights.get(*bucket))
            .collect();
        if escalating.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(ArError::configuration(
                "risk.bucket_weights",
                "Bucket weights must not decrease with age",
            ));
        }

        validate_weight("risk.overdue_ratio_weight", self.overdue_ratio_weight)?;
        validate_weight("risk.age_severity_weight", self.age_severity_weight)?;
        validate_weights_sum(
            "risk.overdue_ratio_weight + risk.age_severity_weight",
            &[self.overdue_ratio_weight, self.age_severity_weight],
        )?;

        if !self.medium_threshold.is_finite() || self.medium_threshold <= 0.0 {
            return Err(ArError::configuration(
                "risk.medium_threshold",
                "Threshold must be a finite number > 0",
            ));
        }
        if !self.high_threshold.is_finite() {
            return Err(ArError::configuration(
                "risk.high_threshold",
                "Threshold must be finite",
            ));
        }
        validate_strictly_ascending(
            "risk.medium_threshold < risk.high_threshold",
            &[self.medium_threshold, self.high_threshold],
        )
    }
}

impl Validate for RankingConfig {
    fn validate(&self) -> Result<()> {
        validate_weight("ranking.risk_weight", self.risk_weight)?;
        validate_weight("ranking.exposure_weight", self.exposure_weight)?;
        validate_weight("ranking.aging_weight", self.aging_weight)?;
        validate_weights_sum(
            "ranking weights",
            &[self.risk_weight, self.exposure_weight, self.aging_weight],
        )?;
        validate_weight(
            "ranking.escalation_outstanding_threshold",
            self.escalation_outstanding_threshold,
        )
    }
}

impl Validate for ReportConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("report.top_overdue_customers", self.top_overdue_customers, 1)?;
        validate_positive_number("report.top_risk_customers", self.top_risk_customers, 1)?;
        validate_positive_number("report.top_priority", self.top_priority, 1)?;
        if !self.min_open_balance.is_finite() || self.min_open_balance < 0.0 {
            return Err(ArError::configuration(
                "report.min_open_balance",
                format!("Balance {} must be a finite number >= 0", self.min_open_balance),
            ));
        }
        Ok(())
    }
}

impl Validate for NormalizerConfig {
    fn validate(&self) -> Result<()> {
        if self.date_formats.is_empty() {
            return Err(ArError::configuration(
                "normalizer.date_formats",
                "At least one date format is required",
            ));
        }
        for format in &self.date_formats {
            validate_non_empty_string("normalizer.date_formats", format)?;
        }
        Ok(())
    }
}

impl Validate for EngineConfig {
    fn validate(&self) -> Result<()> {
        self.aging.validate()?;
        self.risk.validate()?;
        self.ranking.validate()?;
        self.report.validate()?;
        self.normalizer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn risk_weights_must_sum_to_one() {
        let mut config = EngineConfig::default();
        config.risk.overdue_ratio_weight = 0.7;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ArError::ConfigurationError { .. }));
    }

    #[test]
    fn thresholds_must_be_strictly_ordered() {
        let mut config = EngineConfig::default();
        config.risk.medium_threshold = 0.66;
        config.risk.high_threshold = 0.66;
        assert!(config.validate().is_err());

        config.risk.medium_threshold = 0.0;
        config.risk.high_threshold = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bucket_weights_must_escalate() {
        let mut config = EngineConfig::default();
        config.risk.bucket_weights.overdue_21_30 = 6.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("risk.bucket_weights"));
    }

    #[test]
    fn boundaries_must_ascend_from_one() {
        let mut config = EngineConfig::default();
        config.aging.boundaries = [0, 20, 30];
        assert!(config.validate().is_err());

        config.aging.boundaries = [15, 15, 30];
        assert!(config.validate().is_err());

        config.aging.boundaries = [7, 14, 45];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let mut config = EngineConfig::default();
        config.aging.labels.overdue_31_plus = "21-30".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn top_n_must_be_positive() {
        let mut config = EngineConfig::default();
        config.report.top_priority = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn min_open_balance_must_be_non_negative() {
        let mut config = EngineConfig::default();
        config.report.min_open_balance = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("report.min_open_balance"));

        config.report.min_open_balance = 250.0;
        assert!(config.validate().is_ok());
    }
}
