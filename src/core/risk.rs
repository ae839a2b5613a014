//! Explainable customer risk score.
//!
//! `score = w1 * overdue_ratio + w2 * age_severity`, where `age_severity` is
//! the bucket-weighted outstanding amount divided by total outstanding. Both
//! terms are kept on the profile so a caller can redo the arithmetic.

use crate::config::RiskConfig;
use crate::domain::model::{AgingBucket, CustomerAggregate, RiskCategory, RiskProfile, ScoreFactor};
use crate::utils::error::{ArError, Result};

pub const OVERDUE_RATIO_FACTOR: &str = "overdue_ratio";
pub const AGE_SEVERITY_FACTOR: &str = "age_severity";

pub fn categorize(score: f64, config: &RiskConfig) -> RiskCategory {
    if score >= config.high_threshold {
        RiskCategory::High
    } else if score >= config.medium_threshold {
        RiskCategory::Medium
    } else {
        RiskCategory::Low
    }
}

/// Bucket-weighted outstanding per unit of outstanding. Zero when nothing is owed.
pub fn age_severity(aggregate: &CustomerAggregate, config: &RiskConfig) -> f64 {
    let total = aggregate.total_outstanding();
    if total <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = AgingBucket::ALL
        .iter()
        .map(|bucket| config.bucket_weights.get(*bucket) * aggregate.bucket_amount(*bucket))
        .sum();
    weighted / total
}

pub fn score_customer(aggregate: &CustomerAggregate, config: &RiskConfig) -> Result<RiskProfile> {
    if aggregate.invoices().is_empty() {
        return Err(ArError::invalid_aggregate(
            aggregate.customer_id(),
            "customer has no invoices",
        ));
    }

    let factors = vec![
        ScoreFactor::new(
            OVERDUE_RATIO_FACTOR,
            config.overdue_ratio_weight,
            aggregate.overdue_ratio(),
        ),
        ScoreFactor::new(
            AGE_SEVERITY_FACTOR,
            config.age_severity_weight,
            age_severity(aggregate, config),
        ),
    ];
    let score: f64 = factors.iter().map(|f| f.contribution).sum();

    tracing::debug!(
        customer_id = aggregate.customer_id(),
        score,
        "scored customer"
    );

    Ok(RiskProfile {
        customer_id: aggregate.customer_id().to_string(),
        customer_name: aggregate.customer_name().to_string(),
        score,
        category: categorize(score, config),
        contributing_factors: factors,
        exposure: aggregate.exposure(),
    })
}

/// Highest score first, customer id breaking ties.
pub fn sort_by_risk(profiles: &mut [RiskProfile]) {
    profiles.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgingConfig;
    use crate::domain::model::Invoice;
    use chrono::NaiveDate;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn invoice(id: &str, unpaid: f64, days_overdue: i64) -> Invoice {
        Invoice {
            id: id.to_string(),
            invoice_number: None,
            customer_id: "C1".to_string(),
            customer_name: "Acme".to_string(),
            amount_total: 1000.0,
            amount_unpaid: unpaid,
            due_date: as_of() - chrono::Duration::days(days_overdue),
            transaction_date: as_of() - chrono::Duration::days(days_overdue + 30),
        }
    }

    fn aggregate(invoices: Vec<Invoice>) -> CustomerAggregate {
        CustomerAggregate::from_invoices("C1", invoices, as_of(), &AgingConfig::default()).unwrap()
    }

    #[test]
    fn single_invoice_forty_five_days_overdue_is_high() {
        let profile =
            score_customer(&aggregate(vec![invoice("1", 1000.0, 45)]), &RiskConfig::default())
                .unwrap();

        assert_eq!(profile.factor(OVERDUE_RATIO_FACTOR).unwrap().value, 1.0);
        assert_eq!(profile.factor(AGE_SEVERITY_FACTOR).unwrap().value, 5.0);
        assert!((profile.score - 2.6).abs() < 1e-12);
        assert_eq!(profile.category, RiskCategory::High);
        assert_eq!(profile.exposure.overdue_invoices, 1);
        assert_eq!(profile.exposure.max_days_past_due, 45);
        assert_eq!(profile.exposure.overdue_outstanding, 1000.0);
    }

    #[test]
    fn nothing_outstanding_scores_zero_and_low() {
        let profile =
            score_customer(&aggregate(vec![invoice("1", 0.0, 20)]), &RiskConfig::default())
                .unwrap();
        assert_eq!(profile.score, 0.0);
        assert_eq!(profile.category, RiskCategory::Low);
    }

    #[test]
    fn factors_reconstruct_score() {
        let profile = score_customer(
            &aggregate(vec![
                invoice("1", 120.0, 3),
                invoice("2", 380.0, -10),
                invoice("3", 75.25, 22),
            ]),
            &RiskConfig::default(),
        )
        .unwrap();
        assert!((profile.reconstructed_score() - profile.score).abs() < 1e-12);
        assert_eq!(profile.contributing_factors.len(), 2);
    }

    #[test]
    fn mixed_balance_is_medium() {
        // half current, half 1-10 days: 0.6 * 0.5 + 0.4 * 0.5 = 0.5
        let profile = score_customer(
            &aggregate(vec![invoice("1", 500.0, 4), invoice("2", 500.0, -4)]),
            &RiskConfig::default(),
        )
        .unwrap();
        assert!((profile.score - 0.5).abs() < 1e-12);
        assert_eq!(profile.category, RiskCategory::Medium);
    }

    #[test]
    fn empty_aggregate_is_rejected() {
        let err = score_customer(&aggregate(vec![]), &RiskConfig::default()).unwrap_err();
        assert!(matches!(err, ArError::InvalidAggregateError { .. }));
    }

    #[test]
    fn categories_follow_thresholds() {
        let config = RiskConfig::default();
        assert_eq!(categorize(0.0, &config), RiskCategory::Low);
        assert_eq!(categorize(0.3299, &config), RiskCategory::Low);
        assert_eq!(categorize(0.33, &config), RiskCategory::Medium);
        assert_eq!(categorize(0.66, &config), RiskCategory::High);
    }
}
