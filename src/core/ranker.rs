//! Collections priority queue.

use crate::config::{RankingConfig, RiskConfig};
use crate::core::risk::{AGE_SEVERITY_FACTOR, OVERDUE_RATIO_FACTOR};
use crate::domain::model::{PriorityEntry, RecommendedAction, RiskCategory, RiskProfile, ScoreFactor};
use crate::utils::error::{ArError, Result};
use std::cmp::Ordering;
use std::collections::HashSet;

pub const RISK_FACTOR: &str = "risk_score";
pub const EXPOSURE_FACTOR: &str = "exposure";
pub const AGING_FACTOR: &str = "aging";

/// A scored customer and the balance it still owes.
#[derive(Debug, Clone, PartialEq)]
pub struct RankCandidate {
    pub profile: RiskProfile,
    pub outstanding: f64,
}

/// Total over category x has-overdue x above-threshold.
pub fn recommend_action(
    category: RiskCategory,
    has_overdue_balance: bool,
    outstanding: f64,
    config: &RankingConfig,
) -> RecommendedAction {
    let above_threshold = outstanding > config.escalation_outstanding_threshold;
    match (category, has_overdue_balance, above_threshold) {
        (RiskCategory::High, _, true) => RecommendedAction::Escalate,
        (RiskCategory::High | RiskCategory::Medium, true, _) => RecommendedAction::ContactToday,
        (RiskCategory::High | RiskCategory::Medium, false, _) => RecommendedAction::Monitor,
        (RiskCategory::Low, _, _) => RecommendedAction::NoAction,
    }
}

fn factor_value(profile: &RiskProfile, name: &str) -> f64 {
    profile.factor(name).map(|f| f.value).unwrap_or(0.0)
}

/// Log-scaled share of the largest balance in the batch, in [0, 1].
fn exposure(outstanding: f64, max_outstanding: f64) -> f64 {
    if max_outstanding <= 0.0 {
        return 0.0;
    }
    ((outstanding.max(0.0) + 1.0).log10() / (max_outstanding + 1.0).log10()).min(1.0)
}

/// priority desc, then outstanding desc, then customer id asc.
pub fn priority_order(a: &PriorityEntry, b: &PriorityEntry) -> Ordering {
    b.priority_score
        .total_cmp(&a.priority_score)
        .then_with(|| b.outstanding.total_cmp(&a.outstanding))
        .then_with(|| a.customer_id.cmp(&b.customer_id))
}

pub fn rank(
    candidates: &[RankCandidate],
    ranking: &RankingConfig,
    risk: &RiskConfig,
) -> Result<Vec<PriorityEntry>> {
    let mut seen = HashSet::new();
    for candidate in candidates {
        if !seen.insert(candidate.profile.customer_id.as_str()) {
            return Err(ArError::invalid_aggregate(
                &candidate.profile.customer_id,
                "customer appears more than once in the ranking input",
            ));
        }
        if !candidate.outstanding.is_finite() || candidate.outstanding < 0.0 {
            return Err(ArError::invalid_aggregate(
                &candidate.profile.customer_id,
                format!("outstanding amount {} is not a valid balance", candidate.outstanding),
            ));
        }
    }

    let max_outstanding = candidates
        .iter()
        .map(|c| c.outstanding)
        .fold(0.0, f64::max);
    let max_bucket_weight = risk.bucket_weights.max();

    let mut entries: Vec<PriorityEntry> = candidates
        .iter()
        .map(|candidate| {
            let profile = &candidate.profile;
            let aging = if max_bucket_weight > 0.0 {
                factor_value(profile, AGE_SEVERITY_FACTOR) / max_bucket_weight
            } else {
                0.0
            };
            let factors = vec![
                ScoreFactor::new(RISK_FACTOR, ranking.risk_weight, profile.score),
                ScoreFactor::new(
                    EXPOSURE_FACTOR,
                    ranking.exposure_weight,
                    exposure(candidate.outstanding, max_outstanding),
                ),
                ScoreFactor::new(AGING_FACTOR, ranking.aging_weight, aging),
            ];
            let priority_score: f64 = factors.iter().map(|f| f.contribution).sum();
            let has_overdue_balance = factor_value(profile, OVERDUE_RATIO_FACTOR) > 0.0;

            PriorityEntry {
                rank: 0,
                customer_id: profile.customer_id.clone(),
                customer_name: profile.customer_name.clone(),
                priority_score,
                recommended_action: recommend_action(
                    profile.category,
                    has_overdue_balance,
                    candidate.outstanding,
                    ranking,
                ),
                outstanding: candidate.outstanding,
                overdue_outstanding: profile.exposure.overdue_outstanding,
                max_days_past_due: profile.exposure.max_days_past_due,
                priority_factors: factors,
                risk: profile.clone(),
            }
        })
        .collect();

    entries.sort_by(priority_order);
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index + 1;
    }

    Ok(entries)
}
