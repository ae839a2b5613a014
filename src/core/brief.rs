//! Composition of normalizer, classifier, scorer and ranker into the
//! agent-facing reports. Nothing here computes beyond selection and
//! truncation.

use crate::config::EngineConfig;
use crate::core::aging::{aggregate_by_customer, aging_summary};
use crate::core::normalizer::normalize_batch;
use crate::core::ranker::{rank, RankCandidate};
use crate::core::risk::{score_customer, sort_by_risk};
use crate::domain::model::{
    AgingSummary, ArBrief, CustomerAggregate, Invoice, PriorityEntry, RawInvoice,
    RecommendedAction, RejectedRecord, RiskProfile,
};
use crate::utils::error::{ArError, Result};
use crate::utils::validation::Validate;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// Full, untruncated result of one pass over a fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub as_of: NaiveDate,
    pub invoices: Vec<Invoice>,
    pub aggregates: Vec<CustomerAggregate>,
    /// Highest risk first.
    pub profiles: Vec<RiskProfile>,
    /// Complete priority ordering.
    pub queue: Vec<PriorityEntry>,
    pub rejected: Vec<RejectedRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    pub as_of: NaiveDate,
    pub customers: Vec<RiskProfile>,
    pub rejected: Vec<RejectedRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityReport {
    pub as_of: NaiveDate,
    pub queue: Vec<PriorityEntry>,
    pub rejected: Vec<RejectedRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgingReport {
    #[serde(flatten)]
    pub summary: AgingSummary,
    pub rejected: Vec<RejectedRecord>,
}

/// Scores every aggregate, dropping customers without invoices instead of
/// reporting them as zero risk.
pub fn score_customers(
    aggregates: &[CustomerAggregate],
    config: &EngineConfig,
) -> Result<Vec<RiskProfile>> {
    let mut profiles = Vec::with_capacity(aggregates.len());
    for aggregate in aggregates {
        match score_customer(aggregate, &config.risk) {
            Ok(profile) => profiles.push(profile),
            Err(ArError::InvalidAggregateError { customer_id, message })
                if aggregate.invoices().is_empty() =>
            {
                tracing::debug!("Skipping customer {}: {}", customer_id, message);
            }
            Err(err) => return Err(err),
        }
    }
    sort_by_risk(&mut profiles);
    Ok(profiles)
}

/// Ranks scored customers using the outstanding balance of their aggregate.
pub fn prioritize(
    aggregates: &[CustomerAggregate],
    profiles: &[RiskProfile],
    config: &EngineConfig,
) -> Result<Vec<PriorityEntry>> {
    let outstanding_by_customer: HashMap<&str, f64> = aggregates
        .iter()
        .map(|agg| (agg.customer_id(), agg.total_outstanding()))
        .collect();

    let candidates = profiles
        .iter()
        .map(|profile| -> Result<RankCandidate> {
            let outstanding = outstanding_by_customer
                .get(profile.customer_id.as_str())
                .copied()
                .ok_or_else(|| {
                    ArError::invalid_aggregate(
                        &profile.customer_id,
                        "no aggregate matches this risk profile",
                    )
                })?;
            Ok(RankCandidate {
                profile: profile.clone(),
                outstanding,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    rank(&candidates, &config.ranking, &config.risk)
}

/// Validates the configuration, then runs every stage over the raw rows.
pub fn analyze(records: &[RawInvoice], as_of: NaiveDate, config: &EngineConfig) -> Result<Analysis> {
    config.validate()?;

    let batch = normalize_batch(records, &config.normalizer)?;
    let aggregates = aggregate_by_customer(&batch.invoices, as_of, &config.aging)?;
    let mut profiles = score_customers(&aggregates, config)?;
    let min_open_balance = config.report.min_open_balance;
    profiles.retain(|profile| profile.exposure.total_outstanding >= min_open_balance);
    let queue = prioritize(&aggregates, &profiles, config)?;

    tracing::info!(
        "📊 Analyzed {} invoices across {} customers ({} rejected)",
        batch.invoices.len(),
        aggregates.len(),
        batch.rejected.len()
    );

    Ok(Analysis {
        as_of,
        invoices: batch.invoices,
        aggregates,
        profiles,
        queue,
        rejected: batch.rejected,
    })
}

impl Analysis {
    pub fn aging_report(&self, config: &EngineConfig, top_n: Option<usize>) -> AgingReport {
        AgingReport {
            summary: aging_summary(
                &self.invoices,
                self.as_of,
                &config.aging,
                top_n.unwrap_or(config.report.top_overdue_customers),
            ),
            rejected: self.rejected.clone(),
        }
    }

    pub fn risk_report(&self, config: &EngineConfig, top_n: Option<usize>) -> RiskReport {
        let limit = top_n.unwrap_or(config.report.top_risk_customers);
        RiskReport {
            as_of: self.as_of,
            customers: self.profiles.iter().take(limit).cloned().collect(),
            rejected: self.rejected.clone(),
        }
    }

    pub fn priority_report(&self, config: &EngineConfig, top_n: Option<usize>) -> PriorityReport {
        let limit = top_n.unwrap_or(config.report.top_priority);
        PriorityReport {
            as_of: self.as_of,
            queue: self.queue.iter().take(limit).cloned().collect(),
            rejected: self.rejected.clone(),
        }
    }

    /// `top_n` sizes both the risk list and the worklist.
    pub fn brief(&self, config: &EngineConfig, top_n: Option<usize>) -> ArBrief {
        let priority_queue = self.priority_report(config, top_n).queue;
        let escalations = escalations(&priority_queue);
        ArBrief {
            as_of: self.as_of,
            aging: self.aging_report(config, None).summary,
            top_risk_customers: self.risk_report(config, top_n).customers,
            priority_queue,
            escalations,
            rejected: self.rejected.clone(),
        }
    }
}

/// Entries of a worklist whose recommended action is `escalate`.
pub fn escalations(queue: &[PriorityEntry]) -> Vec<PriorityEntry> {
    queue
        .iter()
        .filter(|entry| entry.recommended_action == RecommendedAction::Escalate)
        .cloned()
        .collect()
}

/// One-call AR snapshot: aging, top risks, today's worklist and escalations.
pub fn compose_brief(records: &[RawInvoice], as_of: NaiveDate, config: &EngineConfig) -> Result<ArBrief> {
    Ok(analyze(records, as_of, config)?.brief(config, None))
}
