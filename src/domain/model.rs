use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// An untyped invoice row as delivered by the data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInvoice {
    pub data: HashMap<String, serde_json::Value>,
}

impl From<serde_json::Map<String, serde_json::Value>> for RawInvoice {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            data: map.into_iter().collect(),
        }
    }
}

/// Canonical invoice. Constructed only by the normalizer, so the amount and
/// date invariants always hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    pub customer_id: String,
    pub customer_name: String,
    pub amount_total: f64,
    pub amount_unpaid: f64,
    pub due_date: NaiveDate,
    pub transaction_date: NaiveDate,
}

impl Invoice {
    /// Whole days past due, never negative.
    pub fn days_past_due(&self, as_of: NaiveDate) -> u32 {
        let days = (as_of - self.due_date).num_days().max(0);
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.days_past_due(as_of) > 0
    }
}

/// Aging ranges in escalating order. The derived `Ord` is the bucket order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgingBucket {
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "overdue_0_10")]
    Overdue0To10,
    #[serde(rename = "overdue_11_20")]
    Overdue11To20,
    #[serde(rename = "overdue_21_30")]
    Overdue21To30,
    #[serde(rename = "overdue_31_plus")]
    Overdue31Plus,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 5] = [
        AgingBucket::Current,
        AgingBucket::Overdue0To10,
        AgingBucket::Overdue11To20,
        AgingBucket::Overdue21To30,
        AgingBucket::Overdue31Plus,
    ];

    pub const OVERDUE: [AgingBucket; 4] = [
        AgingBucket::Overdue0To10,
        AgingBucket::Overdue11To20,
        AgingBucket::Overdue21To30,
        AgingBucket::Overdue31Plus,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AgingBucket::Current => "current",
            AgingBucket::Overdue0To10 => "overdue_0_10",
            AgingBucket::Overdue11To20 => "overdue_11_20",
            AgingBucket::Overdue21To30 => "overdue_21_30",
            AgingBucket::Overdue31Plus => "overdue_31_plus",
        }
    }
}

/// Per-customer roll-up of one fetch. Fields are private: the aggregate is
/// always derived from its invoice set and never patched afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerAggregate {
    pub(crate) customer_id: String,
    pub(crate) customer_name: String,
    pub(crate) as_of: NaiveDate,
    pub(crate) invoices: Vec<Invoice>,
    pub(crate) total_outstanding: f64,
    pub(crate) overdue_outstanding: f64,
    pub(crate) overdue_ratio: f64,
    pub(crate) max_days_past_due: u32,
    pub(crate) bucket_weights: BTreeMap<AgingBucket, f64>,
}

impl CustomerAggregate {
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn total_outstanding(&self) -> f64 {
        self.total_outstanding
    }

    pub fn overdue_outstanding(&self) -> f64 {
        self.overdue_outstanding
    }

    pub fn overdue_ratio(&self) -> f64 {
        self.overdue_ratio
    }

    pub fn max_days_past_due(&self) -> u32 {
        self.max_days_past_due
    }

    /// Outstanding amount per bucket; every bucket is present.
    pub fn bucket_weights(&self) -> &BTreeMap<AgingBucket, f64> {
        &self.bucket_weights
    }

    pub fn bucket_amount(&self, bucket: AgingBucket) -> f64 {
        self.bucket_weights.get(&bucket).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

/// One term of a weighted score: `contribution == weight * value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreFactor {
    pub name: String,
    pub weight: f64,
    pub value: f64,
    pub contribution: f64,
}

impl ScoreFactor {
    pub fn new(name: impl Into<String>, weight: f64, value: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            value,
            contribution: weight * value,
        }
    }
}

/// Balances and invoice counts behind a risk score. Counts and day
/// figures cover invoices that still carry a balance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomerExposure {
    pub total_outstanding: f64,
    pub overdue_outstanding: f64,
    pub open_invoices: usize,
    pub overdue_invoices: usize,
    /// Whole days, truncated.
    pub avg_days_past_due: u32,
    pub max_days_past_due: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskProfile {
    pub customer_id: String,
    pub customer_name: String,
    pub score: f64,
    pub category: RiskCategory,
    pub contributing_factors: Vec<ScoreFactor>,
    pub exposure: CustomerExposure,
}

impl RiskProfile {
    pub fn factor(&self, name: &str) -> Option<&ScoreFactor> {
        self.contributing_factors.iter().find(|f| f.name == name)
    }

    /// Re-adds the factor contributions; equals `score` up to rounding.
    pub fn reconstructed_score(&self) -> f64 {
        self.contributing_factors
            .iter()
            .map(|f| f.weight * f.value)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    ContactToday,
    Monitor,
    Escalate,
    NoAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityEntry {
    pub rank: usize,
    pub customer_id: String,
    pub customer_name: String,
    pub priority_score: f64,
    pub recommended_action: RecommendedAction,
    pub outstanding: f64,
    pub overdue_outstanding: f64,
    pub max_days_past_due: u32,
    pub priority_factors: Vec<ScoreFactor>,
    pub risk: RiskProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BucketTotal {
    pub label: String,
    pub count: usize,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueCustomer {
    pub customer_id: String,
    pub customer_name: String,
    pub total_overdue: f64,
    pub oldest_days_past_due: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgingSummary {
    pub as_of: NaiveDate,
    pub bucket_totals: BTreeMap<AgingBucket, BucketTotal>,
    pub total_outstanding: f64,
    pub overdue_outstanding: f64,
    pub overdue_pct: f64,
    pub largest_overdue_bucket: Option<AgingBucket>,
    pub top_overdue_customers: Vec<OverdueCustomer>,
}

/// A raw record the normalizer refused, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    pub index: usize,
    pub record_id: Option<String>,
    pub field: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArBrief {
    pub as_of: NaiveDate,
    pub aging: AgingSummary,
    pub top_risk_customers: Vec<RiskProfile>,
    pub priority_queue: Vec<PriorityEntry>,
    pub escalations: Vec<PriorityEntry>,
    pub rejected: Vec<RejectedRecord>,
}
