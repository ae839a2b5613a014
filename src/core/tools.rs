//! JSON-in, JSON-out entry point for an agent's tool dispatcher.
//!
//! A call names one of the AR tools plus optional arguments; the output wraps
//! the structured result with the reference date actually used. `dry_run` is
//! carried through untouched for downstream collaborators that act on the
//! priority queue.

use crate::core::brief::{AgingReport, PriorityReport, RiskReport};
use crate::core::engine::ArEngine;
use crate::domain::model::ArBrief;
use crate::domain::ports::InvoiceSource;
use crate::utils::error::{ArError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    ArAgingSummary,
    CustomerRiskProfiles,
    CollectionsPriorityQueue,
    DailyArBrief,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::ArAgingSummary,
        ToolName::CustomerRiskProfiles,
        ToolName::CollectionsPriorityQueue,
        ToolName::DailyArBrief,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::ArAgingSummary => "ar_aging_summary",
            ToolName::CustomerRiskProfiles => "customer_risk_profiles",
            ToolName::CollectionsPriorityQueue => "collections_priority_queue",
            ToolName::DailyArBrief => "daily_ar_brief",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolName::ArAgingSummary => {
                "Open AR grouped into aging buckets with totals, counts and top overdue customers"
            }
            ToolName::CustomerRiskProfiles => {
                "Customers ranked by explainable risk score with contributing factors"
            }
            ToolName::CollectionsPriorityQueue => {
                "Ranked list of customers to contact first with a recommended action"
            }
            ToolName::DailyArBrief => {
                "Aging snapshot, top risks, today's worklist and escalations in one call"
            }
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ArError;

    fn from_str(value: &str) -> Result<Self> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == value.trim())
            .ok_or_else(|| {
                ArError::validation("tool", format!("unknown tool '{}'", value))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: ToolName,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    #[serde(default)]
    pub top_n: Option<usize>,
    /// Overrides `report.min_open_balance` for this call.
    #[serde(default)]
    pub min_open_balance: Option<f64>,
    #[serde(default)]
    pub dry_run: bool,
}

impl ToolCall {
    pub fn new(tool: ToolName) -> Self {
        Self {
            tool,
            as_of: None,
            top_n: None,
            min_open_balance: None,
            dry_run: false,
        }
    }

    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// Typed result of one call, before it is flattened to JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolResult {
    Aging(AgingReport),
    Risk(RiskReport),
    Priority(PriorityReport),
    Brief(ArBrief),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub tool: ToolName,
    pub as_of: NaiveDate,
    pub dry_run: bool,
    pub result: serde_json::Value,
}

impl ToolOutput {
    pub fn new(call: &ToolCall, as_of: NaiveDate, result: &ToolResult) -> Result<Self> {
        Ok(Self {
            tool: call.tool,
            as_of,
            dry_run: call.dry_run,
            result: serde_json::to_value(result)?,
        })
    }
}

impl<S: InvoiceSource> ArEngine<S> {
    /// Runs one tool call and returns the reference date used with the typed
    /// result. `today` is used when the call carries no date.
    pub async fn run_call(&self, call: &ToolCall, today: NaiveDate) -> Result<(NaiveDate, ToolResult)> {
        let as_of = call.as_of.unwrap_or(today);
        if call.top_n == Some(0) {
            return Err(ArError::validation("top_n", "must be at least 1"));
        }
        tracing::info!("🔧 Running tool {} as of {}", call.tool, as_of);

        let config = match call.min_open_balance {
            Some(min_open_balance) => {
                let mut config = self.config().clone();
                config.report.min_open_balance = min_open_balance;
                Cow::Owned(config)
            }
            None => Cow::Borrowed(self.config()),
        };
        let analysis = self.analyze_with(as_of, &config).await?;

        let result = match call.tool {
            ToolName::ArAgingSummary => ToolResult::Aging(analysis.aging_report(&config, call.top_n)),
            ToolName::CustomerRiskProfiles => {
                ToolResult::Risk(analysis.risk_report(&config, call.top_n))
            }
            ToolName::CollectionsPriorityQueue => {
                ToolResult::Priority(analysis.priority_report(&config, call.top_n))
            }
            ToolName::DailyArBrief => ToolResult::Brief(analysis.brief(&config, call.top_n)),
        };
        Ok((as_of, result))
    }

    pub async fn dispatch(&self, call: &ToolCall, today: NaiveDate) -> Result<ToolOutput> {
        let (as_of, result) = self.run_call(call, today).await?;
        ToolOutput::new(call, as_of, &result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_names_round_trip_through_str() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
        assert!("send_collections_emails".parse::<ToolName>().is_err());
    }

    #[test]
    fn call_parses_with_defaults() {
        let call = ToolCall::from_json(r#"{"tool": "collections_priority_queue", "top_n": 5}"#).unwrap();
        assert_eq!(call.tool, ToolName::CollectionsPriorityQueue);
        assert_eq!(call.top_n, Some(5));
        assert_eq!(call.as_of, None);
        assert!(!call.dry_run);

        let call = ToolCall::from_json(r#"{"tool": "daily_ar_brief", "as_of": "2024-06-01", "dry_run": true}"#)
            .unwrap();
        assert_eq!(call.as_of, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert!(call.dry_run);
    }

    #[test]
    fn call_parses_balance_override() {
        let call = ToolCall::from_json(r#"{"tool": "customer_risk_profiles", "min_open_balance": 250.0}"#)
            .unwrap();
        assert_eq!(call.min_open_balance, Some(250.0));
        assert_eq!(ToolCall::new(ToolName::CustomerRiskProfiles).min_open_balance, None);
    }
}
