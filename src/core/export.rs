use crate::domain::model::{AgingSummary, PriorityEntry, RecommendedAction, RiskCategory};
use crate::utils::error::{ArError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Csv,
    Tsv,
}

impl TableFormat {
    fn delimiter(self) -> u8 {
        match self {
            TableFormat::Csv => b',',
            TableFormat::Tsv => b'\t',
        }
    }
}

#[derive(Serialize)]
struct QueueRow<'a> {
    rank: usize,
    customer_id: &'a str,
    customer_name: &'a str,
    priority_score: String,
    recommended_action: RecommendedAction,
    outstanding: String,
    overdue_outstanding: String,
    max_days_past_due: u32,
    risk_score: String,
    risk_category: RiskCategory,
}

#[derive(Serialize)]
struct BucketRow<'a> {
    bucket: &'a str,
    label: &'a str,
    count: usize,
    amount: String,
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ArError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| ArError::SourceError {
        message: format!("table output is not UTF-8: {}", e),
    })
}

pub fn render_priority_queue(entries: &[PriorityEntry], format: TableFormat) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(Vec::new());

    for entry in entries {
        writer.serialize(QueueRow {
            rank: entry.rank,
            customer_id: &entry.customer_id,
            customer_name: &entry.customer_name,
            priority_score: format!("{:.3}", entry.priority_score),
            recommended_action: entry.recommended_action,
            outstanding: format!("{:.2}", entry.outstanding),
            overdue_outstanding: format!("{:.2}", entry.overdue_outstanding),
            max_days_past_due: entry.max_days_past_due,
            risk_score: format!("{:.3}", entry.risk.score),
            risk_category: entry.risk.category,
        })?;
    }

    finish(writer)
}

pub fn render_aging_totals(summary: &AgingSummary, format: TableFormat) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(Vec::new());

    for (bucket, total) in &summary.bucket_totals {
        writer.serialize(BucketRow {
            bucket: bucket.key(),
            label: &total.label,
            count: total.count,
            amount: format!("{:.2}", total.amount),
        })?;
    }

    finish(writer)
}
