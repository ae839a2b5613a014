//! Turns loosely typed source rows into canonical [`Invoice`] values.
//!
//! Field names are matched after lower-casing and dropping everything that is
//! not alphanumeric, so `dueDate`, `due_date` and `DUEDATE` are the same key.
//! Each canonical field also accepts the column names the finance system uses.

use crate::config::NormalizerConfig;
use crate::domain::model::{Invoice, RawInvoice, RejectedRecord};
use crate::utils::error::{ArError, Result};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

const ID_KEYS: &[&str] = &["id", "transactionid"];
const INVOICE_NUMBER_KEYS: &[&str] = &["invoicenumber", "tranid"];
const CUSTOMER_ID_KEYS: &[&str] = &["customerid", "entity"];
const CUSTOMER_NAME_KEYS: &[&str] = &["customername", "entityid", "companyname"];
const AMOUNT_TOTAL_KEYS: &[&str] = &["amounttotal", "foreigntotal", "total"];
const AMOUNT_UNPAID_KEYS: &[&str] = &[
    "amountunpaid",
    "unpaidamount",
    "foreignamountunpaid",
    "amountremaining",
];
const DUE_DATE_KEYS: &[&str] = &["duedate"];
const TRANSACTION_DATE_KEYS: &[&str] = &["transactiondate", "trandate", "invoicedate"];

/// Result of normalizing one fetch: the good invoices plus every refusal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub invoices: Vec<Invoice>,
    pub rejected: Vec<RejectedRecord>,
}

fn canonical_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

struct FieldView<'a> {
    fields: HashMap<String, &'a Value>,
    /// Canonical keys carried by two source keys with different values.
    ambiguous: HashSet<String>,
}

impl<'a> FieldView<'a> {
    fn new(raw: &'a RawInvoice) -> Self {
        let mut fields: HashMap<String, &'a Value> = HashMap::new();
        let mut ambiguous = HashSet::new();
        for (key, value) in &raw.data {
            let canonical = canonical_key(key);
            match fields.get(&canonical).copied() {
                None => {
                    fields.insert(canonical, value);
                }
                Some(existing) if existing.is_null() => {
                    fields.insert(canonical, value);
                }
                Some(existing) if value.is_null() || existing == value => {}
                Some(_) => {
                    ambiguous.insert(canonical);
                }
            }
        }
        Self { fields, ambiguous }
    }

    /// First non-null value among the aliases. An alias reached while
    /// searching that two source keys disagree on fails the field.
    fn lookup(&self, field: &str, aliases: &[&str]) -> Result<Option<&'a Value>> {
        for alias in aliases {
            if self.ambiguous.contains(*alias) {
                return Err(ArError::validation(
                    field,
                    format!("several source keys normalize to '{}' with different values", alias),
                ));
            }
            if let Some(value) = self.fields.get(*alias).copied() {
                if !value.is_null() {
                    return Ok(Some(value));
                }
            }
        }
        Ok(None)
    }

    fn text(&self, field: &str, aliases: &[&str]) -> Result<Option<String>> {
        match self.lookup(field, aliases)? {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(ArError::validation(
                field,
                format!("expected a string or number, got {}", other),
            )),
        }
    }

    fn required_text(&self, field: &str, aliases: &[&str]) -> Result<String> {
        self.text(field, aliases)?
            .ok_or_else(|| ArError::validation(field, "missing value"))
    }

    fn amount(&self, field: &str, aliases: &[&str]) -> Result<Option<f64>> {
        let value = match self.lookup(field, aliases)? {
            None => return Ok(None),
            Some(value) => value,
        };
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(amount) if amount.is_finite() && amount >= 0.0 => Ok(Some(amount)),
            Some(amount) if amount.is_finite() => Err(ArError::validation(
                field,
                format!("amount {} is negative", amount),
            )),
            _ => Err(ArError::validation(
                field,
                format!("non-numeric amount {}", value),
            )),
        }
    }

    fn date(&self, field: &str, aliases: &[&str], formats: &[String]) -> Result<NaiveDate> {
        let raw = match self.lookup(field, aliases)? {
            Some(Value::String(s)) => s.trim(),
            Some(other) => {
                return Err(ArError::validation(
                    field,
                    format!("expected a date string, got {}", other),
                ))
            }
            None => return Err(ArError::validation(field, "missing value")),
        };
        parse_date(raw, formats)
            .ok_or_else(|| ArError::validation(field, format!("unparsable date '{}'", raw)))
    }
}

/// Tries each format on the full string, then on a leading `YYYY-MM-DD`
/// so timestamps keep only their calendar date.
pub fn parse_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            raw.get(..10)
                .filter(|_| raw.len() > 10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

/// Normalizes a single row. Pure; the only failure is `ValidationError`.
pub fn normalize(raw: &RawInvoice, config: &NormalizerConfig) -> Result<Invoice> {
    let view = FieldView::new(raw);

    let id = view.required_text("id", ID_KEYS)?;
    let invoice_number = view.text("invoice_number", INVOICE_NUMBER_KEYS)?;
    let customer_id = view.required_text("customer_id", CUSTOMER_ID_KEYS)?;
    let customer_name = view
        .text("customer_name", CUSTOMER_NAME_KEYS)?
        .unwrap_or_else(|| customer_id.clone());

    let amount_unpaid = view
        .amount("amount_unpaid", AMOUNT_UNPAID_KEYS)?
        .unwrap_or(0.0);
    // Open-invoice queries often select only the remaining balance.
    let amount_total = view
        .amount("amount_total", AMOUNT_TOTAL_KEYS)?
        .unwrap_or(amount_unpaid);

    if amount_unpaid > amount_total {
        return Err(ArError::validation(
            "amount_unpaid",
            format!(
                "unpaid amount {} exceeds invoice total {}",
                amount_unpaid, amount_total
            ),
        ));
    }

    let due_date = view.date("due_date", DUE_DATE_KEYS, &config.date_formats)?;
    let transaction_date =
        view.date("transaction_date", TRANSACTION_DATE_KEYS, &config.date_formats)?;

    Ok(Invoice {
        id,
        invoice_number,
        customer_id,
        customer_name,
        amount_total,
        amount_unpaid,
        due_date,
        transaction_date,
    })
}

/// Normalizes a whole fetch. Bad rows are collected as [`RejectedRecord`]s
/// unless `fail_fast` is set, in which case the first failure is returned.
/// A repeated invoice id rejects the later row.
pub fn normalize_batch(records: &[RawInvoice], config: &NormalizerConfig) -> Result<NormalizedBatch> {
    let mut batch = NormalizedBatch::default();
    let mut seen_ids = HashSet::new();

    for (index, raw) in records.iter().enumerate() {
        let outcome = normalize(raw, config).and_then(|invoice| {
            if seen_ids.insert(invoice.id.clone()) {
                Ok(invoice)
            } else {
                Err(ArError::validation(
                    "id",
                    format!("duplicate invoice id '{}' in batch", invoice.id),
                ))
            }
        });

        match outcome {
            Ok(invoice) => batch.invoices.push(invoice),
            Err(err) if config.fail_fast => return Err(err),
            Err(err) => {
                let record_id = FieldView::new(raw).text("id", ID_KEYS).ok().flatten();
                let (field, reason) = match &err {
                    ArError::ValidationError { field, message } => (field.clone(), message.clone()),
                    other => ("record".to_string(), other.to_string()),
                };
                tracing::warn!(
                    "⚠️ Rejected invoice record #{} ({}): {} - {}",
                    index,
                    record_id.as_deref().unwrap_or("no id"),
                    field,
                    reason
                );
                batch.rejected.push(RejectedRecord {
                    index,
                    record_id,
                    field,
                    reason,
                });
            }
        }
    }

    tracing::debug!(
        "Normalized {} invoices, rejected {}",
        batch.invoices.len(),
        batch.rejected.len()
    );
    Ok(batch)
}
