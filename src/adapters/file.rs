use crate::domain::model::RawInvoice;
use crate::domain::ports::InvoiceSource;
use crate::utils::error::{ArError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Reads a previously exported fetch: a JSON array of rows, or a SuiteQL
/// style `{ "items": [...] }` envelope.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

pub fn parse_rows(json_data: serde_json::Value) -> Result<Vec<RawInvoice>> {
    let items = match json_data {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("items") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(ArError::SourceError {
                    message: "expected a JSON array or an object with an 'items' array".to_string(),
                })
            }
        },
        other => {
            return Err(ArError::SourceError {
                message: format!("expected a JSON array of rows, got {}", other),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            serde_json::Value::Object(obj) => Ok(RawInvoice::from(obj)),
            other => Err(ArError::SourceError {
                message: format!("row {} is not a JSON object: {}", index, other),
            }),
        })
        .collect()
}

#[async_trait]
impl InvoiceSource for JsonFileSource {
    async fn fetch_open_invoices(&self, _as_of: NaiveDate) -> Result<Vec<RawInvoice>> {
        tracing::debug!("Reading invoice rows from {}", self.path.display());
        let content = tokio::fs::read(&self.path).await?;
        let json_data: serde_json::Value = serde_json::from_slice(&content)?;
        parse_rows(json_data)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
