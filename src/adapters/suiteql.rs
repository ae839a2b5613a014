use crate::config::toml_config::{SuiteQlConfig, SUITEQL_MAX_PAGE};
use crate::domain::model::RawInvoice;
use crate::domain::ports::InvoiceSource;
use crate::utils::error::{ArError, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;

/// Read-only SuiteQL reader. The access token is issued elsewhere; this
/// client never refreshes it and only ever sends SELECT statements.
pub struct SuiteQlSource {
    config: SuiteQlConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuiteQlPage {
    #[serde(default)]
    items: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    has_more: bool,
}

/// Rejects anything that is not a single SELECT statement.
pub fn ensure_read_only(query: &str) -> Result<()> {
    let trimmed = query.trim().trim_end_matches(';').trim();
    let is_select = trimmed
        .split_whitespace()
        .next()
        .map(|word| word.eq_ignore_ascii_case("select"))
        .unwrap_or(false);
    if !is_select || trimmed.contains(';') {
        return Err(ArError::validation(
            "query",
            "only single SELECT statements may be sent to the finance system",
        ));
    }
    Ok(())
}

/// Open customer invoices with a remaining balance, dated inside the lookback window.
pub fn open_invoice_query(as_of: NaiveDate, lookback_days: u32) -> String {
    let start_date = as_of - Duration::days(i64::from(lookback_days));
    format!(
        "SELECT \
            t.id AS transaction_id, \
            t.tranid AS invoice_number, \
            t.trandate AS invoice_date, \
            t.duedate AS due_date, \
            t.entity AS customer_id, \
            e.entityid AS customer_name, \
            t.foreigntotal AS amount_total, \
            t.foreignamountunpaid AS unpaid_amount \
        FROM transaction t \
        JOIN entity e ON e.id = t.entity \
        WHERE t.type = 'CustInvc' \
            AND NVL(t.foreignamountunpaid, 0) > 0 \
            AND t.trandate BETWEEN TO_DATE('{}', 'YYYY-MM-DD') AND TO_DATE('{}', 'YYYY-MM-DD') \
        ORDER BY t.duedate DESC",
        start_date.format("%Y-%m-%d"),
        as_of.format("%Y-%m-%d")
    )
}

impl SuiteQlSource {
    pub fn new(config: SuiteQlConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { config, client })
    }

    fn page_size(&self) -> usize {
        self.config.page_size.clamp(1, SUITEQL_MAX_PAGE)
    }

    async fn fetch_page(&self, query: &str, offset: usize) -> Result<SuiteQlPage> {
        let limit = self.page_size();
        tracing::debug!("POST {} limit={} offset={}", self.config.endpoint, limit, offset);

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.access_token)
            .header("Accept", "application/json")
            .header("Prefer", "transient")
            .query(&[("limit", limit), ("offset", offset)])
            .json(&serde_json::json!({ "q": query }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("❌ SuiteQL request failed with {}: {}", status, body);
            return Err(ArError::SourceError {
                message: format!("SuiteQL returned {}: {}", status, body),
            });
        }

        Ok(response.json::<SuiteQlPage>().await?)
    }

    /// Runs a SELECT and follows `hasMore` until `max_rows` rows are read.
    pub async fn query_rows(&self, query: &str) -> Result<Vec<RawInvoice>> {
        ensure_read_only(query)?;

        let mut rows = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.fetch_page(query, offset).await?;
            let received = page.items.len();
            rows.extend(page.items.into_iter().map(RawInvoice::from));
            offset += received;

            if !page.has_more || received == 0 || rows.len() >= self.config.max_rows {
                break;
            }
        }

        rows.truncate(self.config.max_rows);
        Ok(rows)
    }
}

#[async_trait]
impl InvoiceSource for SuiteQlSource {
    async fn fetch_open_invoices(&self, as_of: NaiveDate) -> Result<Vec<RawInvoice>> {
        let query = open_invoice_query(as_of, self.config.lookback_days);
        self.query_rows(&query).await
    }

    fn describe(&self) -> String {
        format!("SuiteQL {}", self.config.endpoint)
    }
}
