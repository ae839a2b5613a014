use crate::domain::model::RawInvoice;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Read-only supplier of open invoice rows. Implementations own fetching,
/// paging and timeouts; the scoring core only ever sees the returned rows.
#[async_trait]
pub trait InvoiceSource: Send + Sync {
    async fn fetch_open_invoices(&self, as_of: NaiveDate) -> Result<Vec<RawInvoice>>;

    fn describe(&self) -> String;
}
