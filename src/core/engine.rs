use crate::config::EngineConfig;
use crate::core::brief::{analyze, AgingReport, Analysis, PriorityReport, RiskReport};
use crate::domain::model::ArBrief;
use crate::domain::ports::InvoiceSource;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use chrono::NaiveDate;
use std::time::Instant;

/// Fetches open invoices from a source and answers the AR tools.
pub struct ArEngine<S: InvoiceSource> {
    source: S,
    config: EngineConfig,
}

impl<S: InvoiceSource> ArEngine<S> {
    /// Fails with a configuration error before anything is fetched or scored.
    pub fn new(source: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { source, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn analyze(&self, as_of: NaiveDate) -> Result<Analysis> {
        self.analyze_with(as_of, &self.config).await
    }

    /// Same as [`ArEngine::analyze`] with a per-call configuration, which is
    /// validated again before use.
    pub async fn analyze_with(&self, as_of: NaiveDate, config: &EngineConfig) -> Result<Analysis> {
        let started = Instant::now();
        tracing::info!("📡 Fetching open invoices from {}", self.source.describe());

        let records = self.source.fetch_open_invoices(as_of).await?;
        tracing::info!(
            "📥 Fetched {} invoice rows in {:?}",
            records.len(),
            started.elapsed()
        );

        let analysis = analyze(&records, as_of, config)?;
        tracing::debug!("Analysis for {} finished in {:?}", as_of, started.elapsed());
        Ok(analysis)
    }

    pub async fn aging_summary(&self, as_of: NaiveDate, top_n: Option<usize>) -> Result<AgingReport> {
        Ok(self.analyze(as_of).await?.aging_report(&self.config, top_n))
    }

    pub async fn risk_profiles(&self, as_of: NaiveDate, top_n: Option<usize>) -> Result<RiskReport> {
        Ok(self.analyze(as_of).await?.risk_report(&self.config, top_n))
    }

    pub async fn priority_queue(
        &self,
        as_of: NaiveDate,
        top_n: Option<usize>,
    ) -> Result<PriorityReport> {
        Ok(self.analyze(as_of).await?.priority_report(&self.config, top_n))
    }

    pub async fn daily_brief(&self, as_of: NaiveDate, top_n: Option<usize>) -> Result<ArBrief> {
        let brief = self.analyze(as_of).await?.brief(&self.config, top_n);
        tracing::info!(
            "✅ Brief ready: {} in queue, {} escalations, {} rejected rows",
            brief.priority_queue.len(),
            brief.escalations.len(),
            brief.rejected.len()
        );
        Ok(brief)
    }
}
