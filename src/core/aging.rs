//! Aging buckets, per-customer aggregation and the aging summary.

use crate::config::AgingConfig;
use crate::domain::model::{
    AgingBucket, AgingSummary, BucketTotal, CustomerAggregate, CustomerExposure, Invoice,
    OverdueCustomer,
};
use crate::utils::error::{ArError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Maps whole days past due onto a bucket. Total over `u32` and
/// monotonic as long as the boundaries ascend.
pub fn bucket_for_days(days_past_due: u32, config: &AgingConfig) -> AgingBucket {
    let [first, second, third] = config.boundaries;
    match days_past_due {
        0 => AgingBucket::Current,
        d if d <= first => AgingBucket::Overdue0To10,
        d if d <= second => AgingBucket::Overdue11To20,
        d if d <= third => AgingBucket::Overdue21To30,
        _ => AgingBucket::Overdue31Plus,
    }
}

pub fn classify(invoice: &Invoice, as_of: NaiveDate, config: &AgingConfig) -> AgingBucket {
    bucket_for_days(invoice.days_past_due(as_of), config)
}

fn empty_bucket_map() -> BTreeMap<AgingBucket, f64> {
    AgingBucket::ALL.iter().map(|bucket| (*bucket, 0.0)).collect()
}

impl CustomerAggregate {
    /// Derives the aggregate from one customer's invoices. An empty slice is
    /// allowed here so the scorer can refuse it; mixed customers are not.
    pub fn from_invoices(
        customer_id: &str,
        invoices: Vec<Invoice>,
        as_of: NaiveDate,
        config: &AgingConfig,
    ) -> Result<Self> {
        if let Some(stray) = invoices.iter().find(|inv| inv.customer_id != customer_id) {
            return Err(ArError::invalid_aggregate(
                customer_id,
                format!(
                    "invoice '{}' belongs to customer '{}'",
                    stray.id, stray.customer_id
                ),
            ));
        }

        let mut invoices = invoices;
        invoices.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));

        // Latest-due invoice carries the freshest name.
        let customer_name = invoices
            .last()
            .map(|inv| inv.customer_name.clone())
            .unwrap_or_else(|| customer_id.to_string());

        let mut bucket_weights = empty_bucket_map();
        let mut total_outstanding = 0.0;
        let mut overdue_outstanding = 0.0;
        let mut max_days_past_due = 0;

        for invoice in &invoices {
            let days = invoice.days_past_due(as_of);
            let bucket = bucket_for_days(days, config);
            *bucket_weights.entry(bucket).or_insert(0.0) += invoice.amount_unpaid;
            total_outstanding += invoice.amount_unpaid;
            if days > 0 && invoice.amount_unpaid > 0.0 {
                overdue_outstanding += invoice.amount_unpaid;
                max_days_past_due = max_days_past_due.max(days);
            }
        }

        let overdue_ratio = if total_outstanding > 0.0 {
            overdue_outstanding / total_outstanding
        } else {
            0.0
        };

        Ok(Self {
            customer_id: customer_id.to_string(),
            customer_name,
            as_of,
            invoices,
            total_outstanding,
            overdue_outstanding,
            overdue_ratio,
            max_days_past_due,
            bucket_weights,
        })
    }

    pub fn exposure(&self) -> CustomerExposure {
        let open: Vec<&Invoice> = self
            .invoices
            .iter()
            .filter(|inv| inv.amount_unpaid > 0.0)
            .collect();
        let overdue_days: Vec<u64> = open
            .iter()
            .filter(|inv| inv.is_overdue(self.as_of))
            .map(|inv| u64::from(inv.days_past_due(self.as_of)))
            .collect();

        let avg_days_past_due = match overdue_days.len() as u64 {
            0 => 0,
            count => u32::try_from(overdue_days.iter().sum::<u64>() / count).unwrap_or(u32::MAX),
        };

        CustomerExposure {
            total_outstanding: self.total_outstanding,
            overdue_outstanding: self.overdue_outstanding,
            open_invoices: open.len(),
            overdue_invoices: overdue_days.len(),
            avg_days_past_due,
            max_days_past_due: self.max_days_past_due,
        }
    }
}

/// Groups invoices by customer, ordered by customer id. Every aggregate
/// holds at least one invoice.
pub fn aggregate_by_customer(
    invoices: &[Invoice],
    as_of: NaiveDate,
    config: &AgingConfig,
) -> Result<Vec<CustomerAggregate>> {
    let mut grouped: BTreeMap<&str, Vec<Invoice>> = BTreeMap::new();
    for invoice in invoices {
        grouped
            .entry(invoice.customer_id.as_str())
            .or_default()
            .push(invoice.clone());
    }

    grouped
        .into_iter()
        .map(|(customer_id, invoices)| {
            CustomerAggregate::from_invoices(customer_id, invoices, as_of, config)
        })
        .collect()
}

/// Bucket totals and the customers with the largest overdue balance.
pub fn aging_summary(
    invoices: &[Invoice],
    as_of: NaiveDate,
    config: &AgingConfig,
    top_n: usize,
) -> AgingSummary {
    let mut bucket_totals: BTreeMap<AgingBucket, BucketTotal> = AgingBucket::ALL
        .iter()
        .map(|bucket| {
            (
                *bucket,
                BucketTotal {
                    label: config.label(*bucket).to_string(),
                    ..BucketTotal::default()
                },
            )
        })
        .collect();

    let mut overdue_by_customer: BTreeMap<&str, OverdueCustomer> = BTreeMap::new();

    for invoice in invoices {
        let days = invoice.days_past_due(as_of);
        let bucket = bucket_for_days(days, config);
        if let Some(total) = bucket_totals.get_mut(&bucket) {
            total.count += 1;
            total.amount += invoice.amount_unpaid;
        }

        if days > 0 && invoice.amount_unpaid > 0.0 {
            let entry = overdue_by_customer
                .entry(invoice.customer_id.as_str())
                .or_insert_with(|| OverdueCustomer {
                    customer_id: invoice.customer_id.clone(),
                    customer_name: invoice.customer_name.clone(),
                    total_overdue: 0.0,
                    oldest_days_past_due: 0,
                });
            entry.total_overdue += invoice.amount_unpaid;
            entry.oldest_days_past_due = entry.oldest_days_past_due.max(days);
        }
    }

    let total_outstanding: f64 = bucket_totals.values().map(|t| t.amount).sum();
    let overdue_outstanding: f64 = AgingBucket::OVERDUE
        .iter()
        .filter_map(|bucket| bucket_totals.get(bucket))
        .map(|t| t.amount)
        .sum();
    let overdue_pct = if total_outstanding > 0.0 {
        overdue_outstanding / total_outstanding * 100.0
    } else {
        0.0
    };

    // Ties go to the older bucket.
    let largest_overdue_bucket = AgingBucket::OVERDUE
        .iter()
        .rev()
        .filter_map(|bucket| bucket_totals.get(bucket).map(|t| (*bucket, t.amount)))
        .filter(|(_, amount)| *amount > 0.0)
        .fold(None, |best: Option<(AgingBucket, f64)>, (bucket, amount)| match best {
            Some((_, best_amount)) if best_amount >= amount => best,
            _ => Some((bucket, amount)),
        })
        .map(|(bucket, _)| bucket);

    let mut top_overdue_customers: Vec<OverdueCustomer> =
        overdue_by_customer.into_values().collect();
    top_overdue_customers.sort_by(|a, b| {
        b.total_overdue
            .total_cmp(&a.total_overdue)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    top_overdue_customers.truncate(top_n);

    AgingSummary {
        as_of,
        bucket_totals,
        total_outstanding,
        overdue_outstanding,
        overdue_pct,
        largest_overdue_bucket,
        top_overdue_customers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(id: &str, customer: &str, unpaid: f64, due: NaiveDate) -> Invoice {
        Invoice {
            id: id.to_string(),
            invoice_number: None,
            customer_id: customer.to_string(),
            customer_name: format!("{} Ltd", customer),
            amount_total: unpaid.max(1000.0),
            amount_unpaid: unpaid,
            due_date: due,
            transaction_date: due - chrono::Duration::days(30),
        }
    }

    #[test]
    fn boundary_days_land_in_expected_buckets() {
        let config = AgingConfig::default();
        let expected = [
            (0, AgingBucket::Current),
            (1, AgingBucket::Overdue0To10),
            (10, AgingBucket::Overdue0To10),
            (11, AgingBucket::Overdue11To20),
            (20, AgingBucket::Overdue11To20),
            (21, AgingBucket::Overdue21To30),
            (30, AgingBucket::Overdue21To30),
            (31, AgingBucket::Overdue31Plus),
            (u32::MAX, AgingBucket::Overdue31Plus),
        ];
        for (days, bucket) in expected {
            assert_eq!(bucket_for_days(days, &config), bucket, "days = {}", days);
        }
    }

    #[test]
    fn future_due_date_is_current() {
        let as_of = date(2024, 6, 1);
        let inv = invoice("1", "C", 0.0, date(2024, 6, 11));
        assert_eq!(inv.days_past_due(as_of), 0);
        assert_eq!(classify(&inv, as_of, &AgingConfig::default()), AgingBucket::Current);
    }

    #[test]
    fn forty_five_days_is_thirty_one_plus() {
        let as_of = date(2024, 6, 1);
        let inv = invoice("1", "C", 1000.0, as_of - chrono::Duration::days(45));
        assert_eq!(classify(&inv, as_of, &AgingConfig::default()), AgingBucket::Overdue31Plus);
    }

    #[test]
    fn aggregate_tracks_ratio_and_buckets() {
        let as_of = date(2024, 6, 1);
        let invoices = vec![
            invoice("1", "C", 300.0, as_of - chrono::Duration::days(5)),
            invoice("2", "C", 100.0, as_of + chrono::Duration::days(5)),
        ];
        let aggregate =
            CustomerAggregate::from_invoices("C", invoices, as_of, &AgingConfig::default()).unwrap();

        assert_eq!(aggregate.total_outstanding(), 400.0);
        assert_eq!(aggregate.overdue_outstanding(), 300.0);
        assert_eq!(aggregate.overdue_ratio(), 0.75);
        assert_eq!(aggregate.max_days_past_due(), 5);
        assert_eq!(aggregate.bucket_amount(AgingBucket::Overdue0To10), 300.0);
        assert_eq!(aggregate.bucket_amount(AgingBucket::Current), 100.0);
        assert_eq!(aggregate.bucket_weights().len(), 5);
        assert_eq!(aggregate.invoices()[0].id, "1");
    }

    #[test]
    fn exposure_counts_only_invoices_with_a_balance() {
        let as_of = date(2024, 6, 1);
        let invoices = vec![
            invoice("1", "C", 300.0, as_of - chrono::Duration::days(5)),
            invoice("2", "C", 200.0, as_of - chrono::Duration::days(40)),
            invoice("3", "C", 100.0, as_of + chrono::Duration::days(5)),
            invoice("4", "C", 0.0, as_of - chrono::Duration::days(90)),
        ];
        let aggregate =
            CustomerAggregate::from_invoices("C", invoices, as_of, &AgingConfig::default()).unwrap();
        let exposure = aggregate.exposure();

        assert_eq!(exposure.total_outstanding, 600.0);
        assert_eq!(exposure.overdue_outstanding, 500.0);
        assert_eq!(exposure.open_invoices, 3);
        assert_eq!(exposure.overdue_invoices, 2);
        assert_eq!(exposure.avg_days_past_due, 22);
        assert_eq!(exposure.max_days_past_due, 40);
    }

    #[test]
    fn aggregate_rejects_foreign_invoice() {
        let as_of = date(2024, 6, 1);
        let invoices = vec![invoice("1", "OTHER", 10.0, as_of)];
        let err = CustomerAggregate::from_invoices("C", invoices, as_of, &AgingConfig::default())
            .unwrap_err();
        assert!(matches!(err, ArError::InvalidAggregateError { .. }));
    }

    #[test]
    fn summary_partitions_outstanding() {
        let as_of = date(2024, 6, 1);
        let invoices = vec![
            invoice("1", "A", 100.0, as_of - chrono::Duration::days(3)),
            invoice("2", "A", 50.0, as_of - chrono::Duration::days(40)),
            invoice("3", "B", 400.0, as_of - chrono::Duration::days(15)),
            invoice("4", "C", 250.0, as_of + chrono::Duration::days(2)),
            invoice("5", "C", 0.0, as_of - chrono::Duration::days(25)),
        ];

        let summary = aging_summary(&invoices, as_of, &AgingConfig::default(), 2);

        assert_eq!(summary.total_outstanding, 800.0);
        assert_eq!(summary.overdue_outstanding, 550.0);
        assert_eq!(summary.bucket_totals[&AgingBucket::Current].amount, 250.0);
        assert_eq!(summary.bucket_totals[&AgingBucket::Overdue21To30].count, 1);
        assert_eq!(summary.bucket_totals[&AgingBucket::Overdue31Plus].label, "31+");
        assert_eq!(summary.largest_overdue_bucket, Some(AgingBucket::Overdue11To20));

        assert_eq!(summary.top_overdue_customers.len(), 2);
        assert_eq!(summary.top_overdue_customers[0].customer_id, "B");
        assert_eq!(summary.top_overdue_customers[1].customer_id, "A");
        assert_eq!(summary.top_overdue_customers[1].oldest_days_past_due, 40);
    }
}
