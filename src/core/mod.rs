pub mod aging;
pub mod brief;
pub mod engine;
pub mod export;
pub mod normalizer;
pub mod ranker;
pub mod risk;
pub mod tools;

pub use crate::domain::model::{
    AgingBucket, AgingSummary, ArBrief, CustomerAggregate, Invoice, PriorityEntry, RawInvoice,
    RecommendedAction, RejectedRecord, RiskCategory, RiskProfile, ScoreFactor,
};
pub use crate::domain::ports::InvoiceSource;
pub use crate::utils::error::Result;
