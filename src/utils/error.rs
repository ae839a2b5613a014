use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArError {
    #[error("Source request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Data source error: {message}")]
    SourceError { message: String },

    #[error("Configuration error on '{field}': {message}")]
    ConfigurationError { field: String, message: String },

    #[error("Validation error on '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("Invalid aggregate for customer '{customer_id}': {message}")]
    InvalidAggregateError { customer_id: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ArError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_aggregate(customer_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAggregateError {
            customer_id: customer_id.into(),
            message: message.into(),
        }
    }

    /// Drives the binary's exit code.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ArError::ValidationError { .. } => ErrorSeverity::Low,
            ArError::ApiError(_) | ArError::SourceError { .. } => ErrorSeverity::Medium,
            ArError::InvalidAggregateError { .. }
            | ArError::CsvError(_)
            | ArError::SerializationError(_) => ErrorSeverity::High,
            ArError::ConfigurationError { .. } | ArError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ArError::ApiError(_) => "Check network access and the SuiteQL endpoint, then retry",
            ArError::SourceError { .. } => {
                "Verify the access token is still valid and the account has read access"
            }
            ArError::CsvError(_) | ArError::IoError(_) => {
                "Check that the output path exists and is writable"
            }
            ArError::SerializationError(_) => "Make sure the input file holds a JSON array of records",
            ArError::ConfigurationError { .. } => {
                "Fix the named setting in the configuration file and start again"
            }
            ArError::ValidationError { .. } => {
                "Correct the offending invoice record at the source or disable fail_fast"
            }
            ArError::InvalidAggregateError { .. } => {
                "Only score customers that have at least one invoice of their own"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ArError::ConfigurationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            ArError::ValidationError { field, message } => {
                format!("Invoice data problem in '{}': {}", field, message)
            }
            ArError::ApiError(_) | ArError::SourceError { .. } => {
                "Could not read invoices from the finance system".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ArError>;
