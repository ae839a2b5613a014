use crate::utils::error::{ArError, Result};
use url::Url;

/// Tolerance used when checking that a weight family sums to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ArError::configuration(field_name, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ArError::configuration(
                field_name,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(ArError::configuration(
            field_name,
            format!("Invalid URL format '{}': {}", url_str, e),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ArError::configuration(field_name, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(ArError::configuration(field_name, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ArError::configuration(
            field_name,
            format!("Value {} must be at least {}", value, min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ArError::configuration(
            field_name,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ArError::configuration(
            field_name,
            format!("Value {} must be between {} and {}", value, min, max),
        ));
    }
    Ok(())
}

/// A weight must be a finite, non-negative number.
pub fn validate_weight(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ArError::configuration(
            field_name,
            format!("Weight {} must be a finite number >= 0", value),
        ));
    }
    Ok(())
}

pub fn validate_weights_sum(field_name: &str, weights: &[f64]) -> Result<()> {
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ArError::configuration(
            field_name,
            format!("Weights must sum to 1.0 (got {})", total),
        ));
    }
    Ok(())
}

pub fn validate_strictly_ascending<T: PartialOrd + std::fmt::Debug>(
    field_name: &str,
    values: &[T],
) -> Result<()> {
    if values.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(ArError::configuration(
            field_name,
            format!("Values must be strictly ascending (got {:?})", values),
        ));
    }
    Ok(())
}
