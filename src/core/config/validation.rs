//! Validation helper functions for configuration types.

use crate::core::errors::{OrthoparkError, Result};

/// Validate that a usize value is greater than zero.
pub fn validate_positive_usize(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(OrthoparkError::config_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that a u64 value is greater than zero.
pub fn validate_positive_u64(value: u64, field: &str) -> Result<()> {
    if value == 0 {
        return Err(OrthoparkError::config_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that an f64 value is in the unit range [0.0, 1.0].
pub fn validate_unit_range(value: f64, field: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(OrthoparkError::config_field(
            format!("{} must be between 0.0 and 1.0, got {}", field, value),
            field,
        ));
    }
    Ok(())
}

/// Validate that an f64 value lies within `[min, max]`.
pub fn validate_bounded_f64(value: f64, min: f64, max: f64, field: &str) -> Result<()> {
    if !(min..=max).contains(&value) {
        return Err(OrthoparkError::config_field(
            format!("{} must be between {} and {}, got {}", field, min, max, value),
            field,
        ));
    }
    Ok(())
}

/// Validate that a string setting is not blank.
pub fn validate_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(OrthoparkError::config_field(
            format!("{} must not be empty", field),
            field,
        ));
    }
    Ok(())
}
