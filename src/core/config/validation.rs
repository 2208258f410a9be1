//! Validation helper functions for configuration types.

use crate::core::errors::{MapFpError, Result};

/// Validate that a usize value is greater than zero.
pub fn validate_positive_usize(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(MapFpError::config_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that an optional usize value, when set, is greater than zero.
pub fn validate_optional_positive_usize(value: Option<usize>, field: &str) -> Result<()> {
    match value {
        Some(v) => validate_positive_usize(v, field),
        None => Ok(()),
    }
}
