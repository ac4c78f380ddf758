//! Scalar and span validation for evidence references.
//!
//! Each check is independent and returns its own error, so a constructor can run all of them
//! and report every failure instead of stopping at the first.

use crate::{ModelError, ModelResult};

/// Validates a 1-based page number.
///
/// # Errors
///
/// Returns a `ModelError::Range` if `page < 1` or does not fit in `u32`.
pub fn validate_page(page: i64) -> ModelResult<u32> {
    if page < 1 {
        return Err(ModelError::range("page", page, ">= 1"));
    }
    u32::try_from(page).map_err(|_| ModelError::range("page", page, "<= 4294967295"))
}

/// Validates a 0-based chunk offset.
///
/// # Errors
///
/// Returns a `ModelError::Range` naming `field` if `value` is negative or does not fit in
/// `usize`.
pub fn validate_offset(field: &'static str, value: i64) -> ModelResult<usize> {
    if value < 0 {
        return Err(ModelError::range(field, value, ">= 0"));
    }
    usize::try_from(value).map_err(|_| ModelError::range(field, value, "<= usize::MAX"))
}

/// Validates that `[start_offset, end_offset)` is a non-empty forward span.
///
/// # Errors
///
/// Returns a `ModelError::Invariant` with the message
/// `end_offset (<e>) must be > start_offset (<s>)`.
pub fn validate_span(start_offset: i64, end_offset: i64) -> ModelResult<()> {
    if end_offset <= start_offset {
        return Err(ModelError::Invariant(format!(
            "end_offset ({end_offset}) must be > start_offset ({start_offset})"
        )));
    }
    Ok(())
}
