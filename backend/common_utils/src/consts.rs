//! Shared constants

/// Fallback error code when a collaborator reports none.
pub const NO_ERROR_CODE: &str = "No error code";
/// Fallback error message when a collaborator reports none.
pub const NO_ERROR_MESSAGE: &str = "No error message";

/// Number of decimal places a major-unit amount string carries on the wire.
pub const MAJOR_UNIT_DECIMAL_PLACES: u32 = 2;
