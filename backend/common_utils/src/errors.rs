//! Errors shared across the checkout crates

/// The shorthand result type used everywhere an `error_stack` context is
/// carried alongside the failure.
pub type CustomResult<T, E> = error_stack::Result<T, E>;

/// Errors while parsing or encoding values at a boundary.
#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    #[error("Failed to parse {0} from a json value")]
    StructParseFailure(&'static str),
    #[error("Failed to serialize {0} to a json value")]
    EncodeError(&'static str),
    #[error("Failed to parse {0} as a decimal amount")]
    DecimalParseFailure(&'static str),
}

/// Errors for malformed or missing input values.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {field_name}")]
    MissingRequiredField { field_name: &'static str },
    #[error("Invalid value provided: {message}")]
    InvalidValue { message: String },
}
