use crate::errors::CheckoutFlowError;

pub type Error = error_stack::Report<CheckoutFlowError>;

/// Trait for converting a foreign (collaborator-owned) shape into one of
/// our domain types, validating it in the process.
pub trait ForeignTryFrom<F>: Sized {
    type Error;

    fn foreign_try_from(from: F) -> Result<Self, Self::Error>;
}
