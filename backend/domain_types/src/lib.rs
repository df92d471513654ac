//! Typed domain entities for the checkout orchestration core.
//!
//! Raw payment-SDK responses are duck-typed JSON; everything in this crate
//! is the validated form those values must take before they travel further
//! into the pipeline. Conversions happen once, at the boundary, through
//! [`utils::ForeignTryFrom`].

pub mod checkout;
pub mod config;
pub mod errors;
pub mod payload;
pub mod payment;
pub mod processing;
pub mod sdk_error;
pub mod utils;
pub mod verification;
pub mod wallet;
