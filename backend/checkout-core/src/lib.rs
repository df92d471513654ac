//! Checkout-side payment capture orchestration.
//!
//! Turns a shopper's submission into a server-ready payment payload:
//! fetches a client token, drives the payment SDK's isolated field
//! integration (or the wallet approval popup), runs step-up verification
//! when required and assembles the final [`PaymentMethodPayload`].
//!
//! The crate never touches a network or a DOM itself; everything foreign
//! sits behind the trait seams in the `interfaces` crate.
//!
//! [`PaymentMethodPayload`]: domain_types::payload::PaymentMethodPayload

pub mod bridge;
pub mod classifier;
pub mod consts;
pub mod controller;
pub mod events;
pub mod hosted_fields;
pub mod pipeline;
pub mod verification;
pub mod wallet;
