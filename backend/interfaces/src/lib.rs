//! Trait seams between the checkout core and its collaborators: the
//! payment SDK, the wallet vendor SDK and the host server endpoint.
//!
//! Everything behind these traits is duck-typed foreign code; the core
//! only ever sees `serde_json::Value` results here and validates them
//! into `domain_types` entities immediately after the call returns.

pub mod events;
pub mod sdk;
pub mod transport;
