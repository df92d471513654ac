//! Raw error shapes reported by the payment SDK.
//!
//! These mirror the SDK's wire format and stay at the boundary: the
//! classifier turns them into user-facing messages, nothing else consumes
//! them.

use serde::{Deserialize, Serialize};

/// Broad error class reported by the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SdkErrorKind {
    Customer,
    Merchant,
    Network,
    Internal,
    #[serde(other)]
    Unknown,
}

/// Nested `{ error: { message } }` block some SDK errors carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SdkErrorInner {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SdkErrorDetails {
    pub invalid_field_keys: Vec<String>,
    pub original_error: Option<Box<SdkError>>,
}

/// A structured SDK error as received from the integration boundary.
/// Validation errors carry a code and field details, network errors carry
/// a transport message nested under `details.originalError`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(default)]
#[error("sdk error: {}", self.message.as_deref().unwrap_or("no message"))]
pub struct SdkError {
    #[serde(rename = "type")]
    pub kind: Option<SdkErrorKind>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub error: Option<SdkErrorInner>,
    pub details: Option<SdkErrorDetails>,
}

impl SdkError {
    /// Shorthand for an error that only carries a message.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: SdkErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}
