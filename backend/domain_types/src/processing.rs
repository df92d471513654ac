//! Submission results exchanged with the host checkout

use serde::Deserialize;

use crate::payload::PaymentMethodPayload;

/// Where the host should render a resulting notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum NoticeContext {
    Payments,
}

/// The one value a processing-event handler returns to the host checkout.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingResult {
    Success {
        meta: PaymentMethodPayload,
    },
    Error {
        message: String,
        context: NoticeContext,
    },
}

impl ProcessingResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            context: NoticeContext::Payments,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message, .. } => Some(message),
            Self::Success { .. } => None,
        }
    }

    pub fn payload(&self) -> Option<&PaymentMethodPayload> {
        match self {
            Self::Success { meta } => Some(meta),
            Self::Error { .. } => None,
        }
    }
}

/// Server-determined status delivered with the host's after-processing
/// events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Fail,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentDetails {
    pub result: Option<PaymentStatus>,
    pub message: Option<String>,
}

/// The after-processing event payload from the host.
#[derive(Debug, Clone, Deserialize)]
pub struct AfterProcessingResponse {
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_details: PaymentDetails,
}

/// What the client tells the host after server-side processing finished.
#[derive(Debug, Clone, PartialEq)]
pub enum AfterProcessingOutcome {
    Success,
    /// Failure status with a message: surfaced to the shopper, retryable.
    Failure { message: String, retry: bool },
}
