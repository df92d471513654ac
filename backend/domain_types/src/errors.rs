//! Error taxonomy of the checkout flow

/// Failure while constructing the configuration snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("initialization data is not available")]
    NotAvailable,
    #[error("initialization data could not be parsed")]
    ParsingFailed,
}

/// Failure of a collaborator round trip at the transport level.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to the checkout endpoint failed")]
    RequestFailed,
    #[error("response body could not be decoded")]
    DecodingFailed,
}

/// Every failure a submission attempt can surface. Each variant maps to a
/// retry posture: integration and lifecycle errors need a remount,
/// credential-capture and round-trip errors are retryable by the shopper,
/// declines need a different instrument. Nothing is retried automatically.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckoutFlowError {
    #[error("payment integration is not ready")]
    Integration,
    #[error("an integration setup is already in flight")]
    SetupInFlight,
    #[error("credential capture was rejected: {message}")]
    CredentialCapture { message: String },
    #[error("saved instrument lookup failed: {message}")]
    TokenLookup { message: String },
    #[error("server communication failed: {message}")]
    ServerCommunication { message: String },
    #[error("no verification session is available")]
    Verification,
    #[error("declined: {message}")]
    Declined { message: String },
    #[error("a submission is already being processed")]
    OverlappingSubmission,
    #[error("unclassified payment failure")]
    Unknown,
}

impl CheckoutFlowError {
    /// The message carried by the variant, when it has one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::CredentialCapture { message }
            | Self::TokenLookup { message }
            | Self::ServerCommunication { message }
            | Self::Declined { message } => Some(message),
            Self::Integration
            | Self::SetupInFlight
            | Self::Verification
            | Self::OverlappingSubmission
            | Self::Unknown => None,
        }
    }
}
