//! Credential and instrument entities

use common_utils::{consts, PeekInterface, Secret};
use serde::{Deserialize, Serialize};

use crate::{
    errors::CheckoutFlowError,
    utils::{Error, ForeignTryFrom},
};

/// Single-use opaque token standing in for captured payment credentials.
/// Produced by tokenization or wallet approval, consumed into the outgoing
/// payload within the same submission attempt, never persisted or logged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialReference(Secret<String>);

impl CredentialReference {
    pub fn new(nonce: impl Into<String>) -> Self {
        Self(Secret::new(nonce.into()))
    }

    pub fn peek(&self) -> &str {
        self.0.peek()
    }

    pub fn is_empty(&self) -> bool {
        self.0.peek().is_empty()
    }
}

/// Instrument kind reported by the SDK at tokenization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum PaymentMethodKind {
    CreditCard,
    PayPalAccount,
    #[serde(other)]
    Other,
}

/// Validated result of a hosted-fields tokenize call.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedCredential {
    pub nonce: CredentialReference,
    pub bin: String,
    pub card_type: Option<String>,
    pub kind: PaymentMethodKind,
}

#[derive(Debug, Deserialize)]
struct RawTokenizeDetails {
    #[serde(default)]
    bin: String,
    #[serde(rename = "cardType")]
    card_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTokenizeResponse {
    nonce: Option<String>,
    details: Option<RawTokenizeDetails>,
    #[serde(rename = "type")]
    kind: Option<PaymentMethodKind>,
    message: Option<String>,
}

impl ForeignTryFrom<serde_json::Value> for CapturedCredential {
    type Error = Error;

    /// A tokenize response without a usable nonce is a capture rejection
    /// carrying whatever message the SDK reported.
    fn foreign_try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let raw: RawTokenizeResponse = serde_json::from_value(value).map_err(|_| {
            error_stack::report!(CheckoutFlowError::CredentialCapture {
                message: consts::NO_ERROR_MESSAGE.to_string(),
            })
        })?;
        let nonce = match raw.nonce {
            Some(nonce) if !nonce.is_empty() => CredentialReference::new(nonce),
            _ => {
                return Err(error_stack::report!(CheckoutFlowError::CredentialCapture {
                    message: raw
                        .message
                        .unwrap_or_else(|| consts::NO_ERROR_MESSAGE.to_string()),
                }))
            }
        };
        let details = raw.details;
        Ok(Self {
            nonce,
            bin: details
                .as_ref()
                .map(|details| details.bin.clone())
                .unwrap_or_default(),
            card_type: details.and_then(|details| details.card_type),
            kind: raw.kind.unwrap_or(PaymentMethodKind::Other),
        })
    }
}

/// Vaulted-instrument data fetched from the server for one submission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SavedInstrumentData {
    pub token: String,
    pub nonce: CredentialReference,
    #[serde(default)]
    pub bin: String,
}

/// Device fingerprint collected by the fraud tool. Opaque to this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceData(String);

impl DeviceData {
    pub fn new(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
