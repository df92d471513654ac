//! The payload assembled for the server at submission time

use common_utils::StringMajorUnit;
use serde::Serialize;

use crate::payment::{CredentialReference, DeviceData};

/// Verification markers, present only when verification actually ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationFlags {
    pub three_d_secure_enabled: bool,
    pub three_d_secure_verified: bool,
    /// Normalized card type for fresh cards, empty for saved instruments.
    pub card_type: String,
}

/// The mapping handed to the host checkout as SUCCESS metadata and posted
/// to the server. Holds at most one instrument identity: a fresh
/// credential reference or a saved-instrument token. A verification run
/// may additionally supersede the credential reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaymentMethodPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_data: Option<DeviceData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_nonce: Option<CredentialReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_token: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub saved_instrument: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub tokenize_payment_method: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_amount: Option<StringMajorUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationFlags>,
}

impl PaymentMethodPayload {
    /// Record a freshly captured credential, dropping any saved-instrument
    /// identity so that exactly one source remains.
    pub fn set_fresh_credential(&mut self, nonce: CredentialReference) {
        self.payment_token = None;
        self.saved_instrument = false;
        self.payment_nonce = Some(nonce);
    }

    /// Record a saved-instrument token, discarding a fresh credential
    /// captured earlier in the attempt.
    pub fn set_saved_instrument(&mut self, token: impl Into<String>) {
        self.payment_nonce = None;
        self.saved_instrument = true;
        self.payment_token = Some(token.into());
    }

    /// Replace the outgoing credential reference with the one returned by
    /// verification.
    pub fn supersede_credential(&mut self, nonce: CredentialReference) {
        self.payment_nonce = Some(nonce);
    }

    pub fn credential_reference(&self) -> Option<&CredentialReference> {
        self.payment_nonce.as_ref()
    }
}
