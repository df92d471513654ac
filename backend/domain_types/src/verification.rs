//! Step-up verification entities

use common_utils::StringMajorUnit;
use serde::{Deserialize, Serialize};

use crate::{
    errors::CheckoutFlowError,
    payment::CredentialReference,
    utils::{Error, ForeignTryFrom},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationBillingAddress {
    pub given_name: String,
    pub surname: String,
    pub phone_number: String,
    pub street_address: String,
    pub extended_address: String,
    pub locality: String,
    pub region: String,
    pub postal_code: String,
    pub country_code_alpha2: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationShippingAddress {
    pub street_address: String,
    pub extended_address: String,
    pub locality: String,
    pub region: String,
    pub postal_code: String,
    pub country_code_alpha2: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalInformation {
    pub shipping_given_name: String,
    pub shipping_surname: String,
    pub shipping_phone: String,
    pub shipping_address: VerificationShippingAddress,
}

/// Billing/shipping context for one verification call. Built from the
/// host checkout state at submission time, used as verification input and
/// discarded afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationContext {
    pub amount: StringMajorUnit,
    pub email: String,
    pub billing_address: VerificationBillingAddress,
    pub additional_information: AdditionalInformation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_requested: Option<bool>,
}

/// The request handed to the verification provider.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCardRequest {
    #[serde(flatten)]
    pub context: VerificationContext,
    pub nonce: CredentialReference,
    pub bin: String,
}

/// Outcome of a verification call.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    /// Supersedes the credential reference the verification was run on.
    pub nonce: CredentialReference,
    pub liability_shifted: bool,
    pub card_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawVerificationResponse {
    nonce: Option<String>,
    #[serde(rename = "liabilityShifted", default)]
    liability_shifted: bool,
    #[serde(rename = "cardType")]
    card_type: Option<String>,
}

impl ForeignTryFrom<serde_json::Value> for VerificationResult {
    type Error = Error;

    fn foreign_try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let raw: RawVerificationResponse = serde_json::from_value(value)
            .map_err(|_| error_stack::report!(CheckoutFlowError::Verification))?;
        let nonce = match raw.nonce {
            Some(nonce) if !nonce.is_empty() => CredentialReference::new(nonce),
            _ => return Err(error_stack::report!(CheckoutFlowError::Verification)),
        };
        Ok(Self {
            nonce,
            liability_shifted: raw.liability_shifted,
            card_type: raw.card_type,
        })
    }
}
