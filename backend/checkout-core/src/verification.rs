//! Step-up (3-D Secure) verification.
//!
//! Builds the billing/shipping context for one verification call and
//! drives the provider handle. Provider rejections propagate unchanged;
//! decline-message selection is the pipeline's business.

use std::sync::Arc;

use common_utils::{AmountConvertor, CustomResult, StringMajorUnit, StringMajorUnitForCore};
use domain_types::{
    checkout::{Billing, ShippingData},
    config::CardConfig,
    errors::CheckoutFlowError,
    payment::CredentialReference,
    utils::ForeignTryFrom,
    verification::{
        AdditionalInformation, VerificationBillingAddress, VerificationContext,
        VerificationResult, VerificationShippingAddress, VerifyCardRequest,
    },
};
use error_stack::{report, ResultExt};
use interfaces::sdk::{LookupCheckpoint, LookupObserver, ThreeDsHandle};

/// The provider only accepts two-letter region/country codes; anything
/// longer is dropped rather than rejected.
fn short_code(value: &str) -> String {
    if value.len() <= 2 {
        value.to_string()
    } else {
        String::new()
    }
}

/// Assemble the verification context from the checkout state at
/// submission time.
pub fn build_verification_context(
    config: &CardConfig,
    billing: &Billing,
    shipping: &ShippingData,
) -> CustomResult<VerificationContext, CheckoutFlowError> {
    let mut amount = StringMajorUnitForCore
        .convert(billing.cart_total, &billing.currency)
        .change_context(CheckoutFlowError::Unknown)?;
    let mut challenge_requested = None;
    if config.cart_contains_subscription {
        challenge_requested = Some(true);
        // A free-trial cart verifies against the recurring total instead
        // of the zero cart total.
        if amount.is_zero() && config.order_total_for_3ds > 0.0 {
            amount = StringMajorUnit::new(format!("{:.2}", config.order_total_for_3ds));
        }
    }
    let payer = &billing.billing_data;
    let shipping_address = &shipping.shipping_address;
    Ok(VerificationContext {
        amount,
        email: payer.email.clone(),
        billing_address: VerificationBillingAddress {
            given_name: payer.first_name.clone(),
            surname: payer.last_name.clone(),
            phone_number: payer.phone.clone(),
            street_address: payer.address_1.clone(),
            extended_address: payer.address_2.clone(),
            locality: payer.city.clone(),
            region: short_code(&payer.state),
            postal_code: payer.postcode.clone(),
            country_code_alpha2: short_code(&payer.country),
        },
        additional_information: AdditionalInformation {
            shipping_given_name: shipping_address.first_name.clone(),
            shipping_surname: shipping_address.last_name.clone(),
            shipping_phone: shipping_address.phone.clone(),
            shipping_address: VerificationShippingAddress {
                street_address: shipping_address.address_1.clone(),
                extended_address: shipping_address.address_2.clone(),
                locality: shipping_address.city.clone(),
                region: short_code(&shipping_address.state),
                postal_code: shipping_address.postcode.clone(),
                country_code_alpha2: short_code(&shipping_address.country),
            },
        },
        challenge_requested,
    })
}

/// Acknowledges the provider's lookup checkpoint. The provider blocks
/// until `proceed` is called, so this must fire exactly once per lookup.
struct LookupAck;

impl LookupObserver for LookupAck {
    fn on_lookup_complete(&self, data: &serde_json::Value, checkpoint: LookupCheckpoint) {
        tracing::debug!(lookup = ?data.get("paymentMethod"), "verification lookup complete");
        checkpoint.proceed();
    }
}

pub struct VerificationOrchestrator {
    handle: Option<Box<dyn ThreeDsHandle>>,
}

impl VerificationOrchestrator {
    pub fn new(handle: Box<dyn ThreeDsHandle>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Run one verification over the given credential. The raw provider
    /// response is validated into a [`VerificationResult`] before anything
    /// downstream sees it.
    pub async fn verify(
        &self,
        context: VerificationContext,
        nonce: CredentialReference,
        bin: String,
    ) -> CustomResult<VerificationResult, CheckoutFlowError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| report!(CheckoutFlowError::Verification))?;
        let request = VerifyCardRequest {
            context,
            nonce,
            bin,
        };
        let response = handle
            .verify_card(request, Arc::new(LookupAck))
            .await
            .map_err(|sdk_error| report!(CheckoutFlowError::Verification).attach(sdk_error))?;
        VerificationResult::foreign_try_from(response)
    }

    pub async fn teardown(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.teardown().await;
        }
    }
}
