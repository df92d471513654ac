//! Wallet (redirect/popup) checkout integration.
//!
//! Owns the wallet checkout handle: computes the vendor SDK options and
//! order request from the configuration snapshot, exchanges an approval
//! for a captured credential, and tears the session down with the rest of
//! the integration.

use common_utils::{consts as common_consts, CustomResult, StringMajorUnit};
use domain_types::{
    config::WalletConfig,
    errors::CheckoutFlowError,
    payment::CapturedCredential,
    utils::ForeignTryFrom,
    wallet::{WalletFlow, WalletOrderRequest, WalletSdkOptions},
};
use error_stack::report;
use interfaces::sdk::{SdkClient, WalletCheckoutHandle};

/// Intent used for vaulting orders regardless of the configured one-off
/// intent.
const VAULT_INTENT: &str = "tokenize";

fn intent(config: &WalletConfig, single_use: bool) -> String {
    if single_use {
        config.paypal_intent.clone()
    } else {
        VAULT_INTENT.to_string()
    }
}

/// Options for loading the wallet vendor SDK. Express buttons do not
/// commit the order; the shopper still reviews it on the checkout page.
pub fn sdk_options(
    config: &WalletConfig,
    currency_code: &str,
    single_use: bool,
    is_express: bool,
) -> WalletSdkOptions {
    let components = if config.is_paypal_pay_later_enabled {
        "buttons,messages"
    } else {
        "buttons"
    };
    let enable_funding = config
        .is_paypal_pay_later_enabled
        .then(|| "paylater".to_string());
    let mut disabled = config.paypal_disabled_funding_options.clone();
    if !config.is_paypal_card_enabled {
        disabled.push("card".to_string());
    }
    if !config.is_paypal_pay_later_enabled {
        disabled.push("paylater".to_string());
    }
    let disable_funding = (!disabled.is_empty()).then(|| disabled.join(","));
    let buyer_country = (!config.force_buyer_country.is_empty())
        .then(|| config.force_buyer_country.clone());
    WalletSdkOptions {
        components: components.to_string(),
        currency: currency_code.to_string(),
        intent: intent(config, single_use),
        vault: !single_use,
        commit: !is_express,
        enable_funding,
        disable_funding,
        buyer_country,
    }
}

/// Order-creation request for one approval popup.
pub fn order_request(
    config: &WalletConfig,
    amount: StringMajorUnit,
    currency_code: &str,
    single_use: bool,
    needs_shipping: bool,
) -> WalletOrderRequest {
    WalletOrderRequest {
        flow: if single_use {
            WalletFlow::Checkout
        } else {
            WalletFlow::Vault
        },
        intent: intent(config, single_use),
        amount,
        currency: currency_code.to_string(),
        locale: config.paypal_locale.clone(),
        enable_shipping_address: needs_shipping,
    }
}

pub struct WalletIntegration {
    handle: Option<Box<dyn WalletCheckoutHandle>>,
}

impl WalletIntegration {
    /// Create the checkout session and load the vendor SDK into it.
    pub async fn new(
        client: &dyn SdkClient,
        options: WalletSdkOptions,
    ) -> CustomResult<Self, CheckoutFlowError> {
        let mut handle = client.create_wallet_checkout().await.map_err(|sdk_error| {
            report!(CheckoutFlowError::Integration).attach_printable(sdk_error.to_string())
        })?;
        if let Err(sdk_error) = handle.load_sdk(options).await {
            handle.teardown().await;
            return Err(
                report!(CheckoutFlowError::Integration).attach_printable(sdk_error.to_string())
            );
        }
        Ok(Self {
            handle: Some(handle),
        })
    }

    fn live_handle(&self) -> CustomResult<&dyn WalletCheckoutHandle, CheckoutFlowError> {
        self.handle
            .as_deref()
            .ok_or_else(|| report!(CheckoutFlowError::Integration))
    }

    /// Create the wallet order backing the approval popup. The returned
    /// value is the vendor's order identifier, opaque to this crate.
    pub async fn create_order(
        &self,
        request: WalletOrderRequest,
    ) -> CustomResult<serde_json::Value, CheckoutFlowError> {
        self.live_handle()?
            .create_payment(request)
            .await
            .map_err(|sdk_error| {
                let message = sdk_error
                    .message
                    .clone()
                    .unwrap_or_else(|| common_consts::NO_ERROR_MESSAGE.to_string());
                report!(CheckoutFlowError::CredentialCapture { message }).attach(sdk_error)
            })
    }

    /// Exchange the shopper's approval for a captured credential.
    pub async fn tokenize_approval(
        &self,
        approval: serde_json::Value,
    ) -> CustomResult<CapturedCredential, CheckoutFlowError> {
        let response = self
            .live_handle()?
            .tokenize_payment(approval)
            .await
            .map_err(|sdk_error| {
                let message = sdk_error
                    .message
                    .clone()
                    .unwrap_or_else(|| common_consts::NO_ERROR_MESSAGE.to_string());
                report!(CheckoutFlowError::CredentialCapture { message }).attach(sdk_error)
            })?;
        CapturedCredential::foreign_try_from(response)
    }

    pub async fn teardown(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.teardown().await;
        }
    }
}
