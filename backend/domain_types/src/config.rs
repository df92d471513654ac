//! Server-provided configuration snapshots.
//!
//! The host passes each payment method one settings value at startup. The
//! snapshot is deserialized once, shared by reference afterwards and never
//! mutated; there is no hidden global cache.

use std::collections::HashMap;

use common_utils::{CustomResult, Secret};
use error_stack::{report, ResultExt};
use serde::Deserialize;

use crate::errors::ConfigError;

fn default_true() -> bool {
    true
}

fn default_unknown_error() -> String {
    "Unknown error".to_string()
}

fn default_wallet_locale() -> String {
    "en_us".to_string()
}

/// Step-up verification settings for the card method.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreeDsConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Card types eligible for step-up verification.
    #[serde(default)]
    pub card_types: Vec<String>,
    #[serde(default)]
    pub liability_shift_always_required: bool,
    /// Contractual decline wording, surfaced verbatim.
    #[serde(default = "default_unknown_error")]
    pub liability_shift_message: String,
}

/// Configuration snapshot for the hosted-fields card method.
#[derive(Debug, Clone, Deserialize)]
pub struct CardConfig {
    #[serde(default)]
    pub ajax_url: String,
    #[serde(default)]
    pub client_token_nonce: Secret<String>,
    #[serde(default)]
    pub token_data_nonce: Secret<String>,
    #[serde(default)]
    pub debug: bool,
    /// Whether the security code must be collected even for saved cards.
    #[serde(default = "default_true")]
    pub csc_required: bool,
    #[serde(default)]
    pub enabled_card_types: Vec<String>,
    /// Message templates keyed by `card_<field>_<reason>`.
    #[serde(default)]
    pub fields_error_messages: HashMap<String, String>,
    /// Opaque style block forwarded to the hosted-fields SDK.
    #[serde(default)]
    pub hosted_fields_styles: serde_json::Value,
    #[serde(default = "default_unknown_error")]
    pub integration_error_message: String,
    #[serde(default = "default_unknown_error")]
    pub payment_error_message: String,
    #[serde(default)]
    pub is_test_environment: bool,
    #[serde(default)]
    pub is_advanced_fraud_tool: bool,
    #[serde(default)]
    pub tokenization_forced: bool,
    #[serde(default)]
    pub cart_contains_subscription: bool,
    /// Recurring order total, used for verification when the cart total is
    /// zero (e.g. a free trial).
    #[serde(default)]
    pub order_total_for_3ds: f64,
    #[serde(default)]
    pub threeds: ThreeDsConfig,
    #[serde(default)]
    pub show_saved_cards: bool,
    #[serde(default)]
    pub show_save_option: bool,
}

/// Configuration snapshot for the wallet (redirect/popup) method.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    #[serde(default)]
    pub ajax_url: String,
    #[serde(default)]
    pub client_token_nonce: Secret<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_unknown_error")]
    pub integration_error_message: String,
    #[serde(default = "default_unknown_error")]
    pub payment_error_message: String,
    #[serde(default)]
    pub is_test_environment: bool,
    #[serde(default)]
    pub tokenization_forced: bool,
    /// Opaque style block forwarded to the wallet button renderer.
    #[serde(default)]
    pub button_styles: serde_json::Value,
    #[serde(default)]
    pub paypal_intent: String,
    #[serde(default = "default_wallet_locale")]
    pub paypal_locale: String,
    #[serde(default)]
    pub is_paypal_pay_later_enabled: bool,
    #[serde(default)]
    pub is_paypal_card_enabled: bool,
    #[serde(default)]
    pub paypal_disabled_funding_options: Vec<String>,
    #[serde(default)]
    pub force_buyer_country: String,
    /// Wallet nonce captured earlier in the cart (express checkout).
    #[serde(default)]
    pub cart_payment_nonce: String,
    #[serde(default)]
    pub cart_handler_url: String,
    #[serde(default)]
    pub set_payment_method_nonce: Secret<String>,
    #[serde(default)]
    pub is_checkout_confirmation: bool,
    #[serde(default)]
    pub show_saved_cards: bool,
    #[serde(default)]
    pub show_save_option: bool,
}

fn parse_settings<T: serde::de::DeserializeOwned>(
    settings: Option<serde_json::Value>,
) -> CustomResult<T, ConfigError> {
    let value = settings.ok_or_else(|| report!(ConfigError::NotAvailable))?;
    serde_json::from_value(value).change_context(ConfigError::ParsingFailed)
}

impl CardConfig {
    /// Build the snapshot from the host-provided settings value. Absence
    /// of the value is a hard initialization error.
    pub fn from_settings(settings: Option<serde_json::Value>) -> CustomResult<Self, ConfigError> {
        parse_settings(settings)
    }

    pub fn offers_saved_cards(&self) -> bool {
        self.show_saved_cards
    }

    /// Whether the shopper is shown a save-for-later choice. Forced
    /// vaulting saves the instrument regardless, so no choice is shown.
    pub fn offers_save_choice(&self) -> bool {
        self.show_save_option && !self.tokenization_forced
    }
}

impl WalletConfig {
    pub fn from_settings(settings: Option<serde_json::Value>) -> CustomResult<Self, ConfigError> {
        parse_settings(settings)
    }

    /// Saved wallet accounts are hidden on the checkout confirmation page.
    pub fn offers_saved_accounts(&self) -> bool {
        self.show_saved_cards && !self.is_checkout_confirmation
    }

    pub fn offers_save_choice(&self) -> bool {
        self.show_save_option && !self.tokenization_forced
    }
}
