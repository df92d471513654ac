//! Wallet (redirect/popup) checkout entities

use common_utils::StringMajorUnit;
use serde::Serialize;

/// How the wallet order is created: a one-off checkout or a vaulting
/// billing agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WalletFlow {
    Checkout,
    Vault,
}

/// Options for loading the wallet vendor SDK.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WalletSdkOptions {
    pub components: String,
    pub currency: String,
    pub intent: String,
    pub vault: bool,
    pub commit: bool,
    #[serde(rename = "enable-funding", skip_serializing_if = "Option::is_none")]
    pub enable_funding: Option<String>,
    #[serde(rename = "disable-funding", skip_serializing_if = "Option::is_none")]
    pub disable_funding: Option<String>,
    #[serde(rename = "buyer-country", skip_serializing_if = "Option::is_none")]
    pub buyer_country: Option<String>,
}

/// Order-creation request handed to the wallet checkout session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletOrderRequest {
    pub flow: WalletFlow,
    pub intent: String,
    pub amount: StringMajorUnit,
    pub currency: String,
    pub locale: String,
    pub enable_shipping_address: bool,
}
