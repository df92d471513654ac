//! Host-checkout state handed to the payment form.
//!
//! These mirror the billing/shipping blocks the host checkout exposes at
//! submission time. They are inputs only; nothing here is stored.

use common_utils::types::{Currency, MinorUnit};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingData {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address_1: String,
    #[serde(default)]
    pub address_2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address_1: String,
    #[serde(default)]
    pub address_2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub country: String,
}

/// Billing block: cart total in minor units plus the payer's details.
#[derive(Debug, Clone)]
pub struct Billing {
    pub cart_total: MinorUnit,
    pub currency: Currency,
    pub billing_data: BillingData,
}

#[derive(Debug, Clone, Default)]
pub struct ShippingData {
    pub shipping_address: ShippingAddress,
    pub needs_shipping: bool,
}
