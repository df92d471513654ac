//! Crate-wide constants

/// Identifier of the hosted-fields card method, used to derive the ajax
/// action names the server routes on.
pub const CARD_PAYMENT_METHOD_ID: &str = "braintree_credit_card";

/// Identifier of the wallet (redirect/popup) method.
pub const WALLET_PAYMENT_METHOD_ID: &str = "braintree_paypal";

/// Step-up verification protocol version requested from the SDK.
pub const THREE_DS_VERSION: u32 = 2;

/// SDK error code for a tokenize attempt with all fields empty.
pub const HOSTED_FIELDS_FIELDS_EMPTY: &str = "HOSTED_FIELDS_FIELDS_EMPTY";

/// SDK error code for a tokenize attempt with invalid field contents.
pub const HOSTED_FIELDS_FIELDS_INVALID: &str = "HOSTED_FIELDS_FIELDS_INVALID";
