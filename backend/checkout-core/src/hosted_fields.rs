//! Isolated card-field integration.
//!
//! Owns the SDK's hosted-fields handle: builds its field/style options,
//! relays typed field events to the host, and captures the field contents
//! into a validated [`CapturedCredential`].

use std::sync::Arc;

use common_utils::{consts as common_consts, CustomResult};
use domain_types::{
    config::CardConfig,
    errors::CheckoutFlowError,
    payment::CapturedCredential,
    utils::ForeignTryFrom,
};
use error_stack::report;
use interfaces::{
    events::{FieldEvent, FieldEventObserver},
    sdk::{FieldOptions, HostedFieldsHandle, HostedFieldsOptions, HostedFieldsSelection, SdkClient},
};
use serde_json::json;

const NUMBER_SELECTOR: &str = "#wc-braintree-credit-card-account-number-hosted";
const EXPIRY_SELECTOR: &str = "#wc-braintree-credit-card-expiry-hosted";
const CSC_SELECTOR: &str = "#wc-braintree-credit-card-csc-hosted";
const TOKEN_CSC_SELECTOR: &str = "#wc-braintree-credit-card-token-csc-hosted";

const NUMBER_PLACEHOLDER: &str = "\u{2022}\u{2022}\u{2022}\u{2022} \u{2022}\u{2022}\u{2022}\u{2022} \u{2022}\u{2022}\u{2022}\u{2022} \u{2022}\u{2022}\u{2022}\u{2022}";
const EXPIRY_PLACEHOLDER: &str = "MM / YY";
const CSC_PLACEHOLDER: &str = "CSC";

/// Merge the merchant style block with the base field styles. The base
/// keys win so the fields stay legible whatever the merchant configured.
fn field_styles(config: &CardConfig) -> serde_json::Value {
    let mut styles = match &config.hosted_fields_styles {
        serde_json::Value::Object(merchant) => merchant.clone(),
        _ => serde_json::Map::new(),
    };
    styles.insert(
        "input".to_string(),
        json!({ "font-size": "16px", "line-height": 1.375 }),
    );
    styles.insert("::placeholder".to_string(), json!({ "color": "transparent" }));
    styles.insert(":focus::placeholder".to_string(), json!({ "color": "#757575" }));
    styles.insert(".invalid".to_string(), json!({ "color": "#cc1818" }));
    serde_json::Value::Object(styles)
}

/// Build the hosted-fields options for one integration. With a saved
/// instrument only the security-code field is rendered; number and expiry
/// stay with the vault.
pub fn field_options(config: &CardConfig, using_token: bool) -> HostedFieldsOptions {
    let mut fields = HostedFieldsSelection::default();
    if !using_token {
        fields.number = Some(FieldOptions {
            selector: NUMBER_SELECTOR.to_string(),
            placeholder: NUMBER_PLACEHOLDER.to_string(),
        });
        fields.expiration_date = Some(FieldOptions {
            selector: EXPIRY_SELECTOR.to_string(),
            placeholder: EXPIRY_PLACEHOLDER.to_string(),
        });
    }
    if config.csc_required {
        fields.cvv = Some(FieldOptions {
            selector: if using_token {
                TOKEN_CSC_SELECTOR.to_string()
            } else {
                CSC_SELECTOR.to_string()
            },
            placeholder: CSC_PLACEHOLDER.to_string(),
        });
    }
    HostedFieldsOptions {
        styles: field_styles(config),
        fields,
    }
}

/// What a card-type-change event means for the current number input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardTypeIndication {
    /// Exactly one candidate remains and the merchant accepts it.
    Matched(String),
    /// No candidate remains, or the single remaining type is not accepted.
    Invalid,
    /// The input still matches several types.
    Indeterminate,
}

/// Resolve the SDK's candidate list against the merchant's enabled card
/// types.
pub fn resolve_card_type(candidates: &[String], enabled_card_types: &[String]) -> CardTypeIndication {
    match candidates {
        [] => CardTypeIndication::Invalid,
        [only] if enabled_card_types.iter().any(|enabled| enabled == only) => {
            CardTypeIndication::Matched(only.clone())
        }
        [_only] => CardTypeIndication::Invalid,
        _ => CardTypeIndication::Indeterminate,
    }
}

/// Default observer wired in at setup: traces field activity and resolves
/// card-type changes so rejected types show up in the debug log.
pub struct FieldEventLogger {
    enabled_card_types: Vec<String>,
}

impl FieldEventLogger {
    pub fn new(enabled_card_types: Vec<String>) -> Self {
        Self { enabled_card_types }
    }
}

impl FieldEventObserver for FieldEventLogger {
    fn on_field_event(&self, event: &FieldEvent) {
        match event {
            FieldEvent::CardTypeChange { candidates } => {
                let indication = resolve_card_type(candidates, &self.enabled_card_types);
                tracing::debug!(?indication, "card type changed");
            }
            other => tracing::trace!(event = ?other, "field event"),
        }
    }
}

pub struct HostedFieldIntegration {
    handle: Option<Box<dyn HostedFieldsHandle>>,
}

impl HostedFieldIntegration {
    pub async fn new(
        client: &dyn SdkClient,
        config: &CardConfig,
        using_token: bool,
        observer: Arc<dyn FieldEventObserver>,
    ) -> CustomResult<Self, CheckoutFlowError> {
        let options = field_options(config, using_token);
        let mut handle = client
            .create_hosted_fields(options)
            .await
            .map_err(|sdk_error| {
                report!(CheckoutFlowError::Integration).attach_printable(sdk_error.to_string())
            })?;
        handle.subscribe(observer);
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Capture the current field contents. A rejected capture carries the
    /// raw SDK error so the pipeline boundary can classify it.
    pub async fn tokenize(&self) -> CustomResult<CapturedCredential, CheckoutFlowError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| report!(CheckoutFlowError::Integration))?;
        let response = handle.tokenize().await.map_err(|sdk_error| {
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
