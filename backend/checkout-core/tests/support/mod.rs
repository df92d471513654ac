//! Shared mocks for the submission-flow tests: a scripted ajax endpoint
//! and a scripted payment SDK whose handles record what was done to them.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use checkout_core::controller::CheckoutState;
use common_utils::{
    types::{Currency, MinorUnit},
    CustomResult, Secret,
};
use domain_types::{
    checkout::{Billing, BillingData, ShippingData},
    config::{CardConfig, WalletConfig},
    errors::TransportError,
    payment::DeviceData,
    sdk_error::SdkError,
    verification::VerifyCardRequest,
    wallet::{WalletOrderRequest, WalletSdkOptions},
};
use interfaces::{
    events::FieldEventObserver,
    sdk::{
        DataCollectorHandle, GatewayConfiguration, HostedFieldsHandle, HostedFieldsOptions,
        LookupCheckpoint, LookupObserver, PaymentSdk, SdkClient, SdkResult, ThreeDsHandle,
        WalletCheckoutHandle,
    },
    transport::AjaxTransport,
};
use serde_json::{json, Value};
use tokio::sync::Notify;

/// Scripted ajax endpoint, routing on the posted `action` field.
pub struct MockTransport {
    pub client_token_response: Value,
    pub token_data_response: Value,
    pub nonce_session_response: Value,
    /// When set, the nonce-session route fails at the transport level.
    pub nonce_session_failure: bool,
    /// When set, every request waits for a permit first.
    pub gate: Option<Arc<Notify>>,
    pub calls: Mutex<Vec<Vec<(String, String)>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            client_token_response: json!({ "success": true, "data": "client-token-1" }),
            token_data_response: json!({
                "success": true,
                "data": { "token": "tok1", "nonce": "n2", "bin": "411111" },
            }),
            nonce_session_response: json!({ "redirect_url": "https://shop.example/checkout" }),
            nonce_session_failure: false,
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockTransport {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AjaxTransport for MockTransport {
    async fn post_form(
        &self,
        _url: &str,
        fields: Vec<(String, String)>,
    ) -> CustomResult<Value, TransportError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let action = fields
            .iter()
            .find(|(key, _)| key == "action")
            .map(|(_, value)| value.clone())
            .unwrap_or_default();
        self.calls.lock().unwrap().push(fields);
        if action.ends_with("get_client_token") {
            Ok(self.client_token_response.clone())
        } else if action.ends_with("get_token_data") {
            Ok(self.token_data_response.clone())
        } else if self.nonce_session_failure {
            Err(error_stack::report!(TransportError::RequestFailed))
        } else {
            Ok(self.nonce_session_response.clone())
        }
    }
}

/// Everything the scripted SDK records and the responses it plays back.
pub struct SdkState {
    pub gateway_three_ds: AtomicBool,
    pub tokenize_response: Mutex<SdkResult<Value>>,
    pub verify_response: Mutex<SdkResult<Value>>,
    pub wallet_tokenize_response: Mutex<SdkResult<Value>>,
    pub device_data: Mutex<Option<DeviceData>>,
    pub clients_created: AtomicUsize,
    pub hosted_fields_options: Mutex<Vec<HostedFieldsOptions>>,
    pub wallet_sdk_options: Mutex<Vec<WalletSdkOptions>>,
    pub wallet_orders: Mutex<Vec<WalletOrderRequest>>,
    pub verify_requests: Mutex<Vec<Value>>,
    pub lookup_acks: Mutex<Vec<Arc<AtomicBool>>>,
    pub teardowns: AtomicUsize,
    /// When set, tokenize waits for a permit first.
    pub tokenize_gate: Mutex<Option<Arc<Notify>>>,
}

impl Default for SdkState {
    fn default() -> Self {
        Self {
            gateway_three_ds: AtomicBool::new(true),
            tokenize_response: Mutex::new(Ok(json!({
                "nonce": "n1",
                "details": { "bin": "401111", "cardType": "Visa" },
                "type": "CreditCard",
            }))),
            verify_response: Mutex::new(Ok(json!({
                "nonce": "n3",
                "liabilityShifted": true,
            }))),
            wallet_tokenize_response: Mutex::new(Ok(json!({
                "nonce": "wn1",
                "type": "PayPalAccount",
            }))),
            device_data: Mutex::new(None),
            clients_created: AtomicUsize::new(0),
            hosted_fields_options: Mutex::new(Vec::new()),
            wallet_sdk_options: Mutex::new(Vec::new()),
            wallet_orders: Mutex::new(Vec::new()),
            verify_requests: Mutex::new(Vec::new()),
            lookup_acks: Mutex::new(Vec::new()),
            teardowns: AtomicUsize::new(0),
            tokenize_gate: Mutex::new(None),
        }
    }
}

impl SdkState {
    pub fn set_tokenize_error(&self, error: SdkError) {
        *self.tokenize_response.lock().unwrap() = Err(error);
    }

    pub fn set_verify_response(&self, response: Value) {
        *self.verify_response.lock().unwrap() = Ok(response);
    }

    pub fn set_verify_error(&self, error: SdkError) {
        *self.verify_response.lock().unwrap() = Err(error);
    }

    pub fn lookup_fully_acknowledged(&self) -> bool {
        let acks = self.lookup_acks.lock().unwrap();
        !acks.is_empty() && acks.iter().all(|ack| ack.load(Ordering::SeqCst))
    }
}

pub struct MockSdk {
    pub state: Arc<SdkState>,
    pub supports_three_ds: bool,
    pub supports_collector: bool,
    pub supports_wallet: bool,
}

impl MockSdk {
    pub fn card(state: Arc<SdkState>) -> Self {
        Self {
            state,
            supports_three_ds: true,
            supports_collector: true,
            supports_wallet: false,
        }
    }

    pub fn wallet(state: Arc<SdkState>) -> Self {
        Self {
            state,
            supports_three_ds: false,
            supports_collector: true,
            supports_wallet: true,
        }
    }
}

#[async_trait]
impl PaymentSdk for MockSdk {
    async fn create_client(&self, _authorization: Secret<String>) -> SdkResult<Arc<dyn SdkClient>> {
        self.state.clients_created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockClient {
            state: Arc::clone(&self.state),
        }))
    }

    fn supports_three_d_secure(&self) -> bool {
        self.supports_three_ds
    }

    fn supports_data_collector(&self) -> bool {
        self.supports_collector
    }

    fn supports_wallet_checkout(&self) -> bool {
        self.supports_wallet
    }
}

struct MockClient {
    state: Arc<SdkState>,
}

#[async_trait]
impl SdkClient for MockClient {
    fn gateway_configuration(&self) -> GatewayConfiguration {
        GatewayConfiguration {
            three_d_secure_enabled: self.state.gateway_three_ds.load(Ordering::SeqCst),
        }
    }

    async fn create_hosted_fields(
        &self,
        options: HostedFieldsOptions,
    ) -> SdkResult<Box<dyn HostedFieldsHandle>> {
        self.state.hosted_fields_options.lock().unwrap().push(options);
        Ok(Box::new(MockHostedFields {
            state: Arc::clone(&self.state),
        }))
    }

    async fn create_data_collector(&self) -> SdkResult<Box<dyn DataCollectorHandle>> {
        Ok(Box::new(MockDataCollector {
            state: Arc::clone(&self.state),
        }))
    }

    async fn create_three_d_secure(&self, _version: u32) -> SdkResult<Box<dyn ThreeDsHandle>> {
        Ok(Box::new(MockThreeDs {
            state: Arc::clone(&self.state),
        }))
    }

    async fn create_wallet_checkout(&self) -> SdkResult<Box<dyn WalletCheckoutHandle>> {
        Ok(Box::new(MockWalletCheckout {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockHostedFields {
    state: Arc<SdkState>,
}

#[async_trait]
impl HostedFieldsHandle for MockHostedFields {
    fn subscribe(&mut self, _observer: Arc<dyn FieldEventObserver>) {}

    async fn tokenize(&self) -> SdkResult<Value> {
        let gate = self.state.tokenize_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.state.tokenize_response.lock().unwrap().clone()
    }

    async fn teardown(&mut self) {
        self.state.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockDataCollector {
    state: Arc<SdkState>,
}

#[async_trait]
impl DataCollectorHandle for MockDataCollector {
    fn device_data(&self) -> Option<DeviceData> {
        self.state.device_data.lock().unwrap().clone()
    }

    async fn teardown(&mut self) {
        self.state.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockThreeDs {
    state: Arc<SdkState>,
}

#[async_trait]
impl ThreeDsHandle for MockThreeDs {
    async fn verify_card(
        &self,
        request: VerifyCardRequest,
        lookup: Arc<dyn LookupObserver>,
    ) -> SdkResult<Value> {
        let (checkpoint, acknowledged) = LookupCheckpoint::new();
        lookup.on_lookup_complete(&json!({ "paymentMethod": {} }), checkpoint);
        self.state.lookup_acks.lock().unwrap().push(acknowledged);
        self.state
            .verify_requests
            .lock()
            .unwrap()
            .push(serde_json::to_value(&request).unwrap());
        self.state.verify_response.lock().unwrap().clone()
    }

    async fn teardown(&mut self) {
        self.state.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockWalletCheckout {
    state: Arc<SdkState>,
}

#[async_trait]
impl WalletCheckoutHandle for MockWalletCheckout {
    async fn load_sdk(&self, options: WalletSdkOptions) -> SdkResult<()> {
        self.state.wallet_sdk_options.lock().unwrap().push(options);
        Ok(())
    }

    async fn create_payment(&self, request: WalletOrderRequest) -> SdkResult<Value> {
        self.state.wallet_orders.lock().unwrap().push(request);
        Ok(json!({ "orderId": "order-1" }))
    }

    async fn tokenize_payment(&self, _approval: Value) -> SdkResult<Value> {
        self.state.wallet_tokenize_response.lock().unwrap().clone()
    }

    async fn teardown(&mut self) {
        self.state.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

fn merge(base: &mut Value, overrides: Value) {
    if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
        for (key, value) in overrides {
            base.insert(key.clone(), value.clone());
        }
    }
}

pub fn card_config(overrides: Value) -> Arc<CardConfig> {
    let mut settings = json!({
        "ajax_url": "https://shop.example/ajax",
        "integration_error_message": "The payment form failed to load",
        "payment_error_message": "Payment failed, please try again",
    });
    merge(&mut settings, overrides);
    Arc::new(CardConfig::from_settings(Some(settings)).unwrap())
}

pub fn wallet_config(overrides: Value) -> Arc<WalletConfig> {
    let mut settings = json!({
        "ajax_url": "https://shop.example/ajax",
        "cart_handler_url": "https://shop.example/cart-handler",
        "integration_error_message": "The payment form failed to load",
        "payment_error_message": "Payment failed, please try again",
        "paypal_intent": "authorize",
        "is_paypal_card_enabled": true,
    });
    merge(&mut settings, overrides);
    Arc::new(WalletConfig::from_settings(Some(settings)).unwrap())
}

pub fn checkout_state() -> CheckoutState {
    CheckoutState {
        billing: Billing {
            cart_total: MinorUnit::new(1099),
            currency: Currency::new("USD", 2),
            billing_data: BillingData {
                email: "shopper@example.com".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                state: "CA".to_string(),
                country: "US".to_string(),
                ..BillingData::default()
            },
        },
        shipping: ShippingData::default(),
    }
}
