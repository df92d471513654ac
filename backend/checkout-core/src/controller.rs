//! Per-payment-method form controllers.
//!
//! A controller owns the integration lifecycle of one rendered payment
//! method: `Idle -> Integrating -> Ready | Failed`, back to `Idle` on
//! teardown. Setup is re-entrancy-guarded, teardown is idempotent, and a
//! disposal flag keeps late async completions from resurrecting a torn
//! down form.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex as StdMutex,
};

use async_trait::async_trait;
use common_utils::{AmountConvertor, CustomResult, StringMajorUnit, StringMajorUnitForCore};
use domain_types::{
    checkout::{Billing, ShippingData},
    config::{CardConfig, ThreeDsConfig, WalletConfig},
    errors::CheckoutFlowError,
    payload::PaymentMethodPayload,
    payment::{CapturedCredential, CredentialReference, PaymentMethodKind, SavedInstrumentData},
    sdk_error::SdkError,
    verification::VerificationResult,
};
use error_stack::report;
use interfaces::{
    sdk::{DataCollectorHandle, PaymentSdk, SdkClient},
    transport::AjaxTransport,
};
use tokio::sync::Mutex;

use crate::{
    bridge::ClientTokenBridge,
    classifier::ErrorClassifier,
    consts,
    hosted_fields::{FieldEventLogger, HostedFieldIntegration},
    verification::{build_verification_context, VerificationOrchestrator},
    wallet::{self, WalletIntegration},
};

/// Live SDK handles of one integrated form. Dropped handles are gone;
/// teardown goes through `take` so each handle is torn down exactly once.
#[derive(Default)]
pub struct IntegrationHandles {
    pub hosted_fields: Option<HostedFieldIntegration>,
    pub data_collector: Option<Box<dyn DataCollectorHandle>>,
    pub verification: Option<VerificationOrchestrator>,
    pub wallet: Option<WalletIntegration>,
}

impl IntegrationHandles {
    pub async fn teardown(&mut self) {
        if let Some(mut hosted_fields) = self.hosted_fields.take() {
            hosted_fields.teardown().await;
        }
        if let Some(mut collector) = self.data_collector.take() {
            collector.teardown().await;
        }
        if let Some(mut verification) = self.verification.take() {
            verification.teardown().await;
        }
        if let Some(mut wallet) = self.wallet.take() {
            wallet.teardown().await;
        }
    }
}

/// Lifecycle of one controller.
#[derive(Default)]
pub enum ControllerState {
    #[default]
    Idle,
    Integrating,
    Ready(IntegrationHandles),
    Failed,
}

/// Host-checkout state the controller reads at submission time.
#[derive(Debug, Clone)]
pub struct CheckoutState {
    pub billing: Billing,
    pub shipping: ShippingData,
}

/// The uniform contract the processing pipeline drives. Capability
/// methods default to the no-saved-instruments, no-verification case so a
/// form only overrides what it actually supports.
#[async_trait]
pub trait PaymentForm: Send + Sync {
    fn integration_error_message(&self) -> String;

    fn payment_error_message(&self) -> String;

    fn saved_instrument_token(&self) -> Option<String> {
        None
    }

    fn security_code_required(&self) -> bool {
        false
    }

    /// Step-up verification settings, when the method supports it at all.
    fn verification_settings(&self) -> Option<ThreeDsConfig> {
        None
    }

    /// Map a raw SDK error to a shopper-facing message. Empty means
    /// unclassifiable; the pipeline substitutes the generic message.
    fn classify_sdk_error(&self, _error: &SdkError, _using_token: bool) -> String {
        String::new()
    }

    async fn has_live_integration(&self) -> bool;

    /// Whether a verification session was actually created at setup.
    async fn verification_available(&self) -> bool {
        false
    }

    /// Capture a fresh credential: hosted-field tokenize or wallet
    /// approval.
    async fn capture_credential(&self) -> CustomResult<CapturedCredential, CheckoutFlowError>;

    async fn lookup_saved_instrument(
        &self,
    ) -> CustomResult<Option<SavedInstrumentData>, CheckoutFlowError> {
        Ok(None)
    }

    async fn verify(
        &self,
        _nonce: CredentialReference,
        _bin: String,
    ) -> CustomResult<VerificationResult, CheckoutFlowError> {
        Err(report!(CheckoutFlowError::Verification))
    }

    /// The method-owned part of the outgoing payload. Instrument identity
    /// and verification flags are filled in by the pipeline.
    fn payment_method_data(&self) -> PaymentMethodPayload;
}

/// Controller of the hosted-fields card form.
pub struct CardFormController {
    config: Arc<CardConfig>,
    sdk: Arc<dyn PaymentSdk>,
    bridge: ClientTokenBridge,
    state: Mutex<ControllerState>,
    disposed: AtomicBool,
    device_data: StdMutex<Option<domain_types::payment::DeviceData>>,
    test_amount: StdMutex<Option<StringMajorUnit>>,
    checkout_state: StdMutex<CheckoutState>,
    /// Vaulted instrument backing this form instance, if any.
    saved_token: Option<String>,
    save_payment: AtomicBool,
}

impl CardFormController {
    pub fn new(
        config: Arc<CardConfig>,
        sdk: Arc<dyn PaymentSdk>,
        transport: Arc<dyn AjaxTransport>,
        saved_token: Option<String>,
        checkout_state: CheckoutState,
    ) -> Self {
        Self {
            config,
            sdk,
            bridge: ClientTokenBridge::new(transport),
            state: Mutex::new(ControllerState::Idle),
            disposed: AtomicBool::new(false),
            device_data: StdMutex::new(None),
            test_amount: StdMutex::new(None),
            checkout_state: StdMutex::new(checkout_state),
            saved_token,
            save_payment: AtomicBool::new(false),
        }
    }

    fn using_token(&self) -> bool {
        self.saved_token.is_some()
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// A credential stays single-use unless the shopper opted to save it
    /// or the merchant forces vaulting (e.g. subscriptions).
    fn is_single_use(&self) -> bool {
        !self.save_payment.load(Ordering::SeqCst) && !self.config.tokenization_forced
    }

    pub fn set_save_payment(&self, save: bool) {
        self.save_payment.store(save, Ordering::SeqCst);
    }

    /// Forced-decline test amount, honored only against a test gateway.
    pub fn set_test_amount(&self, amount: Option<StringMajorUnit>) {
        if self.config.is_test_environment {
            *locked(&self.test_amount) = amount;
        }
    }

    pub fn update_checkout_state(&self, checkout_state: CheckoutState) {
        *locked(&self.checkout_state) = checkout_state;
    }

    /// Build the full integration: client token, SDK client, then one
    /// handle per enabled capability.
    pub async fn setup_integration(&self) -> CustomResult<(), CheckoutFlowError> {
        {
            let mut state = self.state.lock().await;
            if matches!(*state, ControllerState::Integrating) {
                return Err(report!(CheckoutFlowError::SetupInFlight));
            }
            if let ControllerState::Ready(handles) = &mut *state {
                handles.teardown().await;
            }
            *state = ControllerState::Integrating;
        }
        match self.run_setup().await {
            Ok(mut handles) => {
                let mut state = self.state.lock().await;
                if self.is_disposed() {
                    handles.teardown().await;
                    *state = ControllerState::Idle;
                } else {
                    *state = ControllerState::Ready(handles);
                }
                Ok(())
            }
            Err(error) => {
                *self.state.lock().await = ControllerState::Failed;
                Err(error)
            }
        }
    }

    async fn run_setup(&self) -> CustomResult<IntegrationHandles, CheckoutFlowError> {
        let using_token = self.using_token();
        let client_token = self
            .bridge
            .get_client_token(
                &self.config.ajax_url,
                consts::CARD_PAYMENT_METHOD_ID,
                &self.config.client_token_nonce,
            )
            .await?;
        let client = self
            .sdk
            .create_client(client_token)
            .await
            .map_err(|sdk_error| {
                report!(CheckoutFlowError::Integration).attach_printable(sdk_error.to_string())
            })?;
        tracing::debug!(using_token, "payment sdk client ready");

        let mut handles = IntegrationHandles::default();
        // A saved card with no security code to collect needs no fields at
        // all.
        if !(using_token && !self.config.csc_required) {
            let observer = Arc::new(FieldEventLogger::new(
                self.config.enabled_card_types.clone(),
            ));
            match HostedFieldIntegration::new(
                client.as_ref(),
                &self.config,
                using_token,
                observer,
            )
            .await
            {
                Ok(integration) => handles.hosted_fields = Some(integration),
                Err(error) => {
                    handles.teardown().await;
                    return Err(error);
                }
            }
        }
        if self.config.is_advanced_fraud_tool && self.sdk.supports_data_collector() {
            match client.create_data_collector().await {
                Ok(collector) => {
                    if !self.is_disposed() {
                        *locked(&self.device_data) = collector.device_data();
                    }
                    handles.data_collector = Some(collector);
                }
                Err(sdk_error) => {
                    handles.teardown().await;
                    return Err(report!(CheckoutFlowError::Integration)
                        .attach_printable(sdk_error.to_string()));
                }
            }
        }
        if self.config.threeds.enabled && self.sdk.supports_three_d_secure() {
            // The merchant may have verification enabled while the gateway
            // account does not; no session is created then.
            if client.gateway_configuration().three_d_secure_enabled {
                match client.create_three_d_secure(consts::THREE_DS_VERSION).await {
                    Ok(handle) => {
                        handles.verification = Some(VerificationOrchestrator::new(handle))
                    }
                    Err(sdk_error) => {
                        handles.teardown().await;
                        return Err(report!(CheckoutFlowError::Integration)
                            .attach_printable(sdk_error.to_string()));
                    }
                }
            }
        }
        Ok(handles)
    }

    /// Release all live handles. Safe to call in any state, any number of
    /// times.
    pub async fn teardown(&self) {
        let mut state = self.state.lock().await;
        if let ControllerState::Ready(handles) = &mut *state {
            handles.teardown().await;
        }
        *state = ControllerState::Idle;
        *locked(&self.device_data) = None;
    }

    /// Teardown plus a liveness flag flip, so in-flight setup completions
    /// are dropped instead of applied.
    pub async fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.teardown().await;
    }
}

#[async_trait]
impl PaymentForm for CardFormController {
    fn integration_error_message(&self) -> String {
        self.config.integration_error_message.clone()
    }

    fn payment_error_message(&self) -> String {
        self.config.payment_error_message.clone()
    }

    fn saved_instrument_token(&self) -> Option<String> {
        self.saved_token.clone()
    }

    fn security_code_required(&self) -> bool {
        self.config.csc_required
    }

    fn verification_settings(&self) -> Option<ThreeDsConfig> {
        (self.config.threeds.enabled && self.sdk.supports_three_d_secure())
            .then(|| self.config.threeds.clone())
    }

    fn classify_sdk_error(&self, error: &SdkError, using_token: bool) -> String {
        ErrorClassifier::new(&self.config.fields_error_messages, self.config.csc_required)
            .classify(error, using_token)
    }

    async fn has_live_integration(&self) -> bool {
        matches!(
            &*self.state.lock().await,
            ControllerState::Ready(handles) if handles.hosted_fields.is_some()
        )
    }

    async fn verification_available(&self) -> bool {
        matches!(
            &*self.state.lock().await,
            ControllerState::Ready(handles) if handles.verification.is_some()
        )
    }

    async fn capture_credential(&self) -> CustomResult<CapturedCredential, CheckoutFlowError> {
        let state = self.state.lock().await;
        match &*state {
            ControllerState::Ready(handles) => match &handles.hosted_fields {
                Some(integration) => integration.tokenize().await,
                None => Err(report!(CheckoutFlowError::Integration)),
            },
            _ => Err(report!(CheckoutFlowError::Integration)),
        }
    }

    async fn lookup_saved_instrument(
        &self,
    ) -> CustomResult<Option<SavedInstrumentData>, CheckoutFlowError> {
        let token = match &self.saved_token {
            Some(token) => token,
            None => return Ok(None),
        };
        self.bridge
            .get_saved_instrument_data(
                &self.config.ajax_url,
                consts::CARD_PAYMENT_METHOD_ID,
                token,
                &self.config.token_data_nonce,
                &self.config.payment_error_message,
            )
            .await
            .map(Some)
    }

    async fn verify(
        &self,
        nonce: CredentialReference,
        bin: String,
    ) -> CustomResult<VerificationResult, CheckoutFlowError> {
        let context = {
            let checkout_state = locked(&self.checkout_state).clone();
            build_verification_context(
                &self.config,
                &checkout_state.billing,
                &checkout_state.shipping,
            )?
        };
        let state = self.state.lock().await;
        match &*state {
            ControllerState::Ready(handles) => match &handles.verification {
                Some(orchestrator) => orchestrator.verify(context, nonce, bin).await,
                None => Err(report!(CheckoutFlowError::Verification)),
            },
            _ => Err(report!(CheckoutFlowError::Verification)),
        }
    }

    fn payment_method_data(&self) -> PaymentMethodPayload {
        let mut payload = PaymentMethodPayload::default();
        payload.device_data = locked(&self.device_data).clone();
        if !self.is_single_use() {
            payload.tokenize_payment_method = true;
        }
        payload.test_amount = locked(&self.test_amount).clone();
        payload
    }
}

/// Where the host should take the shopper after a wallet approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletApprovalOutcome {
    /// Express checkout stored the nonce server-side; follow the redirect.
    Redirect(String),
    /// The nonce is held locally; the host submits the checkout form.
    Submit,
}

/// Controller of the wallet (redirect/popup) form.
pub struct WalletFormController {
    config: Arc<WalletConfig>,
    sdk: Arc<dyn PaymentSdk>,
    bridge: ClientTokenBridge,
    state: Mutex<ControllerState>,
    disposed: AtomicBool,
    device_data: StdMutex<Option<domain_types::payment::DeviceData>>,
    payment_nonce: StdMutex<Option<CredentialReference>>,
    checkout_state: StdMutex<CheckoutState>,
    saved_token: Option<String>,
    save_payment: AtomicBool,
    /// Express buttons live on the cart page and finish through a
    /// server-side nonce session rather than the checkout form.
    is_express: bool,
}

impl WalletFormController {
    pub fn new(
        config: Arc<WalletConfig>,
        sdk: Arc<dyn PaymentSdk>,
        transport: Arc<dyn AjaxTransport>,
        saved_token: Option<String>,
        checkout_state: CheckoutState,
        is_express: bool,
    ) -> Self {
        let payment_nonce = (!config.cart_payment_nonce.is_empty())
            .then(|| CredentialReference::new(config.cart_payment_nonce.clone()));
        Self {
            config,
            sdk,
            bridge: ClientTokenBridge::new(transport),
            state: Mutex::new(ControllerState::Idle),
            disposed: AtomicBool::new(false),
            device_data: StdMutex::new(None),
            payment_nonce: StdMutex::new(payment_nonce),
            checkout_state: StdMutex::new(checkout_state),
            saved_token,
            save_payment: AtomicBool::new(false),
            is_express,
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn is_single_use(&self) -> bool {
        !self.save_payment.load(Ordering::SeqCst) && !self.config.tokenization_forced
    }

    pub fn set_save_payment(&self, save: bool) {
        self.save_payment.store(save, Ordering::SeqCst);
    }

    pub fn update_checkout_state(&self, checkout_state: CheckoutState) {
        *locked(&self.checkout_state) = checkout_state;
    }

    fn currency_code(&self) -> String {
        locked(&self.checkout_state).billing.currency.code.clone()
    }

    pub async fn setup_integration(&self) -> CustomResult<(), CheckoutFlowError> {
        {
            let mut state = self.state.lock().await;
            if matches!(*state, ControllerState::Integrating) {
                return Err(report!(CheckoutFlowError::SetupInFlight));
            }
            if let ControllerState::Ready(handles) = &mut *state {
                handles.teardown().await;
            }
            *state = ControllerState::Integrating;
        }
        match self.run_setup().await {
            Ok(mut handles) => {
                let mut state = self.state.lock().await;
                if self.is_disposed() {
                    handles.teardown().await;
                    *state = ControllerState::Idle;
                } else {
                    *state = ControllerState::Ready(handles);
                }
                Ok(())
            }
            Err(error) => {
                *self.state.lock().await = ControllerState::Failed;
                Err(error)
            }
        }
    }

    async fn run_setup(&self) -> CustomResult<IntegrationHandles, CheckoutFlowError> {
        let client_token = self
            .bridge
            .get_client_token(
                &self.config.ajax_url,
                consts::WALLET_PAYMENT_METHOD_ID,
                &self.config.client_token_nonce,
            )
            .await?;
        let client = self
            .sdk
            .create_client(client_token)
            .await
            .map_err(|sdk_error| {
                report!(CheckoutFlowError::Integration).attach_printable(sdk_error.to_string())
            })?;
        if !self.sdk.supports_wallet_checkout() {
            return Err(report!(CheckoutFlowError::Integration)
                .attach_printable("wallet checkout is not supported by this sdk"));
        }

        let mut handles = IntegrationHandles::default();
        // Device data is best effort for the wallet; an unavailable fraud
        // tool must not block the buttons.
        if self.sdk.supports_data_collector() {
            match client.create_data_collector().await {
                Ok(collector) => {
                    if !self.is_disposed() {
                        *locked(&self.device_data) = collector.device_data();
                    }
                    handles.data_collector = Some(collector);
                }
                Err(sdk_error) => {
                    tracing::warn!(error = %sdk_error, "data collector unavailable");
                }
            }
        }
        let options = wallet::sdk_options(
            &self.config,
            &self.currency_code(),
            self.is_single_use(),
            self.is_express,
        );
        match WalletIntegration::new(client.as_ref(), options).await {
            Ok(integration) => handles.wallet = Some(integration),
            Err(error) => {
                handles.teardown().await;
                return Err(error);
            }
        }
        Ok(handles)
    }

    /// Create the order backing the approval popup, from the current cart
    /// totals.
    pub async fn create_order(&self) -> CustomResult<serde_json::Value, CheckoutFlowError> {
        let request = {
            let checkout_state = locked(&self.checkout_state).clone();
            let amount = StringMajorUnitForCore
                .convert(
                    checkout_state.billing.cart_total,
                    &checkout_state.billing.currency,
                )
                .map_err(|error| error.change_context(CheckoutFlowError::Unknown))?;
            wallet::order_request(
                &self.config,
                amount,
                &checkout_state.billing.currency.code,
                self.is_single_use(),
                checkout_state.shipping.needs_shipping,
            )
        };
        let state = self.state.lock().await;
        match &*state {
            ControllerState::Ready(handles) => match &handles.wallet {
                Some(integration) => integration.create_order(request).await,
                None => Err(report!(CheckoutFlowError::Integration)),
            },
            _ => Err(report!(CheckoutFlowError::Integration)),
        }
    }

    /// Exchange the shopper's approval for a nonce. Express approvals are
    /// pushed into the server-side cart session and answered with a
    /// redirect; regular approvals are held for form submission.
    pub async fn handle_approval(
        &self,
        approval: serde_json::Value,
    ) -> CustomResult<WalletApprovalOutcome, CheckoutFlowError> {
        let captured = {
            let state = self.state.lock().await;
            let result = match &*state {
                ControllerState::Ready(handles) => match &handles.wallet {
                    Some(integration) => integration.tokenize_approval(approval).await,
                    None => Err(report!(CheckoutFlowError::Integration)),
                },
                _ => Err(report!(CheckoutFlowError::Integration)),
            };
            match result {
                Ok(captured) => captured,
                Err(error) => {
                    *locked(&self.payment_nonce) = None;
                    return Err(error);
                }
            }
        };
        *locked(&self.payment_nonce) = Some(captured.nonce.clone());

        if !self.is_express {
            return Ok(WalletApprovalOutcome::Submit);
        }
        let payload = serde_json::json!({
            "payment_method_nonce": captured.nonce,
            "wp_nonce": common_utils::PeekInterface::peek(&self.config.set_payment_method_nonce),
        });
        let response = match self
            .bridge
            .set_payment_nonce_session(&self.config.cart_handler_url, &payload)
            .await
        {
            Ok(response) => response,
            // The nonce is single use; a failed session hand-off burns it.
            Err(error) => {
                *locked(&self.payment_nonce) = None;
                return Err(error);
            }
        };
        match response.get("redirect_url").and_then(|url| url.as_str()) {
            Some(url) if !url.is_empty() => Ok(WalletApprovalOutcome::Redirect(url.to_string())),
            _ => {
                *locked(&self.payment_nonce) = None;
                Err(report!(CheckoutFlowError::CredentialCapture {
                    message: self.config.payment_error_message.clone(),
                }))
            }
        }
    }

    /// Popup dismissed or vendor error: drop the captured nonce so a stale
    /// one cannot be submitted.
    pub fn handle_wallet_error(&self, error: &SdkError) {
        tracing::warn!(%error, "wallet approval failed");
        *locked(&self.payment_nonce) = None;
    }

    pub async fn teardown(&self) {
        let mut state = self.state.lock().await;
        if let ControllerState::Ready(handles) = &mut *state {
            handles.teardown().await;
        }
        *state = ControllerState::Idle;
        *locked(&self.device_data) = None;
    }

    pub async fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.teardown().await;
    }
}

#[async_trait]
impl PaymentForm for WalletFormController {
    fn integration_error_message(&self) -> String {
        self.config.integration_error_message.clone()
    }

    fn payment_error_message(&self) -> String {
        self.config.payment_error_message.clone()
    }

    fn saved_instrument_token(&self) -> Option<String> {
        self.saved_token.clone()
    }

    async fn has_live_integration(&self) -> bool {
        matches!(
            &*self.state.lock().await,
            ControllerState::Ready(handles) if handles.wallet.is_some()
        )
    }

    async fn capture_credential(&self) -> CustomResult<CapturedCredential, CheckoutFlowError> {
        match locked(&self.payment_nonce).clone() {
            Some(nonce) => Ok(CapturedCredential {
                nonce,
                bin: String::new(),
                card_type: None,
                kind: PaymentMethodKind::PayPalAccount,
            }),
            None => Err(report!(CheckoutFlowError::CredentialCapture {
                message: self.config.payment_error_message.clone(),
            })),
        }
    }

    fn payment_method_data(&self) -> PaymentMethodPayload {
        let mut payload = PaymentMethodPayload::default();
        payload.device_data = locked(&self.device_data).clone();
        if !self.is_single_use() {
            payload.tokenize_payment_method = true;
        }
        if let Some(token) = &self.saved_token {
            payload.set_saved_instrument(token.clone());
        }
        payload
    }
}

/// Lock a std mutex, recovering the guard if a writer panicked. State
/// behind these mutexes is plain data, valid at every assignment.
fn locked<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
