//! Payment-SDK trait seams.
//!
//! Handles returned by these traits are owned exclusively by one
//! controller, torn down exactly once and never used afterwards.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use common_utils::Secret;
use domain_types::{
    payment::DeviceData,
    sdk_error::SdkError,
    verification::VerifyCardRequest,
    wallet::{WalletOrderRequest, WalletSdkOptions},
};
use serde::Serialize;

use crate::events::FieldEventObserver;

pub type SdkResult<T> = Result<T, SdkError>;

/// Account-level gateway configuration reported by a live SDK client.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatewayConfiguration {
    pub three_d_secure_enabled: bool,
}

/// Entry point of the payment SDK. Capability probes default to `false`
/// so an implementation only opts into what it actually ships.
#[async_trait]
pub trait PaymentSdk: Send + Sync {
    /// Initialize a client from a short-lived client token.
    async fn create_client(
        &self,
        authorization: Secret<String>,
    ) -> SdkResult<Arc<dyn SdkClient>>;

    fn supports_three_d_secure(&self) -> bool {
        false
    }

    fn supports_data_collector(&self) -> bool {
        false
    }

    fn supports_wallet_checkout(&self) -> bool {
        false
    }
}

/// A live SDK client, used to construct the per-integration handles.
#[async_trait]
pub trait SdkClient: Send + Sync {
    fn gateway_configuration(&self) -> GatewayConfiguration;

    async fn create_hosted_fields(
        &self,
        options: HostedFieldsOptions,
    ) -> SdkResult<Box<dyn HostedFieldsHandle>>;

    async fn create_data_collector(&self) -> SdkResult<Box<dyn DataCollectorHandle>>;

    async fn create_three_d_secure(&self, version: u32) -> SdkResult<Box<dyn ThreeDsHandle>>;

    async fn create_wallet_checkout(&self) -> SdkResult<Box<dyn WalletCheckoutHandle>>;
}

/// Selector and placeholder of one isolated input field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldOptions {
    pub selector: String,
    pub placeholder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedFieldsSelection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<FieldOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<FieldOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvv: Option<FieldOptions>,
}

/// Everything the SDK needs to render the isolated fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostedFieldsOptions {
    pub styles: serde_json::Value,
    pub fields: HostedFieldsSelection,
}

#[async_trait]
pub trait HostedFieldsHandle: Send + Sync {
    /// Register the observer receiving typed field events.
    fn subscribe(&mut self, observer: Arc<dyn FieldEventObserver>);

    /// Capture the field contents into a single-use credential reference.
    /// The response shape is SDK-owned and validated by the caller.
    async fn tokenize(&self) -> SdkResult<serde_json::Value>;

    async fn teardown(&mut self);
}

#[async_trait]
pub trait DataCollectorHandle: Send + Sync {
    fn device_data(&self) -> Option<DeviceData>;

    async fn teardown(&mut self);
}

/// Exactly-once acknowledgement of the verification lookup checkpoint.
/// `proceed` consumes the token, so it cannot be acknowledged twice; the
/// provider hangs forever if it is never acknowledged at all.
#[derive(Debug)]
pub struct LookupCheckpoint {
    acknowledged: Arc<AtomicBool>,
}

impl LookupCheckpoint {
    pub fn new() -> (Self, Arc<AtomicBool>) {
        let acknowledged = Arc::new(AtomicBool::new(false));
        (
            Self {
                acknowledged: Arc::clone(&acknowledged),
            },
            acknowledged,
        )
    }

    pub fn proceed(self) {
        self.acknowledged.store(true, Ordering::SeqCst);
    }
}

/// Receives the lookup-completion callback during a verification call.
pub trait LookupObserver: Send + Sync {
    fn on_lookup_complete(&self, data: &serde_json::Value, checkpoint: LookupCheckpoint);
}

#[async_trait]
pub trait ThreeDsHandle: Send + Sync {
    /// Run a step-up verification. The handle invokes `lookup` once the
    /// lookup phase completes and waits for the checkpoint before
    /// continuing.
    async fn verify_card(
        &self,
        request: VerifyCardRequest,
        lookup: Arc<dyn LookupObserver>,
    ) -> SdkResult<serde_json::Value>;

    async fn teardown(&mut self);
}

#[async_trait]
pub trait WalletCheckoutHandle: Send + Sync {
    /// Load the wallet vendor SDK with the given options.
    async fn load_sdk(&self, options: WalletSdkOptions) -> SdkResult<()>;

    /// Create the wallet order/billing agreement for approval.
    async fn create_payment(&self, request: WalletOrderRequest) -> SdkResult<serde_json::Value>;

    /// Exchange an approval payload for a tokenized wallet payment.
    async fn tokenize_payment(&self, approval: serde_json::Value) -> SdkResult<serde_json::Value>;

    async fn teardown(&mut self);
}
