//! Host-checkout event wiring.
//!
//! The host checkout emits a processing event when the shopper submits
//! and an after-processing event once the server answered. Subscriptions
//! are scoped: dropping the guard (and thus the session) unsubscribes, so
//! a dismounted form never handles another submission.

use std::{future::Future, pin::Pin, sync::Arc};

use domain_types::processing::{
    AfterProcessingOutcome, AfterProcessingResponse, PaymentStatus, ProcessingResult,
};

use crate::pipeline::PaymentProcessingPipeline;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

pub type ProcessingHandler = Box<dyn Fn() -> BoxFuture<ProcessingResult> + Send + Sync>;

pub type AfterProcessingHandler =
    Box<dyn Fn(&AfterProcessingResponse) -> AfterProcessingOutcome + Send + Sync>;

/// Host-side event registry. The returned guards are the only way to
/// unsubscribe; implementations must drop the handler when the guard's
/// closure runs.
pub trait EventRegistration: Send + Sync {
    fn on_payment_processing(&self, handler: ProcessingHandler) -> SubscriptionGuard;

    fn on_checkout_after_processing(&self, handler: AfterProcessingHandler) -> SubscriptionGuard;
}

/// Unsubscribes on drop.
pub struct SubscriptionGuard {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionGuard {
    pub fn new(unsubscribe: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            unsubscribe: Some(unsubscribe),
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

/// Interpret the server's after-processing status. A failure status with
/// a failure result and a message is surfaced to the shopper and left
/// retryable; anything else is the server's to handle.
pub fn check_after_processing(response: &AfterProcessingResponse) -> AfterProcessingOutcome {
    if response.payment_status == PaymentStatus::Fail
        && response.payment_details.result == Some(PaymentStatus::Fail)
    {
        if let Some(message) = &response.payment_details.message {
            if !message.is_empty() {
                return AfterProcessingOutcome::Failure {
                    message: message.clone(),
                    retry: true,
                };
            }
        }
    }
    AfterProcessingOutcome::Success
}

/// One rendered payment method's tie-in to the host checkout, alive
/// exactly as long as the form is mounted.
pub struct CheckoutSession {
    _subscriptions: Vec<SubscriptionGuard>,
}

impl CheckoutSession {
    pub fn attach(
        registration: &dyn EventRegistration,
        pipeline: Arc<PaymentProcessingPipeline>,
    ) -> Self {
        let processing = registration.on_payment_processing(Box::new(move || {
            let pipeline = Arc::clone(&pipeline);
            Box::pin(async move { pipeline.process().await })
        }));
        let after_processing = registration
            .on_checkout_after_processing(Box::new(|response| check_after_processing(response)));
        Self {
            _subscriptions: vec![processing, after_processing],
        }
    }
}
