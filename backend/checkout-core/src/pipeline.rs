//! The staged submission pipeline.
//!
//! One submission attempt walks the stages below in order; every failure
//! funnels through a single boundary that maps it to a shopper-facing
//! [`ProcessingResult`]. At most one attempt runs at a time.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use common_utils::CustomResult;
use domain_types::{
    errors::CheckoutFlowError,
    payload::{PaymentMethodPayload, VerificationFlags},
    payment::PaymentMethodKind,
    processing::ProcessingResult,
    sdk_error::SdkError,
};
use error_stack::report;

use crate::controller::PaymentForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
enum Stage {
    DetermineTokenization,
    EnsureIntegration,
    CaptureCredential,
    LookupSavedInstrument,
    EvaluateVerification,
    Verify,
    AssemblePayload,
}

enum Step {
    Next(Stage),
    Done(PaymentMethodPayload),
}

/// Everything one attempt accumulates while walking the stages. Dropped
/// whole when the attempt ends, so nothing leaks into the next one.
#[derive(Default)]
struct SubmissionContext {
    tokenization_required: bool,
    captured: Option<domain_types::payment::CapturedCredential>,
    saved: Option<domain_types::payment::SavedInstrumentData>,
    verification: Option<domain_types::verification::VerificationResult>,
}

pub struct PaymentProcessingPipeline {
    form: Arc<dyn PaymentForm>,
    in_flight: AtomicBool,
}

/// Releases the submission slot on drop, so the slot frees up even when
/// the host cancels the processing future mid-attempt.
struct ProcessingSlot<'a> {
    in_flight: &'a AtomicBool,
}

impl Drop for ProcessingSlot<'_> {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

impl PaymentProcessingPipeline {
    pub fn new(form: Arc<dyn PaymentForm>) -> Self {
        Self {
            form,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one submission attempt end to end. Never panics and never
    /// returns a raw error; whatever goes wrong becomes an error result
    /// with a message fit for the shopper.
    pub async fn process(&self) -> ProcessingResult {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return self.result_from_error(&report!(CheckoutFlowError::OverlappingSubmission));
        }
        let _slot = ProcessingSlot {
            in_flight: &self.in_flight,
        };
        let result = self.run().await;
        match result {
            Ok(payload) => ProcessingResult::Success { meta: payload },
            Err(error) => {
                tracing::debug!(?error, "submission attempt failed");
                self.result_from_error(&error)
            }
        }
    }

    async fn run(&self) -> CustomResult<PaymentMethodPayload, CheckoutFlowError> {
        let mut context = SubmissionContext::default();
        let mut stage = Stage::DetermineTokenization;
        loop {
            tracing::debug!(%stage, "entering stage");
            match self.run_stage(stage, &mut context).await? {
                Step::Next(next) => stage = next,
                Step::Done(payload) => return Ok(payload),
            }
        }
    }

    async fn run_stage(
        &self,
        stage: Stage,
        context: &mut SubmissionContext,
    ) -> CustomResult<Step, CheckoutFlowError> {
        match stage {
            Stage::DetermineTokenization => {
                // A saved instrument only needs a fresh capture when the
                // security code is collected alongside it.
                let using_token = self.form.saved_instrument_token().is_some();
                context.tokenization_required =
                    !(using_token && !self.form.security_code_required());
                Ok(Step::Next(Stage::EnsureIntegration))
            }
            Stage::EnsureIntegration => {
                if context.tokenization_required && !self.form.has_live_integration().await {
                    return Err(report!(CheckoutFlowError::Integration));
                }
                Ok(Step::Next(Stage::CaptureCredential))
            }
            Stage::CaptureCredential => {
                if context.tokenization_required {
                    context.captured = Some(self.form.capture_credential().await?);
                }
                Ok(Step::Next(Stage::LookupSavedInstrument))
            }
            Stage::LookupSavedInstrument => {
                if self.form.saved_instrument_token().is_some() {
                    context.saved = self.form.lookup_saved_instrument().await?;
                }
                Ok(Step::Next(Stage::EvaluateVerification))
            }
            Stage::EvaluateVerification => {
                if self.verification_required(context).await {
                    Ok(Step::Next(Stage::Verify))
                } else {
                    Ok(Step::Next(Stage::AssemblePayload))
                }
            }
            Stage::Verify => {
                let (nonce, bin) = match (&context.saved, &context.captured) {
                    (Some(saved), _) => (saved.nonce.clone(), saved.bin.clone()),
                    (None, Some(captured)) => (captured.nonce.clone(), captured.bin.clone()),
                    (None, None) => return Err(report!(CheckoutFlowError::Verification)),
                };
                let result = self.form.verify(nonce, bin).await?;
                if let Some(settings) = self.form.verification_settings() {
                    // Contractual liability shift: without it the attempt
                    // is declined, with the configured wording.
                    if settings.liability_shift_always_required && !result.liability_shifted {
                        return Err(report!(CheckoutFlowError::Declined {
                            message: settings.liability_shift_message,
                        }));
                    }
                }
                context.verification = Some(result);
                Ok(Step::Next(Stage::AssemblePayload))
            }
            Stage::AssemblePayload => Ok(Step::Done(self.assemble(context))),
        }
    }

    /// Whether this attempt goes through step-up verification: the method
    /// has it enabled and live, and the instrument is eligible.
    async fn verification_required(&self, context: &SubmissionContext) -> bool {
        let settings = match self.form.verification_settings() {
            Some(settings) if settings.enabled => settings,
            _ => return false,
        };
        if !self.form.verification_available().await {
            return false;
        }
        if let Some(saved) = &context.saved {
            return !saved.nonce.is_empty();
        }
        match &context.captured {
            Some(captured) if captured.kind == PaymentMethodKind::CreditCard => captured
                .card_type
                .as_ref()
                .map(|card_type| settings.card_types.iter().any(|eligible| eligible == card_type))
                .unwrap_or(false),
            _ => false,
        }
    }

    fn assemble(&self, context: &mut SubmissionContext) -> PaymentMethodPayload {
        let mut payload = self.form.payment_method_data();
        let mut fresh_card_type = String::new();
        if let Some(saved) = context.saved.take() {
            payload.set_saved_instrument(saved.token);
        } else if let Some(captured) = context.captured.take() {
            fresh_card_type = captured
                .card_type
                .clone()
                .unwrap_or_default()
                .replace(' ', "")
                .to_lowercase();
            payload.set_fresh_credential(captured.nonce);
        }
        if let Some(result) = context.verification.take() {
            payload.verification = Some(VerificationFlags {
                three_d_secure_enabled: true,
                three_d_secure_verified: result.liability_shifted,
                // Saved instruments report no card type here.
                card_type: fresh_card_type,
            });
            payload.supersede_credential(result.nonce);
        }
        payload
    }

    /// Map a flow error to the result handed to the host. Also used for
    /// failures outside a submission attempt, e.g. a failed setup.
    pub fn result_from_error(
        &self,
        error: &error_stack::Report<CheckoutFlowError>,
    ) -> ProcessingResult {
        ProcessingResult::error(self.error_message(error))
    }

    fn error_message(&self, error: &error_stack::Report<CheckoutFlowError>) -> String {
        match error.current_context() {
            CheckoutFlowError::Declined { message } => message.clone(),
            CheckoutFlowError::Integration
            | CheckoutFlowError::SetupInFlight
            | CheckoutFlowError::OverlappingSubmission => self.form.integration_error_message(),
            context => {
                let using_token = self.form.saved_instrument_token().is_some();
                if let Some(sdk_error) = error.downcast_ref::<SdkError>() {
                    let classified = self.form.classify_sdk_error(sdk_error, using_token);
                    if !classified.is_empty() {
                        return classified;
                    }
                }
                match context.message() {
                    Some(message) if !message.is_empty() => message.to_string(),
                    _ => self.form.payment_error_message(),
                }
            }
        }
    }
}
