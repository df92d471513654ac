//! End-to-end submission attempts against scripted SDK and server mocks.

mod support;

use std::sync::{atomic::Ordering, Arc};

use checkout_core::{
    controller::{CardFormController, WalletApprovalOutcome, WalletFormController},
    pipeline::PaymentProcessingPipeline,
};
use domain_types::sdk_error::SdkError;
use interfaces::transport::AjaxTransport;
use serde_json::json;
use tokio::sync::Notify;

use support::{card_config, checkout_state, wallet_config, MockSdk, MockTransport, SdkState};

fn card_controller(
    config: Arc<domain_types::config::CardConfig>,
    state: Arc<SdkState>,
    transport: Arc<MockTransport>,
    saved_token: Option<&str>,
) -> Arc<CardFormController> {
    Arc::new(CardFormController::new(
        config,
        Arc::new(MockSdk::card(state)),
        transport,
        saved_token.map(str::to_string),
        checkout_state(),
    ))
}

#[tokio::test]
async fn fresh_card_submission_produces_a_nonce_payload() {
    let state = Arc::new(SdkState::default());
    let transport = Arc::new(MockTransport::default());
    let controller = card_controller(card_config(json!({})), Arc::clone(&state), transport, None);
    controller.setup_integration().await.unwrap();

    let pipeline = PaymentProcessingPipeline::new(controller);
    let result = pipeline.process().await;

    let payload = result.payload().expect("submission should succeed");
    assert_eq!(payload.credential_reference().unwrap().peek(), "n1");
    assert!(payload.payment_token.is_none());
    assert!(!payload.saved_instrument);
    assert!(!payload.tokenize_payment_method);
    assert!(payload.verification.is_none());
    assert!(state.verify_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn saved_card_with_csc_verifies_and_keeps_the_token_identity() {
    let state = Arc::new(SdkState::default());
    let transport = Arc::new(MockTransport::default());
    let config = card_config(json!({
        "threeds": { "enabled": true, "card_types": ["Visa"] },
    }));
    let controller =
        card_controller(config, Arc::clone(&state), transport, Some("tok1"));
    controller.setup_integration().await.unwrap();

    let pipeline = PaymentProcessingPipeline::new(controller);
    let result = pipeline.process().await;

    let payload = result.payload().expect("submission should succeed");
    assert_eq!(payload.payment_token.as_deref(), Some("tok1"));
    assert!(payload.saved_instrument);
    // The verification nonce supersedes the one from the token lookup.
    assert_eq!(payload.credential_reference().unwrap().peek(), "n3");
    let verification = payload.verification.as_ref().unwrap();
    assert!(verification.three_d_secure_enabled);
    assert!(verification.three_d_secure_verified);
    assert_eq!(verification.card_type, "");

    // Verification ran over the saved instrument's nonce and bin, and the
    // lookup checkpoint was acknowledged exactly once.
    let requests = state.verify_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["nonce"], "n2");
    assert_eq!(requests[0]["bin"], "411111");
    drop(requests);
    assert!(state.lookup_fully_acknowledged());
}

#[tokio::test]
async fn fresh_eligible_card_gets_normalized_card_type_in_the_flags() {
    let state = Arc::new(SdkState::default());
    *state.tokenize_response.lock().unwrap() = Ok(json!({
        "nonce": "n1",
        "details": { "bin": "540000", "cardType": "American Express" },
        "type": "CreditCard",
    }));
    let transport = Arc::new(MockTransport::default());
    let config = card_config(json!({
        "threeds": { "enabled": true, "card_types": ["American Express"] },
    }));
    let controller = card_controller(config, Arc::clone(&state), transport, None);
    controller.setup_integration().await.unwrap();

    let result = PaymentProcessingPipeline::new(controller).process().await;

    let payload = result.payload().expect("submission should succeed");
    let verification = payload.verification.as_ref().unwrap();
    assert_eq!(verification.card_type, "americanexpress");
    assert_eq!(payload.credential_reference().unwrap().peek(), "n3");
}

#[tokio::test]
async fn client_token_failure_surfaces_the_server_message_verbatim() {
    let state = Arc::new(SdkState::default());
    let transport = Arc::new(MockTransport {
        client_token_response: json!({
            "success": false,
            "data": { "message": "rate limited" },
        }),
        ..MockTransport::default()
    });
    let controller = card_controller(card_config(json!({})), Arc::clone(&state), transport, None);

    let error = controller.setup_integration().await.unwrap_err();
    let pipeline = PaymentProcessingPipeline::new(controller);
    let result = pipeline.result_from_error(&error);

    assert_eq!(result.error_message(), Some("rate limited"));
    // The SDK was never initialized.
    assert_eq!(state.clients_created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_liability_shift_declines_with_the_configured_message() {
    let state = Arc::new(SdkState::default());
    state.set_verify_response(json!({ "nonce": "n3", "liabilityShifted": false }));
    let transport = Arc::new(MockTransport::default());
    let config = card_config(json!({
        "threeds": {
            "enabled": true,
            "card_types": ["Visa"],
            "liability_shift_always_required": true,
            "liability_shift_message": "This card cannot be used for this purchase",
        },
    }));
    let controller = card_controller(config, Arc::clone(&state), transport, None);
    controller.setup_integration().await.unwrap();

    let result = PaymentProcessingPipeline::new(controller).process().await;

    assert_eq!(
        result.error_message(),
        Some("This card cannot be used for this purchase")
    );
}

#[tokio::test]
async fn invalid_fields_are_classified_through_the_message_templates() {
    let state = Arc::new(SdkState::default());
    let sdk_error: SdkError = serde_json::from_value(json!({
        "type": "CUSTOMER",
        "code": "HOSTED_FIELDS_FIELDS_INVALID",
        "message": "Some payment input fields are invalid.",
        "details": { "invalidFieldKeys": ["number", "cvv"] },
    }))
    .unwrap();
    state.set_tokenize_error(sdk_error);
    let transport = Arc::new(MockTransport::default());
    let config = card_config(json!({
        "fields_error_messages": {
            "card_number_invalid": "Bad number",
            "card_cvv_invalid": "Bad code",
        },
    }));
    let controller = card_controller(config, Arc::clone(&state), transport, None);
    controller.setup_integration().await.unwrap();

    let result = PaymentProcessingPipeline::new(controller).process().await;

    assert_eq!(result.error_message(), Some("Bad number. Bad code"));
}

#[tokio::test]
async fn saved_card_without_csc_skips_capture_entirely() {
    let state = Arc::new(SdkState::default());
    let transport = Arc::new(MockTransport::default());
    let config = card_config(json!({ "csc_required": false }));
    let controller =
        card_controller(config, Arc::clone(&state), transport, Some("tok1"));
    controller.setup_integration().await.unwrap();

    let result = PaymentProcessingPipeline::new(controller).process().await;

    let payload = result.payload().expect("submission should succeed");
    assert_eq!(payload.payment_token.as_deref(), Some("tok1"));
    assert!(payload.credential_reference().is_none());
    // No fields were ever rendered.
    assert!(state.hosted_fields_options.lock().unwrap().is_empty());
}

#[tokio::test]
async fn gateway_disabled_verification_is_skipped() {
    let state = Arc::new(SdkState::default());
    state.gateway_three_ds.store(false, Ordering::SeqCst);
    let transport = Arc::new(MockTransport::default());
    let config = card_config(json!({
        "threeds": { "enabled": true, "card_types": ["Visa"] },
    }));
    let controller = card_controller(config, Arc::clone(&state), transport, None);
    controller.setup_integration().await.unwrap();

    let result = PaymentProcessingPipeline::new(controller).process().await;

    let payload = result.payload().expect("submission should succeed");
    assert!(payload.verification.is_none());
    assert!(state.verify_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn overlapping_submissions_are_rejected() {
    let state = Arc::new(SdkState::default());
    let gate = Arc::new(Notify::new());
    *state.tokenize_gate.lock().unwrap() = Some(Arc::clone(&gate));
    let transport = Arc::new(MockTransport::default());
    let controller = card_controller(card_config(json!({})), Arc::clone(&state), transport, None);
    controller.setup_integration().await.unwrap();

    let pipeline = Arc::new(PaymentProcessingPipeline::new(controller));
    let first = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.process().await }
    });
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }

    let second = pipeline.process().await;
    assert_eq!(
        second.error_message(),
        Some("The payment form failed to load")
    );

    gate.notify_one();
    let first = first.await.unwrap();
    assert!(first.is_success());
}

#[tokio::test]
async fn cancelled_submission_releases_the_processing_slot() {
    let state = Arc::new(SdkState::default());
    let gate = Arc::new(Notify::new());
    *state.tokenize_gate.lock().unwrap() = Some(Arc::clone(&gate));
    let transport = Arc::new(MockTransport::default());
    let controller = card_controller(card_config(json!({})), Arc::clone(&state), transport, None);
    controller.setup_integration().await.unwrap();

    let pipeline = Arc::new(PaymentProcessingPipeline::new(controller));
    let first = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.process().await }
    });
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }

    // The host drops the first attempt while it is parked on the SDK.
    first.abort();
    let _ = first.await;
    *state.tokenize_gate.lock().unwrap() = None;

    let result = pipeline.process().await;
    assert!(result.is_success());
}

#[tokio::test]
async fn untyped_verification_rejection_surfaces_its_message() {
    let state = Arc::new(SdkState::default());
    state.set_verify_error(SdkError::from_message("Verification lookup failed"));
    let transport = Arc::new(MockTransport::default());
    let config = card_config(json!({
        "threeds": { "enabled": true, "card_types": ["Visa"] },
    }));
    let controller = card_controller(config, Arc::clone(&state), transport, None);
    controller.setup_integration().await.unwrap();

    let result = PaymentProcessingPipeline::new(controller).process().await;

    assert_eq!(result.error_message(), Some("Verification lookup failed"));
}

#[tokio::test]
async fn wallet_approval_feeds_the_submission() {
    let state = Arc::new(SdkState::default());
    let transport = Arc::new(MockTransport::default());
    let controller = Arc::new(WalletFormController::new(
        wallet_config(json!({})),
        Arc::new(MockSdk::wallet(Arc::clone(&state))),
        transport,
        None,
        checkout_state(),
        false,
    ));
    controller.setup_integration().await.unwrap();
    controller.create_order().await.unwrap();

    let outcome = controller
        .handle_approval(json!({ "orderID": "order-1" }))
        .await
        .unwrap();
    assert_eq!(outcome, WalletApprovalOutcome::Submit);

    let result = PaymentProcessingPipeline::new(controller).process().await;
    let payload = result.payload().expect("submission should succeed");
    assert_eq!(payload.credential_reference().unwrap().peek(), "wn1");

    let orders = state.wallet_orders.lock().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].intent, "authorize");
    assert_eq!(orders[0].amount.get_amount_as_string(), "10.99");
    assert_eq!(orders[0].currency, "USD");
}

#[tokio::test]
async fn wallet_express_approval_redirects_through_the_cart_session() {
    let state = Arc::new(SdkState::default());
    let transport = Arc::new(MockTransport::default());
    let controller = Arc::new(WalletFormController::new(
        wallet_config(json!({})),
        Arc::new(MockSdk::wallet(Arc::clone(&state))),
        Arc::clone(&transport) as Arc<dyn AjaxTransport>,
        None,
        checkout_state(),
        true,
    ));
    controller.setup_integration().await.unwrap();

    let outcome = controller
        .handle_approval(json!({ "orderID": "order-1" }))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        WalletApprovalOutcome::Redirect("https://shop.example/checkout".to_string())
    );

    // The nonce went to the cart handler as a form field.
    let calls = transport.calls.lock().unwrap();
    let session_call = calls.last().unwrap();
    assert!(session_call
        .iter()
        .any(|(key, value)| key == "payment_method_nonce" && value == "wn1"));
}

#[tokio::test]
async fn failed_express_session_handoff_burns_the_nonce() {
    let state = Arc::new(SdkState::default());
    let transport = Arc::new(MockTransport {
        nonce_session_failure: true,
        ..MockTransport::default()
    });
    let controller = Arc::new(WalletFormController::new(
        wallet_config(json!({})),
        Arc::new(MockSdk::wallet(Arc::clone(&state))),
        transport,
        None,
        checkout_state(),
        true,
    ));
    controller.setup_integration().await.unwrap();

    controller
        .handle_approval(json!({ "orderID": "order-1" }))
        .await
        .unwrap_err();

    // The nonce went to the server once; a later submission must not
    // replay it.
    let result = PaymentProcessingPipeline::new(controller).process().await;
    assert_eq!(
        result.error_message(),
        Some("Payment failed, please try again")
    );
}

#[tokio::test]
async fn wallet_submission_without_approval_fails_with_the_payment_message() {
    let state = Arc::new(SdkState::default());
    let transport = Arc::new(MockTransport::default());
    let controller = Arc::new(WalletFormController::new(
        wallet_config(json!({})),
        Arc::new(MockSdk::wallet(state)),
        transport,
        None,
        checkout_state(),
        false,
    ));
    controller.setup_integration().await.unwrap();

    let result = PaymentProcessingPipeline::new(controller).process().await;

    assert_eq!(
        result.error_message(),
        Some("Payment failed, please try again")
    );
}
