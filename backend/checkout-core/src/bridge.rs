//! Ajax bridge to the host server's checkout endpoint.
//!
//! Every exchange is a form POST answered by a `{ success, data }`
//! envelope. Nothing returned here is cached: client tokens and saved
//! instrument data are fetched per use.

use std::sync::Arc;

use common_utils::{ext_traits::ValueExt, CustomResult, PeekInterface, Secret};
use domain_types::{errors::CheckoutFlowError, payment::SavedInstrumentData};
use error_stack::{report, ResultExt};
use interfaces::transport::AjaxTransport;
use serde::Deserialize;

/// The `{ success, data }` wrapper the endpoint answers with.
#[derive(Debug, Deserialize)]
struct AjaxEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl AjaxEnvelope {
    /// The server-reported message on a non-success response, when present.
    fn error_message(&self) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|data| data.get("message"))
            .and_then(|message| message.as_str())
            .map(str::to_string)
    }
}

pub struct ClientTokenBridge {
    transport: Arc<dyn AjaxTransport>,
}

impl ClientTokenBridge {
    pub fn new(transport: Arc<dyn AjaxTransport>) -> Self {
        Self { transport }
    }

    async fn post(
        &self,
        url: &str,
        fields: Vec<(String, String)>,
    ) -> CustomResult<AjaxEnvelope, CheckoutFlowError> {
        let response = self
            .transport
            .post_form(url, fields)
            .await
            .change_context(CheckoutFlowError::ServerCommunication {
                message: String::new(),
            })?;
        response
            .parse_value("AjaxEnvelope")
            .change_context(CheckoutFlowError::ServerCommunication {
                message: String::new(),
            })
    }

    /// Fetch a short-lived client token for the given payment method. The
    /// server message of a non-success response is surfaced verbatim.
    pub async fn get_client_token(
        &self,
        ajax_url: &str,
        payment_method_id: &str,
        nonce: &Secret<String>,
    ) -> CustomResult<Secret<String>, CheckoutFlowError> {
        let fields = vec![
            (
                "action".to_string(),
                format!("wc_{payment_method_id}_get_client_token"),
            ),
            ("nonce".to_string(), nonce.peek().clone()),
        ];
        let envelope = self.post(ajax_url, fields).await?;
        if !envelope.success {
            return Err(report!(CheckoutFlowError::ServerCommunication {
                message: envelope.error_message().unwrap_or_default(),
            }));
        }
        match envelope.data.as_ref().and_then(|data| data.as_str()) {
            Some(token) if !token.is_empty() => Ok(Secret::new(token.to_string())),
            _ => Err(report!(CheckoutFlowError::ServerCommunication {
                message: String::new(),
            })),
        }
    }

    /// Resolve a vaulted instrument token into the per-submission
    /// [`SavedInstrumentData`]. Failures carry the server message when
    /// present, otherwise `fallback_message`.
    pub async fn get_saved_instrument_data(
        &self,
        ajax_url: &str,
        payment_method_id: &str,
        token_id: &str,
        nonce: &Secret<String>,
        fallback_message: &str,
    ) -> CustomResult<SavedInstrumentData, CheckoutFlowError> {
        let fields = vec![
            (
                "action".to_string(),
                format!("wc_{payment_method_id}_get_token_data"),
            ),
            ("token_id".to_string(), token_id.to_string()),
            ("nonce".to_string(), nonce.peek().clone()),
        ];
        let envelope = self.post(ajax_url, fields).await?;
        if !envelope.success {
            return Err(report!(CheckoutFlowError::TokenLookup {
                message: envelope
                    .error_message()
                    .unwrap_or_else(|| fallback_message.to_string()),
            }));
        }
        let data = envelope.data.ok_or_else(|| {
            report!(CheckoutFlowError::TokenLookup {
                message: fallback_message.to_string(),
            })
        })?;
        data.parse_value("SavedInstrumentData")
            .change_context(CheckoutFlowError::TokenLookup {
                message: fallback_message.to_string(),
            })
    }

    /// Store a wallet nonce in the server-side cart session (express
    /// checkout) and return the server's raw response.
    pub async fn set_payment_nonce_session(
        &self,
        cart_handler_url: &str,
        payload: &serde_json::Value,
    ) -> CustomResult<serde_json::Value, CheckoutFlowError> {
        let fields = common_utils::request::json_to_form_fields(payload);
        self.transport
            .post_form(cart_handler_url, fields)
            .await
            .change_context(CheckoutFlowError::ServerCommunication {
                message: String::new(),
            })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use domain_types::errors::TransportError;
    use serde_json::json;

    use super::*;

    struct StaticTransport {
        response: serde_json::Value,
    }

    #[async_trait]
    impl AjaxTransport for StaticTransport {
        async fn post_form(
            &self,
            _url: &str,
            _fields: Vec<(String, String)>,
        ) -> CustomResult<serde_json::Value, TransportError> {
            Ok(self.response.clone())
        }
    }

    fn bridge(response: serde_json::Value) -> ClientTokenBridge {
        ClientTokenBridge::new(Arc::new(StaticTransport { response }))
    }

    #[tokio::test]
    async fn test_client_token_success() {
        let bridge = bridge(json!({ "success": true, "data": "token-abc" }));
        let token = bridge
            .get_client_token("https://shop.example/ajax", "braintree_credit_card", &Secret::new("n".to_string()))
            .await
            .unwrap();
        assert_eq!(token.peek(), "token-abc");
    }

    #[tokio::test]
    async fn test_client_token_failure_carries_server_message_verbatim() {
        let bridge = bridge(json!({ "success": false, "data": { "message": "rate limited" } }));
        let error = bridge
            .get_client_token("https://shop.example/ajax", "braintree_credit_card", &Secret::new("n".to_string()))
            .await
            .unwrap_err();
        assert_eq!(
            error.current_context(),
            &CheckoutFlowError::ServerCommunication {
                message: "rate limited".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_token_data_failure_falls_back_to_configured_message() {
        let bridge = bridge(json!({ "success": false }));
        let error = bridge
            .get_saved_instrument_data(
                "https://shop.example/ajax",
                "braintree_credit_card",
                "tok1",
                &Secret::new("n".to_string()),
                "Payment failed",
            )
            .await
            .unwrap_err();
        assert_eq!(
            error.current_context(),
            &CheckoutFlowError::TokenLookup {
                message: "Payment failed".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_token_data_success_parses_instrument() {
        let bridge = bridge(json!({
            "success": true,
            "data": { "token": "tok1", "nonce": "n2", "bin": "411111" },
        }));
        let data = bridge
            .get_saved_instrument_data(
                "https://shop.example/ajax",
                "braintree_credit_card",
                "tok1",
                &Secret::new("n".to_string()),
                "Payment failed",
            )
            .await
            .unwrap();
        assert_eq!(data.token, "tok1");
        assert_eq!(data.nonce.peek(), "n2");
        assert_eq!(data.bin, "411111");
    }
}
