//! Transport seam for the host server endpoint

use async_trait::async_trait;
use common_utils::CustomResult;
use domain_types::errors::TransportError;

/// One-round-trip form POST to the host's checkout endpoint. The concrete
/// implementation (and its URL handling) belongs to the embedding glue.
#[async_trait]
pub trait AjaxTransport: Send + Sync {
    async fn post_form(
        &self,
        url: &str,
        fields: Vec<(String, String)>,
    ) -> CustomResult<serde_json::Value, TransportError>;
}
