//! Turns structured SDK errors into shopper-facing messages.
//!
//! Validation errors are mapped through the configured message templates,
//! everything else falls back to whatever message text the error carries.
//! An empty classification means the caller should substitute its generic
//! payment error message.

use std::collections::HashMap;

use domain_types::sdk_error::{SdkError, SdkErrorKind};

use crate::consts;

pub struct ErrorClassifier<'a> {
    /// Message templates keyed by `card_<field>_<reason>`.
    messages: &'a HashMap<String, String>,
    csc_required: bool,
}

impl<'a> ErrorClassifier<'a> {
    pub fn new(messages: &'a HashMap<String, String>, csc_required: bool) -> Self {
        Self {
            messages,
            csc_required,
        }
    }

    fn template(&self, key: &str) -> String {
        self.messages.get(key).cloned().unwrap_or_default()
    }

    /// Produce the message for one SDK error. `using_token` suppresses the
    /// number/expiry messages for saved instruments, where only the
    /// security code is collected.
    pub fn classify(&self, error: &SdkError, using_token: bool) -> String {
        let mut messages = Vec::new();
        self.collect(error, using_token, &mut messages);
        messages.retain(|message: &String| !message.is_empty());
        messages.join(". ")
    }

    fn collect(&self, error: &SdkError, using_token: bool, messages: &mut Vec<String>) {
        match error.kind {
            Some(SdkErrorKind::Customer) => self.collect_customer(error, using_token, messages),
            Some(SdkErrorKind::Network) => {
                // Network errors nest the transport message one level down.
                if let Some(message) = error
                    .details
                    .as_ref()
                    .and_then(|details| details.original_error.as_ref())
                    .and_then(|original| original.error.as_ref())
                    .and_then(|inner| inner.message.clone())
                {
                    messages.push(message);
                }
            }
            // Untyped errors carry their raw message, if any.
            None => {
                if let Some(message) = error.message.clone() {
                    messages.push(message);
                }
            }
            _ => {}
        }
    }

    fn collect_customer(&self, error: &SdkError, using_token: bool, messages: &mut Vec<String>) {
        match error.code.as_deref() {
            Some(consts::HOSTED_FIELDS_FIELDS_EMPTY) => {
                if !using_token {
                    messages.push(self.template("card_number_required"));
                    messages.push(self.template("card_expirationDate_required"));
                }
                if self.csc_required {
                    messages.push(self.template("card_cvv_required"));
                }
            }
            Some(consts::HOSTED_FIELDS_FIELDS_INVALID) => {
                let invalid_fields = error
                    .details
                    .as_ref()
                    .map(|details| details.invalid_field_keys.as_slice())
                    .unwrap_or_default();
                for field in invalid_fields {
                    messages.push(self.template(&format!("card_{field}_invalid")));
                }
            }
            _ => {
                if let Some(message) = error.message.clone() {
                    messages.push(message);
                }
                if let Some(message) = error
                    .error
                    .as_ref()
                    .and_then(|inner| inner.message.clone())
                {
                    messages.push(message);
                }
                if let Some(original) = error
                    .details
                    .as_ref()
                    .and_then(|details| details.original_error.as_ref())
                {
                    self.collect(original, false, messages);
                }
            }
        }
    }
}
