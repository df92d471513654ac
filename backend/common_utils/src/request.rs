//! Request content types for collaborator round trips

use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

/// Body of an outgoing collaborator request.
#[derive(Debug, Clone)]
pub enum RequestContent {
    Json(serde_json::Value),
    FormData(Vec<(String, String)>),
}

#[derive(Debug)]
pub struct Request {
    pub url: String,
    pub method: Method,
    pub body: Option<RequestContent>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            body: None,
        }
    }

    pub fn set_body(mut self, body: RequestContent) -> Self {
        self.body = Some(body);
        self
    }
}

/// Flatten a JSON object into form fields, nesting object keys as
/// `parent[child]`. Null, `false`, zero and empty-string values are
/// skipped, matching what the cart-handler endpoint tolerates.
pub fn json_to_form_fields(value: &serde_json::Value) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    collect_form_fields(value, None, &mut fields);
    fields
}

fn collect_form_fields(
    value: &serde_json::Value,
    namespace: Option<&str>,
    fields: &mut Vec<(String, String)>,
) {
    let object = match value.as_object() {
        Some(object) => object,
        None => return,
    };
    for (property, entry) in object {
        let key = match namespace {
            Some(namespace) => format!("{namespace}[{property}]"),
            None => property.clone(),
        };
        match entry {
            serde_json::Value::Object(_) => collect_form_fields(entry, Some(&key), fields),
            serde_json::Value::String(text) if !text.is_empty() => {
                fields.push((key, text.clone()));
            }
            serde_json::Value::Number(number) if number.as_f64() != Some(0.0) => {
                fields.push((key, number.to_string()));
            }
            serde_json::Value::Bool(true) => fields.push((key, "true".to_string())),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_nested_objects_use_bracket_namespacing() {
        let payload = json!({
            "nonce": "abc",
            "details": { "email": "a@b.co", "empty": "" },
            "skipped": null,
            "flag": true,
        });
        let mut fields = json_to_form_fields(&payload);
        fields.sort();
        assert_eq!(
            fields,
            vec![
                ("details[email]".to_string(), "a@b.co".to_string()),
                ("flag".to_string(), "true".to_string()),
                ("nonce".to_string(), "abc".to_string()),
            ]
        );
    }
}
