//! # Request input
//!
//! A generated method accepts either a complete request object or a handful of flattened fields
//! that are copied into a fresh request. Supplying both is a caller bug, reported as
//! [`InvalidArgument`] before anything is sent.
use prost_reflect::MessageDescriptor;
use serde_json::{Map, Value};

/// Flattened request fields, keyed by proto or JSON field name.
pub type FieldSet = Map<String, Value>;

/// Request fields bound into the URL of an HTTP rule, in the order they are looked up.
const ROUTING_FIELDS: [&str; 4] = ["name", "parent", "service_name", "resource"];

pub const ROUTING_HEADER: &str = "x-goog-request-params";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error(
    "If the request argument is set, then none of the individual field arguments should be set (got {})",
    .fields.join(", ")
)]
pub struct InvalidArgument {
    pub fields: Vec<String>,
}

/// A validated request: a full request object or a set of flattened fields, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestInput {
    Request(Value),
    Fields(FieldSet),
}

impl Default for RequestInput {
    fn default() -> Self {
        RequestInput::Fields(FieldSet::new())
    }
}

impl RequestInput {
    /// Validates the two ways of passing a request at the call boundary.
    pub fn build(request: Option<Value>, fields: FieldSet) -> Result<Self, InvalidArgument> {
        match request {
            Some(_) if !fields.is_empty() => Err(InvalidArgument {
                fields: fields.keys().cloned().collect(),
            }),
            Some(request) => Ok(RequestInput::Request(request)),
            None => Ok(RequestInput::Fields(fields)),
        }
    }

    pub fn request(request: Value) -> Self {
        RequestInput::Request(request)
    }

    pub fn fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        RequestInput::Fields(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// The request body sent on the wire.
    pub fn into_value(self) -> Value {
        match self {
            RequestInput::Request(request) => request,
            RequestInput::Fields(fields) => Value::Object(fields),
        }
    }
}

/// Builds the `x-goog-request-params` metadata entry for `request`.
///
/// Every routing field declared by the request message is included, with an empty value when
/// the request leaves it unset. Returns `None` for messages without routing fields.
pub fn routing_header(descriptor: &MessageDescriptor, request: &Value) -> Option<(String, String)> {
    let params: Vec<String> = ROUTING_FIELDS
        .iter()
        .filter_map(|name| descriptor.get_field_by_name(name))
        .map(|field| {
            let value = request
                .get(field.json_name())
                .or_else(|| request.get(field.name()))
                .map(scalar_to_string)
                .unwrap_or_default();
            format!("{}={}", field.name(), encode(&value))
        })
        .collect();

    if params.is_empty() {
        None
    } else {
        Some((ROUTING_HEADER.to_string(), params.join("&")))
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// Path separators stay readable in resource names.
fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace("%2F", "/")
}
