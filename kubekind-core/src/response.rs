//! Decoded responses and list post-processing
use serde_json::Value;

use crate::discovery::ResourceDescriptor;

/// A decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured json document
    Json(Value),
    /// Raw yaml text
    Yaml(String),
}

impl Payload {
    /// The json document, if this payload was decoded as json
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Yaml(_) => None,
        }
    }

    /// Consumes the payload, returning the json document if there is one
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Yaml(_) => None,
        }
    }

    /// The raw text, if this payload was fetched as yaml
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Yaml(text) => Some(text),
        }
    }

    /// Stamps `kind` and `apiVersion` of `resource` onto every list item
    ///
    /// Returns `false` when there was nothing to stamp: yaml text, or a document
    /// without an `items` array.
    pub fn stamp_items(&mut self, resource: &ResourceDescriptor) -> bool {
        match self {
            Self::Json(value) => stamp_list_items(value, &resource.kind, &resource.api_version),
            Self::Yaml(_) => false,
        }
    }
}

/// Sets `kind` and `apiVersion` on each object in `list["items"]`
///
/// Collection responses omit these per item. Existing values are overwritten.
pub fn stamp_list_items(list: &mut Value, kind: &str, api_version: &str) -> bool {
    let Some(items) = list.get_mut("items").and_then(Value::as_array_mut) else {
        return false;
    };
    for item in items.iter_mut().filter_map(Value::as_object_mut) {
        item.insert("apiVersion".into(), Value::String(api_version.into()));
        item.insert("kind".into(), Value::String(kind.into()));
    }
    true
}
