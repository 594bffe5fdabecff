//! Request parameters for fetches
use serde::{Deserialize, Serialize};

/// Media type negotiated through the `Accept` header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Structured json, decoded into a value
    #[default]
    Json,
    /// Yaml, returned as raw text
    Yaml,
}

impl MediaType {
    /// Value for the `Accept` header
    pub fn accept(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Yaml => "application/yaml",
        }
    }
}

/// Common parameters for fetching a path or a resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchParams {
    /// Requested representation, json unless set
    #[serde(default, rename = "type")]
    pub media_type: MediaType,
}

impl FetchParams {
    /// Parameters requesting json
    pub fn json() -> Self {
        Self {
            media_type: MediaType::Json,
        }
    }

    /// Parameters requesting yaml text
    pub fn yaml() -> Self {
        Self {
            media_type: MediaType::Yaml,
        }
    }
}
