use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Possible errors when building requests or decoding responses without a client
#[derive(Error, Debug)]
pub enum Error {
    /// Http based error
    #[error("HttpError: {0}")]
    HttpError(#[from] http::Error),

    /// A group version string could not be parsed
    #[error("Invalid GroupVersion: {0}")]
    InvalidGroupVersion(String),

    /// An environment name was not recognized
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),

    /// A request was rejected before being built
    #[error("Request validation failed with {0}")]
    RequestValidation(String),

    /// Common error case when decoding json payloads
    #[error("Error deserializing response: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// An error response from the API.
#[derive(Error, Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[error("{message}: {reason}")]
pub struct ErrorResponse {
    /// The status
    pub status: String,
    /// A message about the error
    #[serde(default)]
    pub message: String,
    /// The reason for the error
    #[serde(default)]
    pub reason: String,
    /// The error code
    pub code: u16,
}
