//! Error handling in [`kubekind`][crate]
use std::sync::Arc;

use thiserror::Error;

pub use kubekind_core::ErrorResponse;

/// Possible errors when working with [`kubekind`][crate]
#[derive(Error, Debug)]
pub enum Error {
    /// ApiError for when the server answers with a failure status
    ///
    /// The body is parsed as a `Status` object when possible, and reconstructed
    /// from the status code otherwise.
    #[error("ApiError: {0} ({0:?})")]
    Api(#[source] ErrorResponse),

    /// Hyper error
    #[error("HyperError: {0}")]
    HyperError(#[source] hyper::Error),

    /// Service error
    #[error("ServiceError: {0}")]
    Service(#[source] tower::BoxError),

    /// UTF-8 Error
    #[error("UTF-8 Error: {0}")]
    FromUtf8(#[source] std::string::FromUtf8Error),

    /// Http based error
    #[error("HttpError: {0}")]
    HttpError(#[source] http::Error),

    /// Failed to construct a URI.
    #[error("InvalidUri: {0}")]
    InvalidUri(#[source] http::uri::InvalidUri),

    /// Common error case when requesting parsing into own structs
    #[error("Error deserializing response: {0}")]
    SerdeError(#[source] serde_json::Error),

    /// Failed to build request
    #[error("Failed to build request: {0}")]
    BuildRequest(#[source] kubekind_core::Error),

    /// Configuration error
    #[error("Error loading config: {0}")]
    Config(#[source] ConfigError),

    /// The configured cluster url needs TLS, which this client does not carry
    #[error("TLS required for {0} but no TLS stack is available")]
    TlsRequired(http::Uri),

    /// A cached discovery stage failed
    ///
    /// The failure is stored with the stage, so every caller observes this same error.
    #[error("Error from discovery: {0}")]
    Discovery(#[source] Arc<Error>),
}

impl Error {
    /// Root failure behind any layers of shared discovery errors
    pub fn root(&self) -> &Error {
        match self {
            Self::Discovery(inner) => inner.root(),
            other => other,
        }
    }
}

#[derive(Error, Debug)]
// Redundant with the error messages and machine names
#[allow(missing_docs)]
/// Possible errors when loading config
pub enum ConfigError {
    #[error("Invalid cluster url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: http::uri::InvalidUri,
    },

    #[error("Cluster url {0:?} has no host")]
    MissingHost(String),

    #[error("Invalid environment: {0}")]
    InvalidEnvironment(#[source] kubekind_core::Error),
}
