//! Client side of kind discovery and path resolution
//!
//! This crate turns the API surface a cluster advertises into a registry of
//! resource kinds, and uses that registry to build and issue resource requests.
//!
//! # Example
//!
//! ```rust,no_run
//! use kubekind_client::{Client, Discovery};
//! use kubekind_core::FetchParams;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads KUBEKIND_URL and KUBEKIND_ENV, defaulting to a local `kubectl proxy`
//!     let client = Client::try_default()?;
//!     let discovery = Discovery::new(client);
//!
//!     for resource in discovery.resource_kinds_prioritized().await?.iter() {
//!         println!("{} ({})", resource.kind, resource.api_version);
//!     }
//!
//!     // List pods in a namespace; every item carries kind and apiVersion
//!     if let Some(pods) = discovery
//!         .fetch_resource(None, "Pod", Some("kube-system"), &FetchParams::default())
//!         .await?
//!     {
//!         println!("{:?}", pods.as_json());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For more details, see:
//!
//! - [`Client`](crate::client) for the fetch adapter and its middleware stack
//! - [`Config`](crate::config) for the client configuration
//! - [`Discovery`](crate::discovery) for the cached discovery stages
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod config;
pub mod discovery;
pub mod error;

#[doc(inline)]
pub use client::Client;
#[doc(inline)]
pub use config::Config;
#[doc(inline)]
pub use discovery::Discovery;
#[doc(inline)]
pub use error::Error;

/// Re-exports from kubekind_core
pub use kubekind_core as core;

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
