//! Kubekind discovers the resource kinds a [Kubernetes](http://kubernetes.io) cluster serves
//! and resolves them into request paths.
//!
//! # Overview
//!
//! The main modules are:
//!
//! - [`client`](crate::client) with the fetch adapter [`Client`](crate::Client) and its layers
//! - [`config`](crate::config) for the [`Config`](crate::Config) read from the environment
//! - [`discovery`](crate::discovery) with the process-wide [`Discovery`](crate::Discovery) cache
//! - [`core`](crate::core) with the registry, display ordering and path building
//!
//! # Listing kinds and fetching by kind
//! ```no_run
//! use kubekind::{core::FetchParams, Client, Discovery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let discovery = Discovery::new(Client::try_default()?);
//!
//!     // Kinds in display order, most commonly used first
//!     for res in discovery.resource_kinds_prioritized().await?.iter() {
//!         println!("{}\t{}", res.kind, res.api_version);
//!     }
//!
//!     // Fetch a deployment as yaml
//!     let deploy = discovery
//!         .fetch_resource(Some("coredns"), "Deployment", Some("kube-system"), &FetchParams::yaml())
//!         .await?;
//!     if let Some(text) = deploy.as_ref().and_then(|p| p.as_text()) {
//!         println!("{text}");
//!     }
//!     Ok(())
//! }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use kubekind_client::client;
#[doc(inline)]
pub use kubekind_client::Client;

pub use kubekind_client::config;
#[doc(inline)]
pub use kubekind_client::Config;

pub use kubekind_client::discovery;
#[doc(inline)]
pub use kubekind_client::Discovery;

pub use kubekind_client::error;
#[doc(inline)]
pub use kubekind_client::Error;
/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Re-exports from [`kubekind_core`](kubekind_core)
#[doc(inline)]
pub use kubekind_core as core;
