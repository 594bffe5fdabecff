//! Types and client-less behavior for kind discovery and path resolution
//!
//! This crate holds everything that does not need a network connection:
//! the discovery data model, the kind registry and its conflict rules,
//! the display priority ordering, and request path construction.
//!
//! The same information is re-exported from `kubekind` under `kubekind::core`.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod discovery;
pub use discovery::{ApiGroupRef, ResourceDescriptor};

pub mod gvk;
pub use gvk::GroupVersion;

pub mod params;
pub use params::{FetchParams, MediaType};

pub mod prefix;
pub use prefix::{Environment, PathPrefix};

pub mod priority;
pub use priority::{prioritize, PRIORITY};

pub mod registry;
pub use registry::{KindConflict, KindRegistry};

pub mod request;
pub use request::Request;

pub mod response;
pub use response::Payload;

mod error;
pub use error::{Error, ErrorResponse};

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
