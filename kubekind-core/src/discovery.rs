//! Type information structs for API discovery
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{gvk::GroupVersion, Error, Result};

/// apiVersion of the legacy core group
pub const CORE_VERSION: &str = "v1";

/// A discoverable API group endpoint
///
/// `version` is the group's preferred `groupVersion` (e.g. `apps/v1`), and `url` is the
/// server-relative path of its resource list.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ApiGroupRef {
    /// Preferred group version, stamped as `apiVersion` on every resource of the group
    pub version: String,
    /// Server-relative path serving the group's resource list
    pub url: String,
}

impl ApiGroupRef {
    /// Reference to the resource list of a group version
    pub fn new(gv: &GroupVersion) -> Self {
        Self {
            version: gv.api_version(),
            url: gv.url_path(),
        }
    }

    /// The legacy, unversioned core group
    ///
    /// Always listed after the discovered groups.
    pub fn core() -> Self {
        Self::new(&GroupVersion::core(CORE_VERSION))
    }

    /// Whether this reference points at the core group
    pub fn is_core(&self) -> bool {
        self.url.starts_with("api/")
    }
}

/// Rbac verbs advertised on discovered resources
pub mod verbs {
    /// List objects
    pub const LIST: &str = "list";
}

/// Endpoint metadata needed to address one resource kind
///
/// Built from a raw group resource entry merged with its owning group's version.
/// Values are snapshots and are never mutated after discovery.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    /// Singular PascalCase name of the resource
    pub kind: String,
    /// apiVersion of the owning group (`v1` for core, `group/version` otherwise)
    pub api_version: String,
    /// Plural collection name used as the path segment
    pub name: String,
    /// Whether instances live under a namespace
    pub namespaced: bool,
    /// Supported operations
    pub verbs: BTreeSet<String>,
}

impl ResourceDescriptor {
    /// Checks that given verb is supported on this resource.
    pub fn supports_operation(&self, operation: &str) -> bool {
        self.verbs.contains(operation)
    }

    /// Whether the collection can be listed
    pub fn is_listable(&self) -> bool {
        self.supports_operation(verbs::LIST)
    }

    /// Parsed group version of this resource
    pub fn group_version(&self) -> Result<GroupVersion> {
        self.api_version
            .parse()
            .map_err(|e: crate::gvk::ParseGroupVersionError| Error::InvalidGroupVersion(e.0))
    }
}

/// Normalizes a server-reported kind name
///
/// Returns `None` for kinds that cannot be used as registry keys.
pub fn normalize_kind(kind: &str) -> Option<&str> {
    let kind = kind.trim();
    if kind.is_empty() || kind.contains('/') || kind.chars().any(char::is_whitespace) {
        return None;
    }
    Some(kind)
}
