//! Group version parsing for server-reported `apiVersion` strings
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to parse group version: {0}")]
/// Failed to parse group version.
pub struct ParseGroupVersionError(pub String);

/// Core information about a family of API Resources
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupVersion {
    /// API group, empty for the legacy core group
    pub group: String,
    /// Version
    pub version: String,
}

impl GroupVersion {
    /// A version of the legacy core group
    pub fn core(version: &str) -> Self {
        Self {
            group: String::new(),
            version: version.to_string(),
        }
    }

    /// Whether this is the legacy core group served under `api/`
    pub fn is_core(&self) -> bool {
        self.group.is_empty()
    }

    /// Generate the apiVersion string used in a kind's yaml
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Server-relative path of this group version's resource list
    ///
    /// Core lives under `api/<version>`, every other group under `apis/<group>/<version>`.
    pub fn url_path(&self) -> String {
        if self.is_core() {
            format!("api/{}", self.version)
        } else {
            format!("apis/{}/{}", self.group, self.version)
        }
    }
}

impl FromStr for GroupVersion {
    type Err = ParseGroupVersionError;

    fn from_str(gv: &str) -> Result<Self, Self::Err> {
        let gvsplit = gv.splitn(2, '/').collect::<Vec<_>>();
        let (group, version) = match *gvsplit.as_slice() {
            [g, v] if !g.is_empty() && !v.is_empty() && !v.contains('/') => (g.to_string(), v.to_string()),
            [v] if !v.is_empty() => ("".to_string(), v.to_string()), // core v1 case
            _ => return Err(ParseGroupVersionError(gv.into())),
        };
        Ok(Self { group, version })
    }
}
