//! Environment-aware path prefixing
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Prefix rooting every path under the local development proxy
pub const DEV_PROXY_PREFIX: &str = "/k8s/";

/// Build environment deciding how server paths are rooted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Paths are rooted under [`DEV_PROXY_PREFIX`]
    Development,
    /// Paths are relative to the server root
    #[default]
    Production,
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(Error::InvalidEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// Turns server-relative paths into request paths for an [`Environment`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathPrefix {
    environment: Environment,
}

impl PathPrefix {
    /// Prefixing for the given environment
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    /// The environment this prefix was built for
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Prefixed url for `path`
    ///
    /// A single leading `/` is stripped first, so `/apis/foo` and `apis/foo` map to the same url.
    pub fn url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        match self.environment {
            Environment::Development => format!("{DEV_PROXY_PREFIX}{path}"),
            Environment::Production => format!("/{path}"),
        }
    }
}

impl From<Environment> for PathPrefix {
    fn from(environment: Environment) -> Self {
        Self::new(environment)
    }
}
