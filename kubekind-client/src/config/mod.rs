//! Client configuration from explicit values or the process environment.
//!
//! # Usage
//! The [`Config`] has a plain constructor plus [`Config::infer`], which reads
//! `KUBEKIND_URL` and `KUBEKIND_ENV`. Pass it to a [`Client`][crate::Client].
use std::time::Duration;

use kubekind_core::{Environment, PathPrefix};

use crate::{error::ConfigError, Error, Result};

/// Environment variable holding the cluster url
pub const URL_ENV: &str = "KUBEKIND_URL";
/// Environment variable selecting [`Environment`]
pub const ENVIRONMENT_ENV: &str = "KUBEKIND_ENV";
/// Cluster url used when [`URL_ENV`] is unset, the address `kubectl proxy` listens on
pub const DEFAULT_URL: &str = "http://127.0.0.1:8001";

/// Configuration object detailing the server url, path prefixing and timeouts.
///
/// There is no authentication or TLS: the client expects to talk to a plain http
/// endpoint such as `kubectl proxy` or a development proxy.
#[derive(Debug, Clone)]
pub struct Config {
    /// The configured cluster url
    pub cluster_url: http::Uri,
    /// Selects how request paths are rooted, see [`PathPrefix`]
    pub environment: Environment,
    /// Timeout for establishing connections
    ///
    /// A value of `None` means no timeout
    pub connect_timeout: Option<Duration>,
    /// Timeout for reading responses
    ///
    /// A value of `None` means no timeout, so a hung server hangs the caller.
    pub read_timeout: Option<Duration>,
}

impl Config {
    /// Construct a new config where only the `cluster_url` is set by the user,
    /// in the production environment and without timeouts.
    pub fn new(cluster_url: http::Uri) -> Self {
        Self {
            cluster_url,
            environment: Environment::Production,
            connect_timeout: None,
            read_timeout: None,
        }
    }

    /// Infer the configuration from the process environment
    ///
    /// Falls back to [`DEFAULT_URL`] and the production environment for unset variables.
    pub fn infer() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(URL_ENV).unwrap_or_else(|| DEFAULT_URL.to_string());
        let cluster_url = url
            .parse::<http::Uri>()
            .map_err(|source| Error::Config(ConfigError::InvalidUrl { url: url.clone(), source }))?;
        if cluster_url.host().is_none() {
            return Err(Error::Config(ConfigError::MissingHost(url)));
        }

        let environment = match lookup(ENVIRONMENT_ENV) {
            Some(env) => env
                .parse::<Environment>()
                .map_err(|e| Error::Config(ConfigError::InvalidEnvironment(e)))?,
            None => Environment::default(),
        };
        tracing::debug!(%cluster_url, %environment, "Inferred config");

        Ok(Self::new(cluster_url).with_environment(environment))
    }

    /// Select the environment deciding path prefixing
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the connect timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Path prefixing for the configured environment
    pub fn path_prefix(&self) -> PathPrefix {
        PathPrefix::new(self.environment)
    }

    /// Request path for a server-relative `path`
    pub fn url(&self, path: &str) -> String {
        self.path_prefix().url(path)
    }
}
