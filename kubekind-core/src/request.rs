//! Request path construction for discovered resources
use http::header::ACCEPT;

use crate::{discovery::ResourceDescriptor, params::FetchParams, Error, Result};

/// A request builder for discovered resources
///
/// Holds a server-relative collection path and supplies constructors for the
/// GET requests issued against it. Built requests carry root-relative uris;
/// environment prefixing is left to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Server-relative path without a leading separator
    pub url_path: String,
}

impl Request {
    /// New request for a server-relative path
    ///
    /// A leading `/` is stripped.
    pub fn new<S: Into<String>>(url_path: S) -> Self {
        let url_path = url_path.into();
        let url_path = match url_path.strip_prefix('/') {
            Some(stripped) => stripped.to_string(),
            None => url_path,
        };
        Self { url_path }
    }

    /// Collection path of a discovered resource
    ///
    /// Core resources live under `api/v1/`, everything else under `apis/<apiVersion>/`.
    /// The namespace segment is only added for namespaced resources, so cluster-scoped
    /// kinds ignore a supplied namespace.
    pub fn for_resource(resource: &ResourceDescriptor, namespace: Option<&str>) -> Result<Self> {
        let gv = resource.group_version()?;
        let mut url_path = gv.url_path();
        url_path.push('/');
        if let Some(ns) = namespace.filter(|ns| !ns.is_empty()) {
            if resource.namespaced {
                url_path.push_str("namespaces/");
                url_path.push_str(ns);
                url_path.push('/');
            }
        }
        url_path.push_str(&resource.name);
        Ok(Self { url_path })
    }

    /// Server-relative path of a single named instance
    pub fn instance_path(&self, name: &str) -> String {
        format!("{}/{}", self.url_path, name)
    }
}

/// Convenience methods for the supported reads
impl Request {
    /// Fetch the path itself
    pub fn fetch(&self, params: &FetchParams) -> Result<http::Request<Vec<u8>>> {
        get(&self.url_path, params)
    }

    /// List a collection of a resource
    pub fn list(&self, params: &FetchParams) -> Result<http::Request<Vec<u8>>> {
        get(&self.url_path, params)
    }

    /// Get a single instance
    pub fn get(&self, name: &str, params: &FetchParams) -> Result<http::Request<Vec<u8>>> {
        if name.is_empty() {
            return Err(Error::RequestValidation("A non-empty name is required".into()));
        }
        get(&self.instance_path(name), params)
    }
}

fn get(path: &str, params: &FetchParams) -> Result<http::Request<Vec<u8>>> {
    http::Request::get(format!("/{path}"))
        .header(ACCEPT, params.media_type.accept())
        .body(vec![])
        .map_err(Error::HttpError)
}
