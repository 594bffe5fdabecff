//! The fetch adapter for talking to the API surface
//!
//! The [`Client`] issues content-negotiated GET requests, roots their paths for
//! the configured [`Environment`], and uses standard kubekind error handling.
//!
//! It can be used on its own through [`Client::fetch_path`], or wrapped by a
//! [`Discovery`](crate::Discovery) to resolve kinds into request paths.
use futures::future::BoxFuture;
use http::{Request, Response, StatusCode};
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as k8s_meta_v1;
use kubekind_core::{Environment, FetchParams, MediaType, PathPrefix, Payload};
use serde::de::DeserializeOwned;
use tower::{buffer::Buffer, util::BoxService, BoxError, Layer, Service, ServiceExt};
use tower_http::map_response_body::MapResponseBodyLayer;

use crate::{error::ErrorResponse, Config, Error, Result};

mod body;
mod builder;
mod config_ext;
pub mod middleware;

pub use body::Body;
pub use builder::{ClientBuilder, DynBody, GenericService};
pub use config_ext::ConfigExt;

/// Client for fetching paths from the API surface.
///
/// Construct one with [`Client::try_default`] to infer the configuration from the
/// process environment, or with [`Client::try_from`] for an existing [`Config`].
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Clone)]
pub struct Client {
    // - `Buffer` for cheap clone
    // - `BoxFuture` for dynamic response future type
    inner: Buffer<Request<Body>, BoxFuture<'static, Result<Response<Body>, BoxError>>>,
    prefix: PathPrefix,
}

impl Client {
    /// Create a [`Client`] using a custom `Service` stack.
    ///
    /// [`ConfigExt`](crate::client::ConfigExt) provides extensions for
    /// building a custom stack. The service receives root-relative uris already
    /// prefixed for `environment`, and is expected to route them to a server.
    ///
    /// Must be called within a tokio runtime.
    pub fn new<S, B>(service: S, environment: Environment) -> Self
    where
        S: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
        B: http_body::Body<Data = bytes::Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let service = MapResponseBodyLayer::new(Body::boxed)
            .layer(service)
            .map_err(Into::into);
        Self {
            inner: Buffer::new(BoxService::new(service), BUFFER_CAPACITY),
            prefix: PathPrefix::new(environment),
        }
    }

    /// Create a [`Client`] from the configuration found in the process environment.
    ///
    /// See [`Config::infer`] for the variables read. Must be called within a tokio runtime.
    pub fn try_default() -> Result<Self> {
        Config::infer().and_then(Self::try_from)
    }

    /// The environment request paths are rooted for
    pub fn environment(&self) -> Environment {
        self.prefix.environment()
    }

    /// Request path for a server-relative `path`
    ///
    /// A leading `/` is stripped before the environment prefix is applied.
    pub fn url(&self, path: &str) -> String {
        self.prefix.url(path)
    }

    /// Send a request through the service stack as is, without prefixing its path.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Body>> {
        let mut svc = self.inner.clone();
        let ready = svc.ready().await.map_err(Error::Service)?;
        ready.call(request).await.map_err(unbox_error)
    }

    /// GET a server-relative path and decode the response for `params`
    ///
    /// Json is decoded into a value, yaml is returned as text.
    pub async fn fetch_path(&self, path: &str, params: &FetchParams) -> Result<Payload> {
        let request = kubekind_core::Request::new(path)
            .fetch(params)
            .map_err(Error::BuildRequest)?;
        self.request_payload(request, params.media_type).await
    }

    /// Send a request and decode the body according to `media_type`
    pub async fn request_payload(&self, request: Request<Vec<u8>>, media_type: MediaType) -> Result<Payload> {
        let text = self.request_text(request).await?;
        Ok(match media_type {
            MediaType::Json => Payload::Json(decode_json(&text)?),
            MediaType::Yaml => Payload::Yaml(text),
        })
    }

    /// Send a request and deserialize the json response into `T`
    pub async fn request<T>(&self, request: Request<Vec<u8>>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        decode_json(&self.request_text(request).await?)
    }

    /// Send a request with a root-relative path and return the response text
    ///
    /// The path is prefixed for the configured environment before sending, and
    /// any failure status becomes an [`Error::Api`].
    pub async fn request_text(&self, request: Request<Vec<u8>>) -> Result<String> {
        let request = self.rooted(request)?;
        let res = self.send(request.map(Body::from)).await?;
        let status = res.status();
        let text = res.into_body().collect_text().await?;
        check_status(status, &text)?;
        Ok(text)
    }

    fn rooted<B>(&self, request: Request<B>) -> Result<Request<B>> {
        let (mut parts, body) = request.into_parts();
        let path = self.prefix.url(parts.uri.path());
        parts.uri = match parts.uri.query() {
            Some(query) => format!("{path}?{query}").parse::<http::Uri>(),
            None => path.parse::<http::Uri>(),
        }
        .map_err(Error::InvalidUri)?;
        Ok(Request::from_parts(parts, body))
    }
}

/// Discovery documents as `k8s_openapi` types.
///
/// [`Discovery`](crate::Discovery) caches the results of these.
impl Client {
    /// Lists the named api groups served under `/apis`.
    pub async fn list_api_groups(&self) -> Result<k8s_meta_v1::APIGroupList> {
        self.get_json("apis").await
    }

    /// Lists the resources served at a group's path, such as `apis/apps/v1` or `api/v1`.
    pub async fn list_resources(&self, url: &str) -> Result<k8s_meta_v1::APIResourceList> {
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = kubekind_core::Request::new(path)
            .fetch(&FetchParams::json())
            .map_err(Error::BuildRequest)?;
        self.request(request).await
    }
}

const BUFFER_CAPACITY: usize = 1024;

// Errors raised inside the stack come back boxed; recover the concrete ones.
fn unbox_error(err: BoxError) -> Error {
    match err.downcast::<Error>() {
        Ok(err) => *err,
        Err(err) => match err.downcast::<hyper::Error>() {
            Ok(err) => Error::HyperError(*err),
            Err(err) => Error::Service(err),
        },
    }
}

fn decode_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|err| {
        tracing::warn!(error = %err, body = %text, "Could not decode json response");
        Error::SerdeError(err)
    })
}

/// Turns a failure status into an [`Error::Api`]
///
/// The body is read as a `Status` object when possible. Otherwise the error is
/// rebuilt from the status code and the raw body becomes its message.
fn check_status(status: StatusCode, text: &str) -> Result<()> {
    if !(status.is_client_error() || status.is_server_error()) {
        return Ok(());
    }
    let response = serde_json::from_str::<ErrorResponse>(text).unwrap_or_else(|_| {
        tracing::warn!(%status, body = %text, "Failure response without a Status body");
        ErrorResponse {
            status: "Failure".into(),
            message: text.to_string(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            code: status.as_u16(),
        }
    });
    tracing::debug!(code = response.code, reason = %response.reason, "Unsuccessful response");
    Err(Error::Api(response))
}

impl TryFrom<Config> for Client {
    type Error = Error;

    /// Builds a default [`Client`] from a [`Config`], see [`ClientBuilder`] if more customization is required
    fn try_from(config: Config) -> Result<Self> {
        Ok(ClientBuilder::try_from(config)?.build())
    }
}
