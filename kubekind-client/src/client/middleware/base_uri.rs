//! Route root-relative requests to the configured server.
use http::{uri, Request};
use tower::{Layer, Service};

/// Layer that applies [`BaseUri`], pointing every request at one server.
///
/// A path on the base uri is kept in front of the request path, so a server
/// mounted under `/cluster/a` receives `/cluster/a/k8s/apis`.
#[derive(Debug, Clone)]
pub struct BaseUriLayer {
    base_uri: http::Uri,
}

impl BaseUriLayer {
    /// Send requests to `base_uri`.
    pub fn new(base_uri: http::Uri) -> Self {
        Self { base_uri }
    }
}

impl<S> Layer<S> for BaseUriLayer {
    type Service = BaseUri<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BaseUri {
            base_uri: self.base_uri.clone(),
            inner,
        }
    }
}

/// Middleware that joins the base uri with each request's path and query.
#[derive(Debug, Clone)]
pub struct BaseUri<S> {
    base_uri: http::Uri,
    inner: S,
}

impl<S, ReqBody> Service<Request<ReqBody>> for BaseUri<S>
where
    S: Service<Request<ReqBody>>,
{
    type Error = S::Error;
    type Future = S::Future;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let (mut parts, body) = req.into_parts();
        if let Some(joined) = join(&self.base_uri, parts.uri.path_and_query()) {
            parts.uri = joined;
        } else {
            tracing::warn!(uri = %parts.uri, base = %self.base_uri, "Could not join request with base uri");
        }
        self.inner.call(Request::from_parts(parts, body))
    }
}

// `None` only if the joined parts do not form a uri, in which case the request is sent unchanged.
fn join(base_uri: &http::Uri, request: Option<&uri::PathAndQuery>) -> Option<http::Uri> {
    let base_path = base_uri.path().trim_end_matches('/');
    let path_and_query = match request {
        Some(pq) => format!("{base_path}{pq}"),
        None if base_path.is_empty() => "/".to_string(),
        None => base_path.to_string(),
    };

    let mut parts = uri::Parts::default();
    parts.scheme = base_uri.scheme().cloned();
    parts.authority = base_uri.authority().cloned();
    parts.path_and_query = Some(path_and_query.parse().ok()?);
    http::Uri::from_parts(parts).ok()
}
