use std::time::Duration;

use bytes::Bytes;
use http::{uri::Scheme, Request, Response};
use http_body_util::BodyExt;
use hyper_util::{client::legacy, rt::TokioExecutor};
use kubekind_core::Environment;
use tower::{util::BoxService, BoxError, Layer, Service, ServiceBuilder};
use tower_http::{
    classify::ServerErrorsFailureClass,
    map_response_body::MapResponseBodyLayer,
    trace::{MakeSpan, OnFailure, OnResponse, TraceLayer},
};
use tracing::{field, Span};

use super::body::Body;
use crate::{client::ConfigExt, Client, Config, Error, Result};

/// HTTP body of a dynamic backing type.
///
/// The suggested implementation type is [`crate::client::Body`].
pub type DynBody = dyn http_body::Body<Data = Bytes, Error = BoxError> + Send + Unpin;

/// Type-erased service stack built by [`ClientBuilder::try_from`]
pub type GenericService = BoxService<Request<Body>, Response<Box<DynBody>>, BoxError>;

/// Builder for [`Client`] instances with customized [tower](`Service`) middleware.
///
/// Start from [`ClientBuilder::try_from`] to get the default http stack for a
/// [`Config`], then add layers on top of it.
pub struct ClientBuilder<Svc> {
    service: Svc,
    environment: Environment,
}

impl<Svc> ClientBuilder<Svc> {
    /// Wrap a fully custom [`Service`] stack.
    pub fn new(service: Svc, environment: Environment) -> Self
    where
        Svc: Service<Request<Body>>,
    {
        Self { service, environment }
    }

    /// Put a [`Layer`] around the current [`Service`] stack.
    pub fn with_layer<L: Layer<Svc>>(self, layer: &L) -> ClientBuilder<L::Service> {
        ClientBuilder {
            service: layer.layer(self.service),
            environment: self.environment,
        }
    }

    /// Change the environment the built client roots its paths for.
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Finish into a [`Client`].
    pub fn build<B>(self) -> Client
    where
        Svc: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        Svc::Future: Send + 'static,
        Svc::Error: Into<BoxError>,
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Client::new(self.service, self.environment)
    }
}

impl TryFrom<Config> for ClientBuilder<GenericService> {
    type Error = Error;

    /// Default stack: base uri, request tracing, then a pooled plain http client
    fn try_from(config: Config) -> Result<Self> {
        if config.cluster_url.scheme() == Some(&Scheme::HTTPS) {
            return Err(Error::TlsRequired(config.cluster_url));
        }

        let client: legacy::Client<_, Body> =
            legacy::Builder::new(TokioExecutor::new()).build(config.http_connector());
        let trace = TraceLayer::new_for_http()
            .make_span_with(HttpSpan)
            .on_request(())
            .on_response(RecordStatus)
            .on_body_chunk(())
            .on_eos(())
            .on_failure(RecordStatus);
        let stack = ServiceBuilder::new()
            .layer(config.base_uri_layer())
            .layer(trace)
            .map_err(BoxError::from)
            .service(client);

        let erased = MapResponseBodyLayer::new(|body| Box::new(BodyExt::map_err(body, BoxError::from)) as Box<DynBody>)
            .layer(stack);
        Ok(ClientBuilder::new(BoxService::new(erased), config.environment))
    }
}

/// One `HTTP` span per request
#[derive(Clone, Copy, Debug)]
struct HttpSpan;

impl<B> MakeSpan<B> for HttpSpan {
    fn make_span(&mut self, req: &Request<B>) -> Span {
        tracing::debug_span!(
            "HTTP",
            http.method = %req.method(),
            http.url = %req.uri(),
            http.status_code = field::Empty,
            error = field::Empty,
        )
    }
}

/// Records the outcome of a request on its span
#[derive(Clone, Copy, Debug)]
struct RecordStatus;

impl<B> OnResponse<B> for RecordStatus {
    fn on_response(self, res: &Response<B>, latency: Duration, span: &Span) {
        let status = res.status();
        span.record("http.status_code", status.as_u16());
        if status.is_client_error() || status.is_server_error() {
            span.record("error", true);
        }
        tracing::debug!(parent: span, ?latency, "response received");
    }
}

impl OnFailure<ServerErrorsFailureClass> for RecordStatus {
    fn on_failure(&mut self, class: ServerErrorsFailureClass, latency: Duration, span: &Span) {
        span.record("error", true);
        match class {
            ServerErrorsFailureClass::StatusCode(status) => {
                tracing::error!(parent: span, %status, ?latency, "request failed");
            }
            ServerErrorsFailureClass::Error(err) => {
                tracing::error!(parent: span, error = %err, ?latency, "request failed");
            }
        }
    }
}
