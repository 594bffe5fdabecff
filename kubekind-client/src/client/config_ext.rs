use hyper_timeout::TimeoutConnector;
use hyper_util::client::legacy::connect::HttpConnector;

use super::middleware::BaseUriLayer;
use crate::Config;

/// Extensions to [`Config`](crate::Config) for custom [`Client`](crate::Client) stacks.
///
/// This trait is sealed and cannot be implemented.
pub trait ConfigExt: private::Sealed {
    /// Layer to send requests to the configured server.
    fn base_uri_layer(&self) -> BaseUriLayer;

    /// Plain http connector with the configured timeouts applied.
    fn http_connector(&self) -> TimeoutConnector<HttpConnector>;
}

mod private {
    pub trait Sealed {}
    impl Sealed for crate::Config {}
}

impl ConfigExt for Config {
    fn base_uri_layer(&self) -> BaseUriLayer {
        BaseUriLayer::new(self.cluster_url.clone())
    }

    fn http_connector(&self) -> TimeoutConnector<HttpConnector> {
        let mut connector = TimeoutConnector::new(HttpConnector::new());
        connector.set_connect_timeout(self.connect_timeout);
        connector.set_read_timeout(self.read_timeout);
        connector
    }
}
