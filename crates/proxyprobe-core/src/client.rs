// Tunnel client factory: one reqwest client per proxy identity.

use std::time::Duration;

use tracing::debug;

use crate::catalog::ProxyIdentity;
use crate::error::CoreError;

/// Produces the HTTP client a proxy's probes run through.
///
/// The default implementation dials through the proxy's tunnel
/// endpoint; tests inject a factory returning a direct client.
pub trait ClientFactory: Send + Sync {
    fn create(
        &self,
        proxy: &ProxyIdentity,
        timeout: Duration,
    ) -> Result<reqwest::Client, CoreError>;
}

/// Dials every request through the identity's tunnel endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct TunnelClientFactory;

impl ClientFactory for TunnelClientFactory {
    fn create(
        &self,
        proxy: &ProxyIdentity,
        timeout: Duration,
    ) -> Result<reqwest::Client, CoreError> {
        let endpoint = proxy
            .tunnel_endpoint()
            .ok_or_else(|| CoreError::Undialable {
                name: proxy.name().to_owned(),
            })?;

        debug!(
            proxy = proxy.name(),
            protocol = %proxy.protocol(),
            timeout_secs = timeout.as_secs(),
            "building tunnel client"
        );

        let mut builder = reqwest::Client::builder()
            .proxy(reqwest::Proxy::all(&endpoint)?)
            .timeout(timeout)
            .danger_accept_invalid_certs(true);

        // Slow-handshake protocols get the full timeout for connection
        // setup and header reads instead of library defaults.
        if proxy.protocol().is_slow() {
            builder = builder.connect_timeout(timeout).read_timeout(timeout);
        }

        Ok(builder.build()?)
    }
}

/// Test seam: always hands out the same pre-built client, bypassing
/// the tunnel entirely.
pub struct FixedClientFactory {
    client: reqwest::Client,
}

impl FixedClientFactory {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ClientFactory for FixedClientFactory {
    fn create(
        &self,
        _proxy: &ProxyIdentity,
        _timeout: Duration,
    ) -> Result<reqwest::Client, CoreError> {
        Ok(self.client.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Protocol;
    use indexmap::IndexMap;

    #[test]
    fn socks5_identity_builds_a_client() {
        let mut attrs: IndexMap<String, serde_yaml::Value> = IndexMap::new();
        attrs.insert("server".into(), "127.0.0.1".into());
        attrs.insert("port".into(), serde_yaml::Value::from(1080_u64));
        let proxy = ProxyIdentity::new("p", Protocol::Socks5, attrs);

        let client = TunnelClientFactory.create(&proxy, Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn identity_without_endpoint_is_undialable() {
        let proxy = ProxyIdentity::new("p", Protocol::Vmess, IndexMap::new());
        let err = TunnelClientFactory
            .create(&proxy, Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, CoreError::Undialable { name } if name == "p"));
    }
}
