// Proxy identity: one named, immutable proxy configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Proxy protocol tags retained by the loader. Anything else in a
/// source document is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[serde(rename = "ss")]
    Shadowsocks,
    #[serde(rename = "ssr")]
    ShadowsocksR,
    Vmess,
    Vless,
    Trojan,
    Socks5,
    Http,
    Hysteria,
    Hysteria2,
    Wireguard,
    Tuic,
    Ssh,
    Mieru,
    Anytls,
    Snell,
}

impl Protocol {
    /// The tag as it appears in configuration documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shadowsocks => "ss",
            Self::ShadowsocksR => "ssr",
            Self::Vmess => "vmess",
            Self::Vless => "vless",
            Self::Trojan => "trojan",
            Self::Socks5 => "socks5",
            Self::Http => "http",
            Self::Hysteria => "hysteria",
            Self::Hysteria2 => "hysteria2",
            Self::Wireguard => "wireguard",
            Self::Tuic => "tuic",
            Self::Ssh => "ssh",
            Self::Mieru => "mieru",
            Self::Anytls => "anytls",
            Self::Snell => "snell",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        serde_yaml::from_str(tag).ok()
    }

    /// Protocols with slow or unstable handshakes get reduced probe
    /// counts, longer handshake timeouts, and throttled uploads.
    pub fn is_slow(self) -> bool {
        matches!(self, Self::Vless)
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured proxy: unique name, protocol tag, and the original
/// attribute map (kept verbatim for IP extraction and re-export).
///
/// Immutable once the loader has built it.
#[derive(Debug, Clone, Serialize)]
pub struct ProxyIdentity {
    name: String,
    protocol: Protocol,
    attributes: IndexMap<String, serde_yaml::Value>,
}

impl ProxyIdentity {
    pub fn new(
        name: impl Into<String>,
        protocol: Protocol,
        attributes: IndexMap<String, serde_yaml::Value>,
    ) -> Self {
        Self {
            name: name.into(),
            protocol,
            attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn attributes(&self) -> &IndexMap<String, serde_yaml::Value> {
        &self.attributes
    }

    fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(serde_yaml::Value::as_str)
    }

    /// Server address from the original config (already normalized by
    /// the loader), used for reporting.
    pub fn server(&self) -> Option<&str> {
        self.attr_str("server")
    }

    pub fn port(&self) -> Option<u16> {
        self.attributes
            .get("port")
            .and_then(serde_yaml::Value::as_u64)
            .and_then(|p| u16::try_from(p).ok())
    }

    /// Cipher attribute, where the protocol carries one.
    pub fn cipher(&self) -> Option<&str> {
        self.attr_str("cipher")
    }

    /// Endpoint URL the tunnel client dials through.
    ///
    /// SOCKS5 and HTTP proxies are dialable directly. Every other
    /// protocol needs an external adapter, which exposes a local
    /// SOCKS5/HTTP endpoint recorded under `adapter-endpoint` in the
    /// identity's attributes. `None` means the proxy cannot be dialed.
    pub fn tunnel_endpoint(&self) -> Option<String> {
        if let Some(endpoint) = self.attr_str("adapter-endpoint") {
            return Some(endpoint.to_owned());
        }
        let server = self.server()?;
        let port = self.port()?;
        match self.protocol {
            Protocol::Socks5 => {
                let auth = match (self.attr_str("username"), self.attr_str("password")) {
                    (Some(user), Some(pass)) => format!("{user}:{pass}@"),
                    _ => String::new(),
                };
                Some(format!("socks5://{auth}{server}:{port}"))
            }
            Protocol::Http => Some(format!("http://{server}:{port}")),
            _ => None,
        }
    }
}
