// Catalog loader: turns configuration sources (files, URLs, provider
// references) into a merged, deduplicated proxy catalog.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{Protocol, ProxyCatalog, ProxyIdentity, stash_compatible};
use crate::error::CoreError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider names that would collide with internal grouping.
const RESERVED_PROVIDER_NAMES: &[&str] = &["default"];

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    proxies: Vec<IndexMap<String, serde_yaml::Value>>,
    #[serde(rename = "proxy-providers", default)]
    proxy_providers: IndexMap<String, RawProvider>,
}

#[derive(Deserialize)]
struct RawProvider {
    #[serde(default)]
    url: String,
    #[serde(default)]
    path: String,
}

/// Loads proxy catalogs from comma-separated file/URL sources.
pub struct Loader {
    client: reqwest::Client,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Loader fetching over a caller-supplied client (tests).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Load and merge every source into one catalog.
    ///
    /// Unreachable sources are logged and skipped; malformed YAML in a
    /// directly-given source aborts the whole load. A duplicate proxy
    /// name within one source's direct list is a hard error; a
    /// duplicate across sources keeps the first occurrence.
    pub async fn load(
        &self,
        sources: &str,
        compatibility_filter: bool,
    ) -> Result<ProxyCatalog, CoreError> {
        let mut catalog = ProxyCatalog::new();

        for raw_source in sources.split(',') {
            let source = unquote(raw_source);
            if source.is_empty() {
                continue;
            }

            let content = match self.fetch_source(source).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(source = %source, error = %e, "skipping unreadable catalog source");
                    continue;
                }
            };

            let content = decode_if_base64(&content);
            let document: RawDocument = serde_yaml::from_str(&content)?;

            self.merge_document(&mut catalog, document, source).await?;
        }

        if compatibility_filter {
            let before = catalog.len();
            catalog.retain(stash_compatible);
            debug!(
                before,
                after = catalog.len(),
                "applied compatibility filter"
            );
        }

        info!(proxies = catalog.len(), "catalog load complete");
        Ok(catalog)
    }

    async fn merge_document(
        &self,
        catalog: &mut ProxyCatalog,
        document: RawDocument,
        source: &str,
    ) -> Result<(), CoreError> {
        let mut seen_in_source: Vec<String> = Vec::new();
        for raw in document.proxies {
            let Some(identity) = build_identity(raw) else {
                continue;
            };
            if seen_in_source.iter().any(|n| n.as_str() == identity.name()) {
                return Err(CoreError::DuplicateProxy {
                    name: identity.name().to_owned(),
                    source_name: source.to_owned(),
                });
            }
            seen_in_source.push(identity.name().to_owned());
            if !catalog.insert(identity.clone()) {
                debug!(name = identity.name(), source = %source, "duplicate across sources, keeping first");
            }
        }

        for (provider_name, provider) in document.proxy_providers {
            if RESERVED_PROVIDER_NAMES.contains(&provider_name.as_str()) {
                return Err(CoreError::ReservedProviderName {
                    name: provider_name,
                });
            }
            self.merge_provider(catalog, &provider_name, &provider).await;
        }
        Ok(())
    }

    /// Provider trouble never aborts the load: fetch and parse
    /// failures are logged and the provider is skipped.
    async fn merge_provider(
        &self,
        catalog: &mut ProxyCatalog,
        provider_name: &str,
        provider: &RawProvider,
    ) {
        let location = if provider.url.is_empty() {
            &provider.path
        } else {
            &provider.url
        };
        if location.is_empty() {
            warn!(provider = %provider_name, "provider has neither url nor path");
            return;
        }

        let content = match self.fetch_source(location).await {
            Ok(content) => content,
            Err(e) => {
                warn!(provider = %provider_name, error = %e, "skipping unreachable provider");
                return;
            }
        };

        let content = decode_if_base64(&content);
        let document: RawDocument = match serde_yaml::from_str(&content) {
            Ok(document) => document,
            Err(e) => {
                warn!(provider = %provider_name, error = %e, "skipping unparseable provider");
                return;
            }
        };

        for raw in document.proxies {
            let Some(identity) = build_identity(raw) else {
                continue;
            };
            let composite = format!("[{provider_name}] {}", identity.name());
            let renamed = ProxyIdentity::new(
                composite.clone(),
                identity.protocol(),
                identity.attributes().clone(),
            );
            if !catalog.insert(renamed) {
                debug!(name = %composite, "duplicate provider proxy, keeping first");
            }
        }
    }

    async fn fetch_source(&self, source: &str) -> Result<String, CoreError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let response = self
                .client
                .get(source)
                .timeout(FETCH_TIMEOUT)
                .send()
                .await?
                .error_for_status()?;
            Ok(response.text().await?)
        } else {
            Ok(tokio::fs::read_to_string(source).await?)
        }
    }
}

/// Strip surrounding whitespace and one layer of matching quotes.
fn unquote(source: &str) -> &str {
    let trimmed = source.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

/// Sources may be base64-encoded as a whole; decode opportunistically
/// and keep the decoded text only if it looks like a config document.
fn decode_if_base64(content: &str) -> String {
    if looks_like_config(content) {
        return content.to_owned();
    }
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    if let Ok(decoded) = BASE64.decode(compact.as_bytes())
        && let Ok(text) = String::from_utf8(decoded)
        && looks_like_config(&text)
    {
        return text;
    }
    content.to_owned()
}

fn looks_like_config(content: &str) -> bool {
    content.contains("proxies:") || content.contains("proxy-providers:")
}

/// Build an identity from one raw proxy map. Entries with no name or
/// an off-list protocol are dropped.
fn build_identity(mut raw: IndexMap<String, serde_yaml::Value>) -> Option<ProxyIdentity> {
    let name = raw.get("name")?.as_str()?.to_owned();
    let tag = raw.get("type")?.as_str()?.to_owned();
    let Some(protocol) = Protocol::from_tag(&tag) else {
        debug!(name = %name, protocol = %tag, "dropping proxy with unsupported protocol");
        return None;
    };

    // ::ffff:x.x.x.x server addresses become plain IPv4
    if let Some(server) = raw.get("server").and_then(serde_yaml::Value::as_str)
        && let Some(v4) = server.strip_prefix("::ffff:")
    {
        let v4 = v4.to_owned();
        raw.insert("server".into(), v4.into());
    }

    Some(ProxyIdentity::new(name, protocol, raw))
}
