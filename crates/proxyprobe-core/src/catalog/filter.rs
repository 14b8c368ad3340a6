// Catalog filters: name regex, include/exclude substrings, protocol
// allow-list, and the compatibility allow-list.

use regex::Regex;
use tracing::debug;

use super::{Protocol, ProxyCatalog, ProxyIdentity};
use crate::error::CoreError;

/// Shadowsocks ciphers known to work across strict client stacks.
const COMPATIBLE_SS_CIPHERS: &[&str] = &[
    "aes-128-gcm",
    "aes-192-gcm",
    "aes-256-gcm",
    "chacha20-ietf-poly1305",
    "xchacha20-ietf-poly1305",
    "2022-blake3-aes-128-gcm",
    "2022-blake3-aes-256-gcm",
    "2022-blake3-chacha20-poly1305",
    "none",
];

/// Compatibility allow-list: ShadowsocksR is excluded outright, plain
/// Shadowsocks only with an approved cipher. Every other protocol
/// passes.
pub fn stash_compatible(identity: &ProxyIdentity) -> bool {
    match identity.protocol() {
        Protocol::ShadowsocksR => false,
        Protocol::Shadowsocks => identity
            .cipher()
            .is_some_and(|cipher| COMPATIBLE_SS_CIPHERS.contains(&cipher)),
        _ => true,
    }
}

/// Post-merge catalog filters. All predicates are AND-composed; an
/// empty list makes that predicate a no-op.
#[derive(Debug, Default, Clone)]
pub struct FilterSpec {
    /// Regex the proxy name must match.
    pub name_regex: String,
    /// Case-insensitive substrings, OR semantics: any match keeps.
    pub include: Vec<String>,
    /// Case-insensitive substrings, OR semantics: any match drops.
    pub exclude: Vec<String>,
    /// Protocol tags to keep (case-insensitive exact match).
    pub protocols: Vec<String>,
}

impl FilterSpec {
    /// Apply all active filters, returning the surviving catalog.
    pub fn apply(&self, catalog: ProxyCatalog) -> Result<ProxyCatalog, CoreError> {
        let regex = if self.name_regex.is_empty() {
            None
        } else {
            Some(Regex::new(&self.name_regex)?)
        };
        let include: Vec<String> = self.include.iter().map(|s| s.to_lowercase()).collect();
        let exclude: Vec<String> = self.exclude.iter().map(|s| s.to_lowercase()).collect();
        let protocols: Vec<String> = self.protocols.iter().map(|s| s.to_lowercase()).collect();

        let before = catalog.len();
        let mut catalog = catalog;
        catalog.retain(|identity| {
            let name = identity.name();
            let lower = name.to_lowercase();

            if let Some(re) = &regex
                && !re.is_match(name)
            {
                return false;
            }
            if !include.is_empty() && !include.iter().any(|needle| lower.contains(needle)) {
                return false;
            }
            if exclude.iter().any(|needle| lower.contains(needle)) {
                return false;
            }
            if !protocols.is_empty() && !protocols.contains(&identity.protocol().as_str().to_owned())
            {
                return false;
            }
            true
        });

        debug!(before, after = catalog.len(), "applied catalog filters");
        Ok(catalog)
    }
}
