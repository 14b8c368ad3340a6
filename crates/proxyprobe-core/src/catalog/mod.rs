//! Proxy catalog: loading configuration sources into a uniquely-named
//! set of proxy identities, plus name/protocol filtering.

mod filter;
mod identity;
mod loader;

use indexmap::IndexMap;

pub use filter::{FilterSpec, stash_compatible};
pub use identity::{Protocol, ProxyIdentity};
pub use loader::Loader;

/// Mapping from unique proxy name to identity, in load order.
#[derive(Debug, Clone, Default)]
pub struct ProxyCatalog {
    entries: IndexMap<String, ProxyIdentity>,
}

impl ProxyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an identity; returns false (and keeps the existing
    /// entry) when the name is already present.
    pub fn insert(&mut self, identity: ProxyIdentity) -> bool {
        if self.entries.contains_key(identity.name()) {
            return false;
        }
        self.entries.insert(identity.name().to_owned(), identity);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ProxyIdentity> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProxyIdentity> {
        self.entries.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Distinct protocol tags present in the catalog, in first-seen order.
    pub fn available_protocols(&self) -> Vec<Protocol> {
        let mut seen = Vec::new();
        for identity in self.entries.values() {
            if !seen.contains(&identity.protocol()) {
                seen.push(identity.protocol());
            }
        }
        seen
    }

    /// Keep only entries satisfying `predicate`.
    pub fn retain(&mut self, mut predicate: impl FnMut(&ProxyIdentity) -> bool) {
        self.entries.retain(|_, identity| predicate(identity));
    }
}

impl IntoIterator for ProxyCatalog {
    type Item = ProxyIdentity;
    type IntoIter = indexmap::map::IntoValues<String, ProxyIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}
