//! Normalized cache keys built from request identity

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identifies a cached response by resource and request parameters
///
/// Parameters are sorted and deduplicated on construction, so two requests
/// that differ only in parameter order produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    resource: String,
    params: Vec<(String, String)>,
}

impl CacheKey {
    /// Creates a key for a resource with the given request parameters
    pub fn new<I, K, V>(resource: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        params.sort();
        params.dedup();

        Self {
            resource: resource.into(),
            params,
        }
    }

    /// Creates a key with no parameters, e.g. `CacheKey::named("btc_usd")`
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            resource: name.into(),
            params: Vec::new(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Stable textual form used for on-disk identity
    pub fn canonical(&self) -> String {
        let mut out = self.resource.clone();
        for (i, (k, v)) in self.params.iter().enumerate() {
            out.push(if i == 0 { '?' } else { '&' });
            out.push_str(&escape(k));
            out.push('=');
            out.push_str(&escape(v));
        }
        out
    }

    /// SHA-256 hex digest of the canonical form
    pub(crate) fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl From<&str> for CacheKey {
    fn from(name: &str) -> Self {
        CacheKey::named(name)
    }
}

impl From<String> for CacheKey {
    fn from(name: String) -> Self {
        CacheKey::named(name)
    }
}

impl From<&CacheKey> for CacheKey {
    fn from(key: &CacheKey) -> Self {
        key.clone()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

// Keeps '&', '=' and '%' inside names and values from colliding with separators.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            '?' => out.push_str("%3F"),
            _ => out.push(c),
        }
    }
    out
}
