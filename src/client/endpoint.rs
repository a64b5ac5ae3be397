//! Endpoint resolution per API family.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::client::config::DEFAULT_REGION;

static SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[[:alpha:]][[:alnum:]+.-]*://").expect("static regex"));

/// Maps a region to the host serving one API family.
pub trait EndpointResolver: Send + Sync {
    fn resolve(&self, region: &str) -> Option<String>;
}

/// Region → host lookup table. Built once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    hosts: HashMap<String, String>,
}

impl RegionTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            hosts: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Hosts for the cluster API (`/cluster/*`).
    pub fn cluster_defaults() -> Self {
        Self::new([("bqj", "sgcloud_ers_service"), ("debug", "")])
    }

    /// Hosts for the elastic-group API (`/api/elasticgroups/*`).
    pub fn elastic_defaults() -> Self {
        Self::new([("bqj", "sgcloud_ers_service")])
    }
}

impl EndpointResolver for RegionTable {
    fn resolve(&self, region: &str) -> Option<String> {
        self.hosts
            .get(region)
            .or_else(|| self.hosts.get(DEFAULT_REGION))
            .filter(|h| !h.is_empty())
            .cloned()
    }
}

/// Prefix `host` with `protocol://` unless it already carries a scheme.
pub fn host_to_url(host: &str, protocol: &str) -> String {
    if SCHEME.is_match(host) {
        return host.to_string();
    }
    let protocol = if protocol.is_empty() { "http" } else { protocol };
    format!("{}://{}", protocol, host)
}
