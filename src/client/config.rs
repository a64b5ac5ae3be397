use crate::transport::http::Authenticator;
use crate::transport::retry::{DefaultRetryPolicy, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "debug";

/// Connection and request settings shared by every API family client.
///
/// Built once at startup and handed to each client by value; nothing here
/// changes afterwards.
#[derive(Clone)]
pub struct ClientConfig {
    pub region: String,
    /// Explicit host, taking precedence over the region table.
    pub endpoint: Option<String>,
    /// Version segment prefixed to every path, e.g. `v2`.
    pub api_version: Option<String>,
    /// Scheme used when the host does not carry one. Defaults to `http`.
    pub protocol: String,
    pub user_agent: Option<String>,
    pub proxy_host: Option<String>,
    pub proxy_port: Option<u16>,
    /// Maximum idle pooled connections per host.
    pub max_connections: usize,
    pub timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub retry_policy: Arc<dyn RetryPolicy>,
    pub auth: Option<Arc<dyn Authenticator>>,
    /// Log full response bodies at debug level.
    pub debug: bool,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            region: String::new(),
            endpoint: None,
            api_version: None,
            protocol: "http".to_string(),
            user_agent: None,
            proxy_host: None,
            proxy_port: None,
            max_connections: 2,
            timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            retry_policy: Arc::new(DefaultRetryPolicy::default()),
            auth: None,
            debug: false,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Empty strings are treated as "not set" so blank config fields fall back to the region table.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.endpoint = (!endpoint.is_empty()).then_some(endpoint);
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.api_version = (!version.is_empty()).then_some(version);
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn with_proxy(mut self, host: impl Into<String>, port: Option<u16>) -> Self {
        self.proxy_host = Some(host.into());
        self.proxy_port = port;
        self
    }

    pub fn with_max_connections(mut self, n: usize) -> Self {
        self.max_connections = n.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_auth(mut self, auth: Arc<dyn Authenticator>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Configured region, or `debug` when unset.
    pub fn region(&self) -> &str {
        if self.region.is_empty() {
            DEFAULT_REGION
        } else {
            &self.region
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.region(), "debug");
        assert_eq!(cfg.protocol, "http");
        assert_eq!(cfg.retry_policy.max_retries(), 3);
        assert_eq!(cfg.retry_policy.max_delay(), Duration::from_secs(20));
    }

    #[test]
    fn test_blank_fields_stay_unset() {
        let cfg = ClientConfig::new()
            .with_endpoint("")
            .with_api_version("")
            .with_region("bqj");
        assert!(cfg.endpoint.is_none());
        assert!(cfg.api_version.is_none());
        assert_eq!(cfg.region(), "bqj");
    }
}
