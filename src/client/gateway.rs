//! Versioned URL construction and typed calls over the retrying transport.

use crate::client::config::ClientConfig;
use crate::client::endpoint::{host_to_url, EndpointResolver};
use crate::transport::http::{HttpResponse, HttpTransport, PendingRequest};
use crate::transport::query::canonical_query_string;
use crate::{Error, ErrorContext, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Entry point for one API family: resolves the host through its own
/// [`EndpointResolver`] and shares the transport with other families.
#[derive(Clone)]
pub struct RequestGateway {
    transport: Arc<HttpTransport>,
    config: ClientConfig,
    resolver: Arc<dyn EndpointResolver>,
}

impl RequestGateway {
    pub fn new(
        transport: Arc<HttpTransport>,
        config: ClientConfig,
        resolver: Arc<dyn EndpointResolver>,
    ) -> Self {
        Self {
            transport,
            config,
            resolver,
        }
    }

    /// Build a transport from `config` and wrap it.
    pub fn connect(config: ClientConfig, resolver: Arc<dyn EndpointResolver>) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::new(transport, config, resolver))
    }

    pub fn transport(&self) -> &Arc<HttpTransport> {
        &self.transport
    }

    fn host(&self) -> Result<String> {
        if let Some(endpoint) = &self.config.endpoint {
            return Ok(endpoint.clone());
        }
        let region = self.config.region();
        self.resolver.resolve(region).ok_or_else(|| {
            Error::configuration(
                format!("no endpoint configured for region {}", region),
                ErrorContext::new()
                    .with_field_path("client_config.endpoint")
                    .with_source("request_gateway"),
            )
        })
    }

    /// Full URL for `path`: `<protocol>://<host>/[<version>/]<path>[?<query>]`.
    pub fn url(&self, path: &str, params: Option<&HashMap<String, String>>) -> Result<String> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let path = match &self.config.api_version {
            Some(version) => format!("{}/{}", version, path),
            None => path.to_string(),
        };

        let base = host_to_url(&self.host()?, &self.config.protocol);
        let query = params.map(canonical_query_string).unwrap_or_default();
        let url = if query.is_empty() {
            format!("{}/{}", base, path)
        } else {
            format!("{}/{}?{}", base, path, query)
        };

        url::Url::parse(&url).map_err(|e| {
            Error::configuration(
                format!("invalid request url {}", url),
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("request_gateway"),
            )
        })?;
        Ok(url)
    }

    /// Send a request and return the raw response.
    pub async fn call_raw<B>(
        &self,
        method: Method,
        path: &str,
        params: Option<&HashMap<String, String>>,
        body: Option<&B>,
    ) -> Result<HttpResponse>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path, params)?;
        let mut request = PendingRequest::new(method, url);
        if let Some(body) = body {
            request = request.with_json(body)?;
        }
        debug!(
            method = %request.method,
            path,
            request_id = request.request_id.as_str(),
            "gateway call"
        );
        self.transport.send(&request).await
    }

    /// Send a request and decode the response body into `T`.
    pub async fn call<B, T>(
        &self,
        method: Method,
        path: &str,
        params: Option<&HashMap<String, String>>,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.call_raw(method, path, params, body).await?;
        serde_json::from_slice(&resp.body).map_err(|e| Error::Decode {
            source: e,
            status: resp.status,
            body: String::from_utf8_lossy(&resp.body).into_owned(),
            context: ErrorContext::new()
                .with_status_code(resp.status)
                .with_request_id(resp.request_id.clone())
                .with_source("request_gateway"),
        })
    }
}
