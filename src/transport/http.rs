use crate::client::config::ClientConfig;
use crate::client::endpoint::host_to_url;
use crate::transport::retry::RetryPolicy;
use crate::transport::TransportError;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use reqwest::{Method, Proxy};
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Header carrying our own correlation id for one logical call.
pub const REQUEST_ID_HEADER: &str = "x-sgcloud-request-id";

/// Signs an outgoing attempt. Called once per attempt, with the exact body bytes sent.
pub trait Authenticator: Send + Sync {
    fn sign(&self, request: &mut reqwest::Request, body: &[u8]) -> Result<()>;
}

/// Static bearer token.
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Authenticator for BearerAuth {
    fn sign(&self, request: &mut reqwest::Request, _body: &[u8]) -> Result<()> {
        let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|e| {
                Error::configuration(
                    "bearer token is not a valid header value",
                    ErrorContext::new()
                        .with_details(e.to_string())
                        .with_source("bearer_auth"),
                )
            })?;
        request
            .headers_mut()
            .insert(reqwest::header::AUTHORIZATION, value);
        Ok(())
    }
}

/// One logical request. The body is snapshotted before the first send so
/// every retry puts the same bytes on the wire.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Bytes>,
    pub request_id: String,
}

impl PendingRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` once into the immutable body snapshot.
    pub fn with_json<T: serde::Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(value).map_err(Error::Serialization)?;
        Ok(self.with_body(bytes))
    }
}

/// Successful (< 400) response, fully buffered.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
    /// Correlation id the request was sent with.
    pub request_id: String,
}

/// Retrying HTTP transport over a pooled `reqwest::Client`.
pub struct HttpTransport {
    client: reqwest::Client,
    retry_policy: Arc<dyn RetryPolicy>,
    auth: Option<Arc<dyn Authenticator>>,
    debug: bool,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let timeout = env::var("SGCLOUD_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(config.timeout);

        let max_idle = env::var("SGCLOUD_HTTP_POOL_MAX_IDLE_PER_HOST")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(config.max_connections);

        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(max_idle)
            .pool_idle_timeout(Some(config.pool_idle_timeout));

        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        if let Some(host) = &config.proxy_host {
            let host = match config.proxy_port {
                Some(port) if port > 0 => format!("{}:{}", host, port),
                _ => host.clone(),
            };
            let proxy_url = host_to_url(&host, "http");
            let proxy = Proxy::all(&proxy_url).map_err(|e| {
                Error::configuration(
                    format!("invalid proxy address {}", proxy_url),
                    ErrorContext::new()
                        .with_field_path("client_config.proxy_host")
                        .with_details(e.to_string()),
                )
            })?;
            builder = builder.proxy(proxy);
        } else if let Ok(proxy_url) = env::var("SGCLOUD_PROXY_URL") {
            match Proxy::all(&proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => warn!(
                    proxy = proxy_url.as_str(),
                    error = %e,
                    "ignoring invalid SGCLOUD_PROXY_URL"
                ),
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            retry_policy: config.retry_policy.clone(),
            auth: config.auth.clone(),
            debug: config.debug,
        })
    }

    pub fn retry_policy(&self) -> &Arc<dyn RetryPolicy> {
        &self.retry_policy
    }

    /// Send `request`, retrying as the policy allows.
    ///
    /// Returns the first response below 400, or the last error once the
    /// policy says stop. Attempts never overlap.
    pub async fn send(&self, request: &PendingRequest) -> Result<HttpResponse> {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            let err = match self.attempt(request).await {
                Ok(resp) => return Ok(resp),
                Err(e) => e,
            };

            match self.retry_policy.delay_before_next(&err, attempts) {
                Some(delay) => {
                    warn!(
                        method = %request.method,
                        url = request.url.as_str(),
                        request_id = request.request_id.as_str(),
                        attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    debug!(
                        url = request.url.as_str(),
                        request_id = request.request_id.as_str(),
                        attempts,
                        "giving up on request"
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(&self, request: &PendingRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header(REQUEST_ID_HEADER, request.request_id.as_str());
        if let Some(body) = &request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.clone());
        }
        // Unbuildable requests are terminal.
        let mut raw = builder.build().map_err(|e| {
            Error::configuration(
                format!("cannot build request for {}", request.url),
                ErrorContext::new()
                    .with_field_path("request.url")
                    .with_details(e.to_string())
                    .with_request_id(request.request_id.clone())
                    .with_source("http_transport"),
            )
        })?;

        if let Some(auth) = &self.auth {
            let body: &[u8] = request.body.as_deref().unwrap_or_default();
            auth.sign(&mut raw, body)?;
        }

        debug!(
            method = %request.method,
            url = request.url.as_str(),
            request_id = request.request_id.as_str(),
            "sending request"
        );

        let start = Instant::now();
        let resp = self
            .client
            .execute(raw)
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        debug!(
            http_status = status,
            url = request.url.as_str(),
            request_id = request.request_id.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "response received"
        );
        if self.debug {
            debug!(
                request_id = request.request_id.as_str(),
                body = %String::from_utf8_lossy(&body),
                "response body"
            );
        }

        if status >= 400 {
            return Err(Error::Remote {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
                context: ErrorContext::new()
                    .with_status_code(status)
                    .with_request_id(request.request_id.clone())
                    .with_source("http_transport"),
            });
        }

        Ok(HttpResponse {
            status,
            body,
            request_id: request.request_id.clone(),
        })
    }
}
