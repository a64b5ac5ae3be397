use thiserror::Error;

/// Structured error context for logging and caller-side inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "cloud_config.ClusterId")
    pub field_path: Option<String>,
    /// Additional context about the error
    pub details: Option<String>,
    /// Component that raised the error (e.g., "group_controller", "request_gateway")
    pub source: Option<String>,
    /// Node group the operation targeted
    pub group_id: Option<String>,
    /// Instance ids involved in the operation
    pub instance_ids: Vec<String>,
    /// HTTP status code, when the error came back from the remote API
    pub status_code: Option<u16>,
    /// Correlation id of the logical request
    pub request_id: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_instance_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instance_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

/// Unified error type for the autoscaler adapter.
///
/// Variants map onto the failure classes callers need to tell apart:
/// network failures, HTTP failures carrying the remote payload, local
/// invariant rejections that never reached the network, and fatal
/// configuration problems.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Remote error: HTTP {status}: {body}")]
    Remote {
        status: u16,
        body: String,
        context: ErrorContext,
    },

    #[error("Remote rejected request (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Response decode error: HTTP {status}: {source}; body: {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        status: u16,
        body: String,
        context: ErrorContext,
    },

    #[error("Request serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Invariant violation: {message}{}", format_context(.context))]
    InvariantViolation {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("instance {instance_id} does not belong to any registered group")]
    NotFound { instance_id: String },

    #[error("failed to {operation}: {source}")]
    Communication {
        operation: String,
        #[source]
        source: Box<Error>,
    },

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref group) = ctx.group_id {
        parts.push(format!("group: {}", group));
    }
    if !ctx.instance_ids.is_empty() {
        parts.push(format!("instances: [{}]", ctx.instance_ids.join(", ")));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn invariant(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvariantViolation {
            message: msg.into(),
            context,
        }
    }

    pub fn validation(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Wrap a lower-level failure with the operation that was being attempted.
    pub fn communication(operation: impl Into<String>, source: Error) -> Self {
        Error::Communication {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Remote { context, .. }
            | Error::Decode { context, .. }
            | Error::InvariantViolation { context, .. }
            | Error::Validation { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            Error::Communication { source, .. } => source.context(),
            _ => None,
        }
    }

    /// HTTP status carried by this error, looking through communication wrappers.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. } | Error::Decode { status, .. } => Some(*status),
            Error::Communication { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Transient server-side failure (internal error, bad gateway, unavailable).
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500 | 502 | 503))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    pub fn is_bad_request(&self) -> bool {
        self.status() == Some(400)
    }

    pub fn is_transport(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Communication { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    /// Rejected locally before any request was issued.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::InvariantViolation { .. })
    }
}
