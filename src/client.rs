//! API clients for SGCloud.
//!
//! Each API family (cluster, elastic group) is a thin typed layer over a
//! [`RequestGateway`] holding its own endpoint resolver. Families share one
//! pooled transport when built through [`ClientConfig`] + [`RequestGateway::new`].

pub mod cc;
pub mod config;
pub mod endpoint;
pub mod ers;
pub mod gateway;

pub use cc::{
    AddInstanceArgs, ClusterClient, ContainerCluster, Instance, RemoveInstanceArgs, ScalingGroup,
};
pub use config::ClientConfig;
pub use endpoint::{EndpointResolver, RegionTable};
pub use ers::{ElasticGroup, ElasticGroupClient};
pub use gateway::RequestGateway;

use serde::Deserialize;

/// Common `{data, code, message, success}` response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub code: i64,
    pub message: Option<String>,
    pub success: Option<bool>,
}

impl<T> ApiEnvelope<T> {
    /// Reject envelopes that explicitly report `success: false`.
    pub fn into_result(self) -> crate::Result<Option<T>> {
        if self.success == Some(false) {
            return Err(crate::Error::Rejected {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }
        Ok(self.data)
    }
}
