//! Elastic-group API family.

use crate::client::cc::require_id;
use crate::client::config::ClientConfig;
use crate::client::endpoint::RegionTable;
use crate::client::gateway::RequestGateway;
use crate::client::ApiEnvelope;
use crate::Result;
use reqwest::Method;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ElasticGroup {
    #[serde(rename = "elasticgroupid")]
    pub elastic_group_id: String,
    pub name: String,
    pub res_type: i64,
    /// Owning cluster id.
    pub ccid: String,
    #[serde(rename = "elasticgroupitems")]
    pub elastic_instances: Vec<serde_json::Map<String, serde_json::Value>>,
    pub notes: String,
}

pub struct ElasticGroupClient {
    gateway: RequestGateway,
}

impl ElasticGroupClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let gateway = RequestGateway::connect(config, Arc::new(RegionTable::elastic_defaults()))?;
        Ok(Self { gateway })
    }

    pub fn from_gateway(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    pub async fn describe_elastic_group(&self, group_id: &str) -> Result<ElasticGroup> {
        require_id(group_id, "group_id")?;
        let path = format!("/api/elasticgroups/{}/get", crate::transport::url_encode(group_id));
        let envelope: ApiEnvelope<ElasticGroup> = self
            .gateway
            .call::<(), _>(Method::GET, &path, None, None)
            .await?;
        Ok(envelope.into_result()?.unwrap_or_default())
    }
}
