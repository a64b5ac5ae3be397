//! Cluster API family: cluster description, node listing and node add/remove.

use crate::client::config::ClientConfig;
use crate::client::endpoint::RegionTable;
use crate::client::gateway::RequestGateway;
use crate::client::ApiEnvelope;
use crate::{Error, ErrorContext, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

const NODE_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddInstanceArgs {
    #[serde(rename = "clusterId")]
    pub cluster_id: String,
    pub delta: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoveInstanceArgs {
    #[serde(rename = "clusterId")]
    pub cluster_id: String,
    #[serde(rename = "nodeId")]
    pub node_ids: Vec<String>,
}

/// One node as reported by `/cluster/nodes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub role: i32,
    /// Lifecycle status code as returned by the API.
    pub status: i32,
    pub spec: String,
    pub cpu_use: String,
    pub mem_use: String,
    pub up_time: String,
    pub vm_id: String,
    pub node_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NodePage {
    page_items: Vec<Instance>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerCluster {
    #[serde(rename = "ID", alias = "Id", alias = "id")]
    pub id: String,
    pub name: String,
    pub cluster_name: String,
    pub cluster_type: i32,
    pub k8s_version: i32,
    pub container_runtime: i32,
    pub network_plugin_type: i32,
    pub pod_network_cider: String,
    pub service_cider: String,
    pub node_count: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Scaling group descriptor from `/v1/cluster/group`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScalingGroup {
    pub instance_type: i32,
    pub cpu: i32,
    pub memory: i32,
    pub gpu_count: i32,
    pub gpu_card: String,
    pub disk_size: i32,
    pub ephemeral_storage: i32,
    pub tags: Vec<Tag>,
}

pub struct ClusterClient {
    gateway: RequestGateway,
}

impl ClusterClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let gateway = RequestGateway::connect(config, Arc::new(RegionTable::cluster_defaults()))?;
        Ok(Self { gateway })
    }

    pub fn from_gateway(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    pub async fn describe_cluster(&self, cluster_id: &str) -> Result<ContainerCluster> {
        require_id(cluster_id, "cluster_id")?;
        self.gateway
            .call(
                Method::POST,
                "/cluster/get",
                None,
                Some(&json!({ "id": cluster_id })),
            )
            .await
    }

    /// All nodes of the cluster (single page of up to 1000 items).
    pub async fn list_cluster_nodes(&self, cluster_id: &str) -> Result<Vec<Instance>> {
        require_id(cluster_id, "cluster_id")?;
        let body = json!({
            "filter": { "clusterId": cluster_id },
            "pageIndex": 1,
            "pageSize": NODE_PAGE_SIZE,
            "sorter": null,
        });
        let envelope: ApiEnvelope<NodePage> = self
            .gateway
            .call(Method::POST, "/cluster/nodes", None, Some(&body))
            .await?;
        Ok(envelope.into_result()?.unwrap_or_default().page_items)
    }

    pub async fn add_instances(&self, args: &AddInstanceArgs) -> Result<()> {
        require_id(&args.cluster_id, "cluster_id")?;
        let resp = self
            .gateway
            .call_raw(Method::POST, "/cluster/nodes/add", None, Some(args))
            .await?;
        check_envelope(&resp.body)
    }

    pub async fn remove_instances(&self, args: &RemoveInstanceArgs) -> Result<()> {
        require_id(&args.cluster_id, "cluster_id")?;
        let resp = self
            .gateway
            .call_raw(Method::POST, "/cluster/nodes/delete", None, Some(args))
            .await?;
        check_envelope(&resp.body)
    }

    pub async fn describe_group(&self, group_id: &str) -> Result<ScalingGroup> {
        require_id(group_id, "group_id")?;
        let mut params = HashMap::new();
        params.insert("groupId".to_string(), group_id.to_string());
        self.gateway
            .call::<(), _>(Method::GET, "/v1/cluster/group", Some(&params), None)
            .await
    }
}

pub(crate) fn require_id(id: &str, field: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::validation(
            format!("{} should not be empty", field),
            ErrorContext::new().with_field_path(field),
        ));
    }
    Ok(())
}

/// Add/remove replies are an envelope or nothing; only an explicit failure counts.
fn check_envelope(bytes: &[u8]) -> Result<()> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    match serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(bytes) {
        Ok(envelope) => envelope.into_result().map(|_| ()),
        Err(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_args_wire_shape() {
        let args = RemoveInstanceArgs {
            cluster_id: "c-1".into(),
            node_ids: vec!["n1".into(), "n2".into()],
        };
        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            json!({ "clusterId": "c-1", "nodeId": ["n1", "n2"] })
        );
    }

    #[test]
    fn test_instance_decodes_camel_case() {
        let inst: Instance = serde_json::from_value(json!({
            "id": "i-1", "status": 2, "vmId": "vm-9", "cpuUse": "12%"
        }))
        .unwrap();
        assert_eq!(inst.id, "i-1");
        assert_eq!(inst.status, 2);
        assert_eq!(inst.vm_id, "vm-9");
        assert_eq!(inst.cpu_use, "12%");
    }

    #[test]
    fn test_check_envelope() {
        assert!(check_envelope(b"").is_ok());
        assert!(check_envelope(b"not json").is_ok());
        assert!(check_envelope(br#"{"success":true,"code":0}"#).is_ok());
        let err = check_envelope(br#"{"success":false,"code":42,"message":"quota"}"#).unwrap_err();
        assert!(matches!(err, Error::Rejected { code: 42, .. }));
    }
}
