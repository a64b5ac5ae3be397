//! Remote operations the group controller depends on.

use async_trait::async_trait;

use crate::client::cc::{AddInstanceArgs, ClusterClient, Instance, RemoveInstanceArgs, ScalingGroup};
use crate::cloud::group::Group;
use crate::Result;

/// Narrow view of the remote fleet used by [`crate::cloud::GroupController`].
#[async_trait]
pub trait ScalingService: Send + Sync {
    async fn list_instances(&self, group: &Group) -> Result<Vec<Instance>>;

    async fn add_instances(&self, group: &Group, delta: u32) -> Result<()>;

    async fn remove_instances(&self, group: &Group, instance_ids: &[String]) -> Result<()>;

    async fn describe_group(&self, group: &Group) -> Result<ScalingGroup>;

    /// True when `list_instances` ignores the group and reports the whole
    /// cluster. Membership is then listed once per refresh.
    fn lists_whole_cluster(&self) -> bool {
        false
    }
}

/// [`ScalingService`] backed by the cluster API. All groups live in one
/// cluster, so listing and scaling are addressed by cluster id.
pub struct ClusterScalingService {
    client: ClusterClient,
    cluster_id: String,
}

impl ClusterScalingService {
    pub fn new(client: ClusterClient, cluster_id: impl Into<String>) -> Self {
        Self {
            client,
            cluster_id: cluster_id.into(),
        }
    }
}

#[async_trait]
impl ScalingService for ClusterScalingService {
    async fn list_instances(&self, _group: &Group) -> Result<Vec<Instance>> {
        self.client.list_cluster_nodes(&self.cluster_id).await
    }

    async fn add_instances(&self, _group: &Group, delta: u32) -> Result<()> {
        self.client
            .add_instances(&AddInstanceArgs {
                cluster_id: self.cluster_id.clone(),
                delta,
            })
            .await
    }

    async fn remove_instances(&self, _group: &Group, instance_ids: &[String]) -> Result<()> {
        self.client
            .remove_instances(&RemoveInstanceArgs {
                cluster_id: self.cluster_id.clone(),
                node_ids: instance_ids.to_vec(),
            })
            .await
    }

    async fn describe_group(&self, group: &Group) -> Result<ScalingGroup> {
        self.client.describe_group(group.id()).await
    }

    fn lists_whole_cluster(&self) -> bool {
        true
    }
}
