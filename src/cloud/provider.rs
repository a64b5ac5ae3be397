use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::client::cc::ClusterClient;
use crate::cloud::config::{CloudConfig, NodeGroupSpec};
use crate::cloud::controller::GroupController;
use crate::cloud::group::Group;
use crate::cloud::registry::GroupRegistry;
use crate::cloud::service::{ClusterScalingService, ScalingService};
use crate::{Error, ErrorContext, Result};

pub const PROVIDER_NAME: &str = "sgcloud";

/// `sgcloud://<instance id>`
pub fn provider_id(instance_id: &str) -> String {
    format!("{}://{}", PROVIDER_NAME, instance_id)
}

/// Instance id from a provider id of the form `<scheme>://<instance id>`.
pub fn instance_id_from_provider_id(provider_id: &str) -> Result<String> {
    match provider_id.split_once("//") {
        Some((_, id)) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(Error::validation(
            format!("unexpected provider id format, provider_id={}", provider_id),
            ErrorContext::new().with_source("provider_id"),
        )),
    }
}

/// Orchestrator-facing facade: statically discovered groups over one cluster.
pub struct SgcloudProvider {
    config: CloudConfig,
    controller: GroupController,
}

impl SgcloudProvider {
    /// Build against the live cluster API.
    ///
    /// The cluster API lists nodes per cluster, not per group, so every group
    /// reports the whole cluster's size. Declare a single node group.
    pub fn build(config: CloudConfig, specs: &[String]) -> Result<Self> {
        if specs.len() > 1 {
            warn!(
                groups = specs.len(),
                "cluster API is not group-scoped; every group will report the whole cluster"
            );
        }
        config.validate()?;
        let client = ClusterClient::new(config.cluster_client_config())?;
        let service = Arc::new(ClusterScalingService::new(client, config.cluster_id.clone()));
        Self::with_service(config, specs, service)
    }

    /// Build with an explicit service implementation.
    pub fn with_service(
        config: CloudConfig,
        specs: &[String],
        service: Arc<dyn ScalingService>,
    ) -> Result<Self> {
        config.validate()?;
        if specs.is_empty() {
            return Err(Error::configuration(
                "node group specs must be specified",
                ErrorContext::new().with_source("sgcloud_provider"),
            ));
        }

        let registry = Arc::new(GroupRegistry::new());
        for raw in specs {
            let spec = NodeGroupSpec::parse(raw).map_err(|e| {
                error!(spec = raw.as_str(), error = %e, "failed to build group from spec");
                e
            })?;
            let group = Group::new(spec.name, spec.min_size, spec.max_size)?
                .with_region(config.region.clone());
            let group = registry.register(group)?;
            info!(group = %group, "registered node group");
        }

        Ok(Self {
            config,
            controller: GroupController::new(registry, service),
        })
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.controller = self.controller.with_cooldown(cooldown);
        self
    }

    pub fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    pub fn controller(&self) -> &GroupController {
        &self.controller
    }

    pub fn node_groups(&self) -> Vec<Arc<Group>> {
        self.controller.registry().groups()
    }

    pub async fn node_group_for_node(&self, provider_id: &str) -> Result<Arc<Group>> {
        let instance_id = instance_id_from_provider_id(provider_id)?;
        self.controller.find_group(&instance_id).await
    }

    /// Provider ids of the group's instances.
    pub async fn list_instances(&self, group_id: &str) -> Result<Vec<String>> {
        let ids = self.controller.list_instances(group_id).await?;
        Ok(ids.iter().map(|id| provider_id(id)).collect())
    }

    pub async fn current_size(&self, group_id: &str) -> Result<usize> {
        self.controller.current_size(group_id).await
    }

    pub async fn increase(&self, group_id: &str, delta: i64) -> Result<()> {
        self.controller.increase(group_id, delta).await
    }

    pub async fn decrease_target_size(&self, group_id: &str, delta: i64) -> Result<()> {
        self.controller.decrease(group_id, delta).await
    }

    /// Delete nodes addressed by provider id.
    pub async fn delete_nodes(&self, provider_ids: &[String]) -> Result<()> {
        let ids = provider_ids
            .iter()
            .map(|p| instance_id_from_provider_id(p))
            .collect::<Result<Vec<_>>>()?;
        self.controller.delete(&ids).await
    }

    pub async fn refresh(&self) -> Result<()> {
        self.controller.refresh_membership().await
    }
}
