//! Size-bound and membership enforcement for scale operations.
//!
//! Every operation validates locally first and only then talks to the remote
//! API. Checks are advisory: the remote fleet can change underneath us, and
//! the remote API has the final say.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::cloud::group::Group;
use crate::cloud::registry::GroupRegistry;
use crate::cloud::service::ScalingService;
use crate::{Error, ErrorContext, Result};

/// Pause after a removal so back-to-back deletes don't trip API flow control.
pub const DEFAULT_DELETE_COOLDOWN: Duration = Duration::from_millis(200);

pub struct GroupController {
    registry: Arc<GroupRegistry>,
    service: Arc<dyn ScalingService>,
    cooldown: Duration,
}

impl GroupController {
    pub fn new(registry: Arc<GroupRegistry>, service: Arc<dyn ScalingService>) -> Self {
        Self {
            registry,
            service,
            cooldown: DEFAULT_DELETE_COOLDOWN,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn registry(&self) -> &Arc<GroupRegistry> {
        &self.registry
    }

    fn group(&self, group_id: &str) -> Result<Arc<Group>> {
        self.registry.get(group_id).ok_or_else(|| {
            Error::validation(
                format!("unknown group {}", group_id),
                ErrorContext::new()
                    .with_group_id(group_id)
                    .with_source("group_controller"),
            )
        })
    }

    /// Ids of the instances the remote API reports for `group_id`.
    pub async fn list_instances(&self, group_id: &str) -> Result<Vec<String>> {
        let group = self.group(group_id)?;
        let instances = self
            .service
            .list_instances(&group)
            .await
            .map_err(|e| {
                Error::communication(format!("list instances of group {}", group.id()), e)
            })?;
        Ok(instances.into_iter().map(|i| i.id).collect())
    }

    /// Live instance count of `group_id`.
    pub async fn current_size(&self, group_id: &str) -> Result<usize> {
        let group = self.group(group_id)?;
        self.size_of(&group).await
    }

    async fn size_of(&self, group: &Group) -> Result<usize> {
        let instances = self.service.list_instances(group).await.map_err(|e| {
            warn!(group_id = group.id(), error = %e, "failed to get group size");
            Error::communication(format!("describe group {}", group.id()), e)
        })?;
        Ok(instances.len())
    }

    /// Add `delta` instances, never going above the group's max size.
    pub async fn increase(&self, group_id: &str, delta: i64) -> Result<()> {
        let group = self.group(group_id)?;
        info!(group_id = group.id(), delta, "increase group size");
        if delta <= 0 {
            return Err(Error::validation(
                "size increase must be positive",
                ErrorContext::new()
                    .with_group_id(group.id())
                    .with_details(format!("delta: {}", delta)),
            ));
        }
        let delta = u32::try_from(delta).map_err(|_| {
            Error::validation(
                "size increase is out of range",
                ErrorContext::new()
                    .with_group_id(group.id())
                    .with_details(format!("delta: {}", delta)),
            )
        })?;

        let size = self.size_of(&group).await?;
        let desired = size.saturating_add(delta as usize);
        if desired > group.max_size() {
            return Err(Error::invariant(
                format!(
                    "size increase is too large - desired:{} max:{}",
                    desired,
                    group.max_size()
                ),
                ErrorContext::new()
                    .with_group_id(group.id())
                    .with_source("group_controller"),
            ));
        }

        self.service
            .add_instances(&group, delta)
            .await
            .map_err(|e| Error::communication(format!("scale up group {}", group.id()), e))?;
        info!(group_id = group.id(), from = size, to = desired, "scale up issued");
        Ok(())
    }

    /// Lowering the target without removing nodes is not supported.
    pub async fn decrease(&self, group_id: &str, delta: i64) -> Result<()> {
        let _ = (group_id, delta);
        Err(Error::NotImplemented("decrease target size"))
    }

    /// Owning group of `instance_id`, re-listing the fleet once on a miss.
    pub async fn find_group(&self, instance_id: &str) -> Result<Arc<Group>> {
        match self.registry.find_for_instance(instance_id) {
            Ok(group) => Ok(group),
            Err(Error::NotFound { .. }) => {
                self.refresh_membership().await?;
                self.registry.find_for_instance(instance_id)
            }
            Err(e) => Err(e),
        }
    }

    /// Rebuild the instance → group index from the remote API.
    ///
    /// When two groups report the same instance, the first registered wins.
    /// A cluster-wide service is listed once and every instance goes to the
    /// first registered group.
    pub async fn refresh_membership(&self) -> Result<()> {
        let mut groups = self.registry.groups();
        if self.service.lists_whole_cluster() {
            groups.truncate(1);
        }

        let mut members: HashMap<String, String> = HashMap::new();
        for group in groups {
            let instances = self.service.list_instances(&group).await.map_err(|e| {
                Error::communication(format!("list instances of group {}", group.id()), e)
            })?;
            for instance in instances {
                match members.get(&instance.id) {
                    Some(owner) if owner.as_str() != group.id() => {
                        warn!(
                            instance_id = instance.id.as_str(),
                            owner = owner.as_str(),
                            also_claimed_by = group.id(),
                            "instance reported by more than one group"
                        );
                    }
                    Some(_) => {}
                    None => {
                        members.insert(instance.id, group.id().to_string());
                    }
                }
            }
        }
        self.registry.replace_members(members);
        Ok(())
    }

    /// Remove exactly `instance_ids`, repeats dropped. All of them must belong
    /// to one group, and the group must stay at or above its min size.
    pub async fn delete(&self, instance_ids: &[String]) -> Result<()> {
        info!(instances = ?instance_ids, "start to remove instances");
        let mut seen = HashSet::new();
        let instance_ids: Vec<String> = instance_ids
            .iter()
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();
        let Some(first) = instance_ids.first() else {
            warn!("no instance ids given to remove");
            return Ok(());
        };

        let common = self.find_group(first).await?;
        for id in &instance_ids[1..] {
            let group = self.find_group(id).await?;
            if group.id() != common.id() {
                return Err(Error::invariant(
                    "cannot delete instances which don't belong to the same group",
                    ErrorContext::new()
                        .with_group_id(common.id())
                        .with_instance_ids(instance_ids.iter().cloned())
                        .with_details(format!("{} belongs to {}", id, group.id())),
                ));
            }
        }

        let size = self.size_of(&common).await?;
        if size < common.min_size() + instance_ids.len() {
            return Err(Error::invariant(
                format!(
                    "min size reached, removing {} of {} would go below {}",
                    instance_ids.len(),
                    size,
                    common.min_size()
                ),
                ErrorContext::new()
                    .with_group_id(common.id())
                    .with_instance_ids(instance_ids.iter().cloned()),
            ));
        }

        if let Err(e) = self.service.remove_instances(&common, &instance_ids).await {
            error!(group_id = common.id(), error = %e, "failed to remove instances from group");
            return Err(Error::communication(
                format!("remove instances from group {}", common.id()),
                e,
            ));
        }

        tokio::time::sleep(self.cooldown).await;
        Ok(())
    }
}
