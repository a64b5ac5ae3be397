//! Instance → group index.
//!
//! Groups are registered at startup. Membership is never inferred: it is
//! swapped in wholesale by [`GroupRegistry::replace_members`] after the
//! remote fleet has been listed, since the remote API is authoritative.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

use crate::cloud::group::Group;
use crate::{Error, ErrorContext, Result};

#[derive(Debug, Default)]
struct RegistryState {
    groups: Vec<Arc<Group>>,
    /// instance id -> group id
    members: HashMap<String, String>,
}

/// Shared-read, exclusive-write registry of node groups.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    state: RwLock<RegistryState>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a group. Ids must be unique.
    pub fn register(&self, group: Group) -> Result<Arc<Group>> {
        let mut state = self.write();
        if state.groups.iter().any(|g| g.id() == group.id()) {
            return Err(Error::configuration(
                format!("group {} registered twice", group.id()),
                ErrorContext::new()
                    .with_group_id(group.id())
                    .with_source("group_registry"),
            ));
        }
        let group = Arc::new(group);
        state.groups.push(group.clone());
        Ok(group)
    }

    pub fn get(&self, group_id: &str) -> Option<Arc<Group>> {
        self.read().groups.iter().find(|g| g.id() == group_id).cloned()
    }

    /// Registered groups, in registration order.
    pub fn groups(&self) -> Vec<Arc<Group>> {
        self.read().groups.clone()
    }

    pub fn find_for_instance(&self, instance_id: &str) -> Result<Arc<Group>> {
        let state = self.read();
        state
            .members
            .get(instance_id)
            .and_then(|gid| state.groups.iter().find(|g| g.id() == gid.as_str()))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                instance_id: instance_id.to_string(),
            })
    }

    /// Replace the whole membership index. Entries naming unknown groups are dropped.
    pub fn replace_members(&self, members: HashMap<String, String>) {
        let mut state = self.write();
        let members: HashMap<String, String> = members
            .into_iter()
            .filter(|(instance, gid)| {
                let known = state.groups.iter().any(|g| g.id() == gid.as_str());
                if !known {
                    warn!(
                        instance_id = instance.as_str(),
                        group_id = gid.as_str(),
                        "dropping membership for unregistered group"
                    );
                }
                known
            })
            .collect();
        state.members = members;
    }

    /// Instance ids currently indexed for `group_id`.
    pub fn members_of(&self, group_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .read()
            .members
            .iter()
            .filter(|(_, gid)| gid.as_str() == group_id)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}
