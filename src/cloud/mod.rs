//! Node group reconciliation: static groups, the instance → group index, and
//! the controller that enforces size bounds and same-group deletion.

pub mod config;
pub mod controller;
pub mod group;
pub mod provider;
pub mod registry;
pub mod service;

pub use config::{CloudConfig, NodeGroupSpec};
pub use controller::{GroupController, DEFAULT_DELETE_COOLDOWN};
pub use group::Group;
pub use provider::{instance_id_from_provider_id, provider_id, SgcloudProvider};
pub use registry::GroupRegistry;
pub use service::{ClusterScalingService, ScalingService};
