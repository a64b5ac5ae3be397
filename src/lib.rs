//! # sgcloud-autoscaler
//!
//! Autoscaler adapter for SGCloud. It turns the orchestrator's generic
//! "list / size / increase / delete" node group operations into retried,
//! authenticated calls against the SGCloud API, and keeps an index of which
//! group owns which instance.
//!
//! ## Overview
//!
//! Two layers carry the weight:
//!
//! - **Transport**: canonical query strings, a pure retry policy, and an HTTP
//!   transport that snapshots request bodies so every retry resends identical
//!   bytes.
//! - **Reconciliation**: statically configured groups with min/max bounds, a
//!   registry mapping instances to groups, and a controller that rejects
//!   out-of-bounds or cross-group operations before anything hits the network.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sgcloud_autoscaler::cloud::{CloudConfig, SgcloudProvider};
//!
//! #[tokio::main]
//! async fn main() -> sgcloud_autoscaler::Result<()> {
//!     let config = CloudConfig::from_path("/etc/sgcloud/cloud-config.json")?;
//!     let provider = SgcloudProvider::build(config, &["1:10:workers".to_string()])?;
//!
//!     let size = provider.current_size("workers").await?;
//!     if size < 10 {
//!         provider.increase("workers", 1).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`transport`] | Query encoding, retry policy, retrying HTTP transport |
//! | [`client`] | Request gateway and typed API families (cluster, elastic group) |
//! | [`cloud`] | Groups, registry, controller and the provider facade |
//! | [`error`] | Unified error type |

pub mod client;
pub mod cloud;
pub mod transport;

pub use client::{ClientConfig, ClusterClient, ElasticGroupClient, RequestGateway};
pub use cloud::{CloudConfig, Group, GroupController, GroupRegistry, SgcloudProvider};
pub use transport::{DefaultRetryPolicy, HttpTransport, RetryPolicy};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
