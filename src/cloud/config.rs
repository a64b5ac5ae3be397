//! Static configuration read at startup.

use crate::client::config::ClientConfig;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Cloud provider configuration document (JSON).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    #[serde(rename = "ClusterId")]
    pub cluster_id: String,
    #[serde(rename = "ClusterName")]
    pub cluster_name: String,
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "CcRegion")]
    pub cc_region: String,
    #[serde(rename = "ErsRegion")]
    pub ers_region: String,
    #[serde(rename = "VpcId")]
    pub vpc_id: String,
    #[serde(rename = "MasterId")]
    pub master_id: String,
    #[serde(rename = "CcEndpoint")]
    pub cc_endpoint: String,
    #[serde(rename = "ErsEndpoint")]
    pub ers_endpoint: String,
    #[serde(rename = "NodeIP")]
    pub node_ip: String,
    #[serde(rename = "Debug")]
    pub debug: bool,
}

impl CloudConfig {
    /// Parse and validate. `None` means no config file was given, which
    /// yields an empty config and therefore a validation failure.
    pub fn from_reader<R: Read>(reader: Option<R>) -> Result<Self> {
        let cfg = match reader {
            Some(mut r) => {
                let mut contents = String::new();
                r.read_to_string(&mut contents)?;
                serde_json::from_str(&contents).map_err(|e| {
                    Error::configuration(
                        "malformed cloud config",
                        ErrorContext::new()
                            .with_details(e.to_string())
                            .with_source("cloud_config"),
                    )
                })?
            }
            None => CloudConfig::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            Error::configuration(
                format!("couldn't open cloud config {}", path.display()),
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("cloud_config"),
            )
        })?;
        Self::from_reader(Some(file))
    }

    pub fn validate(&self) -> Result<()> {
        if self.cluster_id.is_empty() {
            return Err(Error::configuration(
                "cloud config must have a ClusterId",
                ErrorContext::new().with_field_path("cloud_config.ClusterId"),
            ));
        }
        Ok(())
    }

    /// Client settings for the cluster API.
    pub fn cluster_client_config(&self) -> ClientConfig {
        let region = if self.cc_region.is_empty() {
            &self.region
        } else {
            &self.cc_region
        };
        ClientConfig::new()
            .with_region(region.clone())
            .with_endpoint(self.cc_endpoint.clone())
            .with_debug(self.debug)
    }

    /// Client settings for the elastic-group API.
    pub fn elastic_client_config(&self) -> ClientConfig {
        let region = if self.ers_region.is_empty() {
            &self.region
        } else {
            &self.ers_region
        };
        ClientConfig::new()
            .with_region(region.clone())
            .with_endpoint(self.ers_endpoint.clone())
            .with_debug(self.debug)
    }
}

/// Static node group declaration, `<min>:<max>:<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeGroupSpec {
    pub min_size: usize,
    pub max_size: usize,
    pub name: String,
}

impl NodeGroupSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |why: &str| {
            Error::configuration(
                format!("failed to parse node group spec {:?}: {}", spec, why),
                ErrorContext::new().with_source("node_group_spec"),
            )
        };

        let mut parts = spec.splitn(3, ':');
        let (min, max, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(min), Some(max), Some(name)) => (min, max, name),
            _ => return Err(invalid("expected <min>:<max>:<name>")),
        };
        let min_size = min
            .trim()
            .parse::<usize>()
            .map_err(|_| invalid("min size must be a non-negative integer"))?;
        let max_size = max
            .trim()
            .parse::<usize>()
            .map_err(|_| invalid("max size must be a non-negative integer"))?;
        if max_size < min_size {
            return Err(invalid("max size must be greater or equal to min size"));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid("name must not be empty"));
        }

        Ok(Self {
            min_size,
            max_size,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_config_round_trip_keys() {
        let raw =
            r#"{"ClusterId":"c-1","CcRegion":"bqj","CcEndpoint":"10.0.0.1:8080","Debug":true}"#;
        let cfg = CloudConfig::from_reader(Some(raw.as_bytes())).unwrap();
        assert_eq!(cfg.cluster_id, "c-1");
        assert!(cfg.debug);
        let client = cfg.cluster_client_config();
        assert_eq!(client.region(), "bqj");
        assert_eq!(client.endpoint.as_deref(), Some("10.0.0.1:8080"));
        assert!(client.debug);
    }

    #[test]
    fn test_missing_cluster_id_is_fatal() {
        let err = CloudConfig::from_reader(Some(r#"{"Region":"bqj"}"#.as_bytes())).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        let err = CloudConfig::from_reader(None::<&[u8]>).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_malformed_json_is_configuration_error() {
        let err = CloudConfig::from_reader(Some("{not json".as_bytes())).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_region_fallback() {
        let cfg = CloudConfig {
            cluster_id: "c".into(),
            region: "bqj".into(),
            ..Default::default()
        };
        assert_eq!(cfg.elastic_client_config().region(), "bqj");
        assert!(cfg.elastic_client_config().endpoint.is_none());
    }

    #[test]
    fn test_node_group_spec() {
        let spec = NodeGroupSpec::parse("1:5:asg-a").unwrap();
        assert_eq!(
            spec,
            NodeGroupSpec {
                min_size: 1,
                max_size: 5,
                name: "asg-a".into()
            }
        );
        assert_eq!(NodeGroupSpec::parse("0:0:zero").unwrap().max_size, 0);
        assert_eq!(NodeGroupSpec::parse("0:3:ns:pool").unwrap().name, "ns:pool");

        for bad in ["", "1:5", "5:1:asg", "-1:5:asg", "a:5:asg", "1:5:", "1:x:asg"] {
            assert!(NodeGroupSpec::parse(bad).is_err(), "{bad}");
        }
    }
}
