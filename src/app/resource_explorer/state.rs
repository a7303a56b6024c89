use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource kinds the dashboard can drill into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Ec2,
    Vpc,
    #[serde(rename = "eip")]
    ElasticIp,
    S3,
    Rds,
    Rekognition,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Ec2,
        ResourceKind::Vpc,
        ResourceKind::ElasticIp,
        ResourceKind::S3,
        ResourceKind::Rekognition,
        ResourceKind::Rds,
    ];

    /// Parse the service segment of `/api/services/{service}/resources`.
    pub fn parse(service: &str) -> Option<Self> {
        match service.to_lowercase().as_str() {
            "ec2" => Some(ResourceKind::Ec2),
            "vpc" => Some(ResourceKind::Vpc),
            "eip" | "elasticip" | "elastic-ips" => Some(ResourceKind::ElasticIp),
            "s3" => Some(ResourceKind::S3),
            "rds" => Some(ResourceKind::Rds),
            "rekognition" => Some(ResourceKind::Rekognition),
            _ => None,
        }
    }

    /// Canonical service key used in responses and drilldown links.
    pub fn key(&self) -> &'static str {
        match self {
            ResourceKind::Ec2 => "ec2",
            ResourceKind::Vpc => "vpc",
            ResourceKind::ElasticIp => "eip",
            ResourceKind::S3 => "s3",
            ResourceKind::Rds => "rds",
            ResourceKind::Rekognition => "rekognition",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Ec2 => "EC2",
            ResourceKind::Vpc => "VPC",
            ResourceKind::ElasticIp => "Elastic IPs",
            ResourceKind::S3 => "S3",
            ResourceKind::Rds => "RDS",
            ResourceKind::Rekognition => "Rekognition",
        }
    }

    /// JSON field of [`ServiceResources`] holding this kind's records.
    pub fn resource_field(&self) -> &'static str {
        match self {
            ResourceKind::Ec2 => "ec2Instances",
            ResourceKind::Vpc => "vpcs",
            ResourceKind::ElasticIp => "elasticIps",
            ResourceKind::S3 => "s3Buckets",
            ResourceKind::Rds => "rdsInstances",
            ResourceKind::Rekognition => "rekognitionCollections",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which regions a query should cover.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegionSelector {
    /// No `--region` flag; the CLI uses its configured default.
    Default,
    /// A single named region.
    Region(String),
    /// Every opted-in region for the account.
    All,
}

impl RegionSelector {
    pub fn parse(region: &str) -> Self {
        let trimmed = region.trim();
        if trimmed.is_empty() {
            RegionSelector::Default
        } else if trimmed.eq_ignore_ascii_case("all") {
            RegionSelector::All
        } else {
            RegionSelector::Region(trimmed.to_string())
        }
    }

    /// Region name for a single-region call, if one was given.
    pub fn region(&self) -> Option<&str> {
        match self {
            RegionSelector::Region(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for RegionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionSelector::Default => Ok(()),
            RegionSelector::Region(name) => f.write_str(name),
            RegionSelector::All => f.write_str("all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ec2Instance {
    pub instance_id: String,
    pub name: String,
    pub state: String,
    pub instance_type: String,
    pub availability_zone: String,
    pub private_ip: String,
    pub public_ip: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vpc {
    pub vpc_id: String,
    pub name: String,
    pub cidr_block: String,
    pub state: String,
    pub is_default: bool,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElasticIp {
    pub allocation_id: String,
    pub public_ip: String,
    pub association_id: String,
    pub instance_id: String,
    pub network_interface_id: String,
    pub domain: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Bucket {
    pub name: String,
    pub creation_date: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdsInstance {
    pub db_instance_identifier: String,
    pub engine: String,
    pub status: String,
    pub db_instance_class: String,
    pub availability_zone: String,
    pub endpoint: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RekognitionCollection {
    pub collection_id: String,
    pub face_model_version: String,
    pub region: String,
}

/// Response body of `/api/services/{service}/resources`.
///
/// Only the list matching `service` is populated; empty lists and an empty
/// message are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResources {
    pub service: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ec2_instances: Vec<Ec2Instance>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vpcs: Vec<Vpc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elastic_ips: Vec<ElasticIp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub s3_buckets: Vec<S3Bucket>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rekognition_collections: Vec<RekognitionCollection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rds_instances: Vec<RdsInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServiceResources {
    pub fn empty(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Default::default()
        }
    }

    /// Number of records for the given kind.
    pub fn count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Ec2 => self.ec2_instances.len(),
            ResourceKind::Vpc => self.vpcs.len(),
            ResourceKind::ElasticIp => self.elastic_ips.len(),
            ResourceKind::S3 => self.s3_buckets.len(),
            ResourceKind::Rds => self.rds_instances.len(),
            ResourceKind::Rekognition => self.rekognition_collections.len(),
        }
    }
}

/// Per-service entry of `/api/resources/summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub service: String,
    pub display_name: String,
    pub resource_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcesSummaryResponse {
    pub summaries: Vec<ResourceSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_aliases() {
        assert_eq!(ResourceKind::parse("EC2"), Some(ResourceKind::Ec2));
        assert_eq!(ResourceKind::parse("elastic-ips"), Some(ResourceKind::ElasticIp));
        assert_eq!(ResourceKind::parse("ElasticIP"), Some(ResourceKind::ElasticIp));
        assert_eq!(ResourceKind::parse("lambda"), None);
        assert_eq!(ResourceKind::ElasticIp.key(), "eip");
    }

    #[test]
    fn test_region_selector_parse() {
        assert_eq!(RegionSelector::parse(""), RegionSelector::Default);
        assert_eq!(RegionSelector::parse("ALL"), RegionSelector::All);
        assert_eq!(
            RegionSelector::parse(" us-east-1 "),
            RegionSelector::Region("us-east-1".to_string())
        );
        assert_eq!(RegionSelector::All.region(), None);
    }

    #[test]
    fn test_empty_lists_are_omitted() {
        let resources = ServiceResources {
            service: "vpc".to_string(),
            vpcs: vec![Vpc {
                vpc_id: "vpc-1".to_string(),
                name: "main".to_string(),
                cidr_block: "10.0.0.0/16".to_string(),
                state: "available".to_string(),
                is_default: true,
                region: "us-east-1".to_string(),
            }],
            ..Default::default()
        };

        let json = serde_json::to_value(&resources).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(json["vpcs"][0]["cidrBlock"], "10.0.0.0/16");
        assert_eq!(json["vpcs"][0]["isDefault"], true);
        assert!(object.get("message").is_none());
        assert_eq!(resources.count(ResourceKind::Vpc), 1);
    }
}
