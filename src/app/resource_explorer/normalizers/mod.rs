//! Projection of raw `aws ... --output json` payloads into the flat records the
//! dashboard serves.
//!
//! Each supported [`ResourceKind`] has one normalizer. A normalizer knows which
//! CLI operation lists its resources, how to turn one region's output into
//! records, and how to place the merged records into a [`ServiceResources`]
//! response. The aggregator is generic over this trait, so adding a kind means
//! adding a normalizer and nothing else.

use super::aggregator::AggregateResult;
use super::cli_errors::CliError;
use super::state::{ResourceKind, ServiceResources};

pub mod ec2;
pub mod eip;
pub mod rds;
pub mod rekognition;
pub mod s3;
pub mod vpc;

pub use ec2::*;
pub use eip::*;
pub use rds::*;
pub use rekognition::*;
pub use s3::*;
pub use vpc::*;

/// Trait for normalizing AWS CLI output into per-kind records
pub trait ResourceNormalizer: Send + Sync + 'static {
    /// Record type produced for this kind
    type Record: Send + 'static;

    /// The resource kind this normalizer handles
    fn kind(&self) -> ResourceKind;

    /// CLI operation listing the resources, without `--region` or `--output`
    fn operation(&self) -> &'static [&'static str];

    /// Parse one CLI response. `region` is the region the call was made
    /// against, or `None` when the CLI default region was used.
    fn normalize(&self, raw: &[u8], region: Option<&str>) -> Result<Vec<Self::Record>, CliError>;

    /// Place aggregated records into the HTTP response shape
    fn into_service_resources(&self, result: AggregateResult<Self::Record>) -> ServiceResources;
}

/// Helper functions for common normalization tasks
pub mod utils {
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Tag {
        #[serde(default)]
        pub key: Option<String>,
        #[serde(default)]
        pub value: Option<String>,
    }

    /// Value of the `Name` tag, or an empty string
    pub fn name_tag(tags: &[Tag]) -> String {
        tags.iter()
            .find(|t| t.key.as_deref() == Some("Name"))
            .and_then(|t| t.value.clone())
            .unwrap_or_default()
    }

    /// Region of an availability zone, e.g. `us-east-1a` -> `us-east-1`
    pub fn region_from_az(az: &str) -> String {
        if az.chars().count() > 1 {
            let mut chars = az.chars();
            chars.next_back();
            chars.as_str().to_string()
        } else {
            String::new()
        }
    }

    /// Owned region string for records, empty when the CLI default was used
    pub fn region_label(region: Option<&str>) -> String {
        region.unwrap_or_default().to_string()
    }
}
