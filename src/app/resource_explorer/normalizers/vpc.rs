use super::utils::*;
use super::*;
use crate::app::resource_explorer::state::Vpc;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeVpcsOutput {
    #[serde(default)]
    vpcs: Vec<RawVpc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawVpc {
    #[serde(default)]
    vpc_id: Option<String>,
    #[serde(default)]
    cidr_block: Option<String>,
    #[serde(default)]
    is_default: Option<bool>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    tags: Option<Vec<Tag>>,
}

/// Normalizer for VPCs (`ec2 describe-vpcs`)
pub struct VpcNormalizer;

impl ResourceNormalizer for VpcNormalizer {
    type Record = Vpc;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Vpc
    }

    fn operation(&self) -> &'static [&'static str] {
        &["ec2", "describe-vpcs"]
    }

    fn normalize(&self, raw: &[u8], region: Option<&str>) -> Result<Vec<Vpc>, CliError> {
        let output: DescribeVpcsOutput =
            serde_json::from_slice(raw).map_err(|e| CliError::parse("describe-vpcs", e))?;

        Ok(output
            .vpcs
            .into_iter()
            .map(|v| Vpc {
                vpc_id: v.vpc_id.unwrap_or_default(),
                name: name_tag(v.tags.as_deref().unwrap_or_default()),
                cidr_block: v.cidr_block.unwrap_or_default(),
                state: v.state.unwrap_or_default(),
                is_default: v.is_default.unwrap_or(false),
                region: region_label(region),
            })
            .collect())
    }

    fn into_service_resources(&self, result: AggregateResult<Vpc>) -> ServiceResources {
        ServiceResources {
            service: self.kind().key().to_string(),
            vpcs: result.records,
            message: result.message,
            ..Default::default()
        }
    }
}
