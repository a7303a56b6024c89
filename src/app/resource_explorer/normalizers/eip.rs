use super::utils::*;
use super::*;
use crate::app::resource_explorer::state::ElasticIp;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeAddressesOutput {
    #[serde(default)]
    addresses: Vec<RawAddress>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawAddress {
    #[serde(default)]
    allocation_id: Option<String>,
    #[serde(default)]
    public_ip: Option<String>,
    #[serde(default)]
    association_id: Option<String>,
    #[serde(default)]
    instance_id: Option<String>,
    #[serde(default)]
    network_interface_id: Option<String>,
    #[serde(default)]
    domain: Option<String>,
}

/// Normalizer for Elastic IP addresses (`ec2 describe-addresses`)
pub struct ElasticIpNormalizer;

impl ResourceNormalizer for ElasticIpNormalizer {
    type Record = ElasticIp;

    fn kind(&self) -> ResourceKind {
        ResourceKind::ElasticIp
    }

    fn operation(&self) -> &'static [&'static str] {
        &["ec2", "describe-addresses"]
    }

    fn normalize(&self, raw: &[u8], region: Option<&str>) -> Result<Vec<ElasticIp>, CliError> {
        let output: DescribeAddressesOutput =
            serde_json::from_slice(raw).map_err(|e| CliError::parse("describe-addresses", e))?;

        Ok(output
            .addresses
            .into_iter()
            .map(|a| ElasticIp {
                allocation_id: a.allocation_id.unwrap_or_default(),
                public_ip: a.public_ip.unwrap_or_default(),
                association_id: a.association_id.unwrap_or_default(),
                instance_id: a.instance_id.unwrap_or_default(),
                network_interface_id: a.network_interface_id.unwrap_or_default(),
                domain: a.domain.unwrap_or_default(),
                region: region_label(region),
            })
            .collect())
    }

    fn into_service_resources(&self, result: AggregateResult<ElasticIp>) -> ServiceResources {
        ServiceResources {
            service: self.kind().key().to_string(),
            elastic_ips: result.records,
            message: result.message,
            ..Default::default()
        }
    }
}
