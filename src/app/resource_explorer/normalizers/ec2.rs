use super::utils::*;
use super::*;
use crate::app::resource_explorer::state::Ec2Instance;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstancesOutput {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<RawInstance>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawInstance {
    #[serde(default)]
    instance_id: Option<String>,
    #[serde(default)]
    instance_type: Option<String>,
    #[serde(default)]
    private_ip_address: Option<String>,
    #[serde(default)]
    public_ip_address: Option<String>,
    #[serde(default)]
    state: Option<InstanceState>,
    #[serde(default)]
    placement: Option<Placement>,
    #[serde(default)]
    tags: Option<Vec<Tag>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceState {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Placement {
    #[serde(default)]
    availability_zone: Option<String>,
}

/// Normalizer for EC2 instances (`ec2 describe-instances`)
pub struct Ec2InstanceNormalizer;

impl ResourceNormalizer for Ec2InstanceNormalizer {
    type Record = Ec2Instance;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Ec2
    }

    fn operation(&self) -> &'static [&'static str] {
        &["ec2", "describe-instances"]
    }

    fn normalize(&self, raw: &[u8], region: Option<&str>) -> Result<Vec<Ec2Instance>, CliError> {
        let output: DescribeInstancesOutput =
            serde_json::from_slice(raw).map_err(|e| CliError::parse("describe-instances", e))?;

        let instances = output
            .reservations
            .into_iter()
            .flat_map(|r| r.instances)
            .map(|inst| {
                let availability_zone = inst
                    .placement
                    .and_then(|p| p.availability_zone)
                    .unwrap_or_default();

                // Without an explicit region, derive it from the placement.
                let region = match region {
                    Some(r) if !r.is_empty() => r.to_string(),
                    _ => region_from_az(&availability_zone),
                };

                Ec2Instance {
                    instance_id: inst.instance_id.unwrap_or_default(),
                    name: name_tag(inst.tags.as_deref().unwrap_or_default()),
                    state: inst.state.and_then(|s| s.name).unwrap_or_default(),
                    instance_type: inst.instance_type.unwrap_or_default(),
                    availability_zone,
                    private_ip: inst.private_ip_address.unwrap_or_default(),
                    public_ip: inst.public_ip_address.unwrap_or_default(),
                    region,
                }
            })
            .collect();

        Ok(instances)
    }

    fn into_service_resources(&self, result: AggregateResult<Ec2Instance>) -> ServiceResources {
        ServiceResources {
            service: self.kind().key().to_string(),
            ec2_instances: result.records,
            message: result.message,
            ..Default::default()
        }
    }
}
