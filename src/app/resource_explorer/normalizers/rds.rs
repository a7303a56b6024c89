use super::utils::*;
use super::*;
use crate::app::resource_explorer::state::RdsInstance;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct DescribeDbInstancesOutput {
    #[serde(rename = "DBInstances", default)]
    db_instances: Vec<RawDbInstance>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDbInstance {
    #[serde(rename = "DBInstanceIdentifier", default)]
    identifier: Option<String>,
    #[serde(rename = "DBInstanceClass", default)]
    class: Option<String>,
    #[serde(rename = "Engine", default)]
    engine: Option<String>,
    #[serde(rename = "DBInstanceStatus", default)]
    status: Option<String>,
    #[serde(rename = "AvailabilityZone", default)]
    availability_zone: Option<String>,
    #[serde(rename = "Endpoint", default)]
    endpoint: Option<Endpoint>,
}

#[derive(Debug, Default, Deserialize)]
struct Endpoint {
    #[serde(rename = "Address", default)]
    address: Option<String>,
}

/// Normalizer for RDS DB instances (`rds describe-db-instances`)
pub struct RdsInstanceNormalizer;

impl ResourceNormalizer for RdsInstanceNormalizer {
    type Record = RdsInstance;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Rds
    }

    fn operation(&self) -> &'static [&'static str] {
        &["rds", "describe-db-instances"]
    }

    fn normalize(&self, raw: &[u8], region: Option<&str>) -> Result<Vec<RdsInstance>, CliError> {
        let output: DescribeDbInstancesOutput = serde_json::from_slice(raw)
            .map_err(|e| CliError::parse("describe-db-instances", e))?;

        Ok(output
            .db_instances
            .into_iter()
            .map(|db| RdsInstance {
                db_instance_identifier: db.identifier.unwrap_or_default(),
                engine: db.engine.unwrap_or_default(),
                status: db.status.unwrap_or_default(),
                db_instance_class: db.class.unwrap_or_default(),
                availability_zone: db.availability_zone.unwrap_or_default(),
                // Instances still being created have no endpoint yet
                endpoint: db.endpoint.and_then(|e| e.address).unwrap_or_default(),
                region: region_label(region),
            })
            .collect())
    }

    fn into_service_resources(&self, result: AggregateResult<RdsInstance>) -> ServiceResources {
        ServiceResources {
            service: self.kind().key().to_string(),
            rds_instances: result.records,
            message: result.message,
            ..Default::default()
        }
    }
}
