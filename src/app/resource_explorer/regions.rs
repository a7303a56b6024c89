//! Enumeration of the regions usable by the current credentials.

use super::cli_errors::CliError;
use super::cli_executor::{cli_args, CliExecutor};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeRegionsOutput {
    #[serde(default)]
    regions: Vec<RawRegion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawRegion {
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    opt_in_status: Option<String>,
}

/// Lists regions via `ec2 describe-regions --all-regions`, dropping regions
/// the account has not opted in to.
#[derive(Clone)]
pub struct RegionEnumerator {
    executor: Arc<dyn CliExecutor>,
}

impl RegionEnumerator {
    pub fn new(executor: Arc<dyn CliExecutor>) -> Self {
        Self { executor }
    }

    pub async fn list_regions(&self, cancel: &CancellationToken) -> Result<Vec<String>, CliError> {
        let args = cli_args(&["ec2", "describe-regions", "--all-regions"]);
        let raw = self.executor.run_json(&args, cancel).await?;
        let regions = parse_regions(&raw)?;
        debug!("Enumerated {} usable regions", regions.len());
        Ok(regions)
    }
}

/// Parse `describe-regions` output into usable region names.
pub fn parse_regions(raw: &[u8]) -> Result<Vec<String>, CliError> {
    let output: DescribeRegionsOutput =
        serde_json::from_slice(raw).map_err(|e| CliError::parse("describe-regions", e))?;

    Ok(output
        .regions
        .into_iter()
        .filter(|r| {
            !r.opt_in_status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("not-opted-in"))
        })
        .filter_map(|r| r.region_name.filter(|name| !name.is_empty()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_opted_in_regions_are_excluded() {
        let raw = r#"{"Regions": [
            {"RegionName": "us-east-1", "OptInStatus": "opt-in-not-required"},
            {"RegionName": "af-south-1", "OptInStatus": "NOT-OPTED-IN"},
            {"RegionName": "ap-east-1", "OptInStatus": "opted-in"},
            {"RegionName": "", "OptInStatus": "opted-in"},
            {"OptInStatus": "opted-in"},
            {"RegionName": "eu-west-1"}
        ]}"#;

        let regions = parse_regions(raw.as_bytes()).unwrap();
        assert_eq!(regions, vec!["us-east-1", "ap-east-1", "eu-west-1"]);
    }

    #[test]
    fn test_malformed_output_is_fatal() {
        let err = parse_regions(b"<html>").unwrap_err();
        assert!(matches!(err, CliError::Parse { .. }));
    }
}
