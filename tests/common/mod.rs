//! Shared test doubles for the integration suites.
//!
//! [`StubExecutor`] stands in for the `aws` binary: each call is matched
//! against a list of rules, the first match decides the response, and every
//! call is recorded so tests can assert on arguments and concurrency.

#![allow(dead_code)]

use async_trait::async_trait;
use awsdash_web::app::resource_explorer::{CliError, CliExecutor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type Matcher = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

/// What a stubbed CLI call returns
#[derive(Debug, Clone)]
pub struct StubResponse {
    body: Result<String, String>,
    delay: Duration,
}

impl StubResponse {
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            body: Ok(body.into()),
            delay: Duration::ZERO,
        }
    }

    /// A failed call; the message is classified like real CLI stderr
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            body: Err(message.into()),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
pub struct StubExecutor {
    rules: Vec<(Matcher, StubResponse)>,
    calls: Mutex<Vec<Vec<String>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Value following `--region`, if present
pub fn region_of(args: &[String]) -> Option<&str> {
    args.iter()
        .position(|a| a == "--region")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn is_describe_regions(args: &[String]) -> bool {
    args.len() >= 2 && args[0] == "ec2" && args[1] == "describe-regions"
}

impl StubExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        mut self,
        matcher: impl Fn(&[String]) -> bool + Send + Sync + 'static,
        response: StubResponse,
    ) -> Self {
        self.rules.push((Box::new(matcher), response));
        self
    }

    /// Answer `ec2 describe-regions` with the given opted-in regions
    pub fn with_regions(self, regions: &[&str]) -> Self {
        let body = regions_json(regions);
        self.on(is_describe_regions, StubResponse::json(body))
    }

    pub fn with_failing_regions(self, message: &str) -> Self {
        self.on(is_describe_regions, StubResponse::error(message))
    }

    /// Answer calls made with `--region <region>`
    pub fn on_region(self, region: &str, response: StubResponse) -> Self {
        let region = region.to_string();
        self.on(
            move |args| region_of(args) == Some(region.as_str()),
            response,
        )
    }

    /// Answer calls whose arguments contain `fragment`
    pub fn on_arg(self, fragment: &str, response: StubResponse) -> Self {
        let fragment = fragment.to_string();
        self.on(move |args| args.iter().any(|a| a.contains(&fragment)), response)
    }

    /// Answer every call not matched by an earlier rule
    pub fn otherwise(self, response: StubResponse) -> Self {
        self.on(|_| true, response)
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Calls other than region enumeration
    pub fn work_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|args| !is_describe_regions(args))
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CliExecutor for StubExecutor {
    async fn run_json(
        &self,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, CliError> {
        self.calls.lock().unwrap().push(args.to_vec());

        let response = self
            .rules
            .iter()
            .find(|(matcher, _)| matcher(args))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| StubResponse::error(format!("no stub for aws {}", args.join(" "))));

        let _in_flight = if is_describe_regions(args) {
            None
        } else {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            Some(InFlight(&self.in_flight))
        };

        if !response.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(CliError::Cancelled),
                _ = tokio::time::sleep(response.delay) => {}
            }
        }

        match response.body {
            Ok(body) => Ok(body.into_bytes()),
            Err(message) => Err(CliError::from_cli_output(message)),
        }
    }
}

pub fn regions_json(regions: &[&str]) -> String {
    let entries: Vec<serde_json::Value> = regions
        .iter()
        .map(|r| serde_json::json!({"RegionName": r, "OptInStatus": "opt-in-not-required"}))
        .collect();
    serde_json::json!({ "Regions": entries }).to_string()
}

/// `ec2 describe-instances` output with `count` running instances in `region`
pub fn ec2_instances_json(region: &str, count: usize) -> String {
    let instances: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "InstanceId": format!("i-{}-{}", region, i),
                "InstanceType": "t3.micro",
                "State": {"Name": "running"},
                "Placement": {"AvailabilityZone": format!("{}a", region)},
                "PrivateIpAddress": format!("10.0.0.{}", i + 1),
                "Tags": [{"Key": "Name", "Value": format!("web-{}", i)}]
            })
        })
        .collect();
    serde_json::json!({ "Reservations": [{ "Instances": instances }] }).to_string()
}

pub const AUTH_FAILURE: &str =
    "An error occurred (AuthFailure) when calling the DescribeInstances operation: \
     AWS was not able to validate the provided access credentials";

pub const INTERNAL_ERROR: &str =
    "An error occurred (InternalError) when calling the DescribeInstances operation: \
     An internal server error occurred";

/// `ec2 describe-vpcs` output with `count` VPCs
pub fn vpcs_json(region: &str, count: usize) -> String {
    let vpcs: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "VpcId": format!("vpc-{}-{}", region, i),
                "CidrBlock": format!("10.{}.0.0/16", i),
                "State": "available",
                "IsDefault": i == 0
            })
        })
        .collect();
    serde_json::json!({ "Vpcs": vpcs }).to_string()
}
