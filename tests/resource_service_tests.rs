//! Resource drilldown dispatch, response caching and the summary endpoint's
//! aggregation.

mod common;

use async_trait::async_trait;
use awsdash_web::app::resource_explorer::resource_service::ALL_REGIONS;
use awsdash_web::app::resource_explorer::state::Vpc;
use awsdash_web::app::resource_explorer::{
    summarize_resources, CachedResourceService, CliEnvironment, CliError, CliResourceService,
    RegionAggregator, ResourceKind, ResourceService, ServiceResources, TtlCache,
};
use common::*;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Counts calls and answers with one VPC per request; `rds` always fails.
#[derive(Default)]
struct CountingService {
    calls: AtomicUsize,
}

#[async_trait]
impl ResourceService for CountingService {
    async fn get_resources(
        &self,
        service: &str,
        region: &str,
        _cancel: &CancellationToken,
    ) -> Result<ServiceResources, CliError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if service == "rds" {
            return Err(CliError::from_cli_output("An error occurred (InternalError)"));
        }
        Ok(ServiceResources {
            service: service.to_string(),
            vpcs: vec![Vpc {
                vpc_id: "vpc-1".to_string(),
                name: String::new(),
                cidr_block: "10.0.0.0/16".to_string(),
                state: "available".to_string(),
                is_default: false,
                region: region.to_string(),
            }],
            ..Default::default()
        })
    }
}

struct SwitchableProfile(Mutex<Option<String>>);

impl CliEnvironment for SwitchableProfile {
    fn active_env(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn active_profile(&self) -> Option<String> {
        self.0.lock().unwrap().clone()
    }
}

fn cached(inner: &Arc<CountingService>) -> CachedResourceService {
    CachedResourceService::new(inner.clone(), TtlCache::new(Duration::from_secs(60)))
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn test_cache_hit_skips_the_inner_service() {
    let inner = Arc::new(CountingService::default());
    let service = cached(&inner);
    let cancel = CancellationToken::new();

    let first = service.get_resources("vpc", "all", &cancel).await.unwrap();
    let second = service.get_resources("VPC", "ALL", &cancel).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.cache().len(), 1);
}

#[tokio::test]
async fn test_different_regions_are_cached_separately() {
    let inner = Arc::new(CountingService::default());
    let service = cached(&inner);
    let cancel = CancellationToken::new();

    service.get_resources("vpc", "us-east-1", &cancel).await.unwrap();
    service.get_resources("vpc", "eu-west-1", &cancel).await.unwrap();

    assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_padded_region_shares_the_cache_entry() {
    let inner = Arc::new(CountingService::default());
    let service = cached(&inner);
    let cancel = CancellationToken::new();

    service.get_resources("vpc", "us-east-1", &cancel).await.unwrap();
    service.get_resources("vpc", " us-east-1 ", &cancel).await.unwrap();

    assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.cache().len(), 1);
}

#[tokio::test]
async fn test_errors_are_not_cached() {
    let inner = Arc::new(CountingService::default());
    let service = cached(&inner);
    let cancel = CancellationToken::new();

    assert!(service.get_resources("rds", "all", &cancel).await.is_err());
    assert!(service.get_resources("rds", "all", &cancel).await.is_err());

    assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    assert!(service.cache().is_empty());
}

#[tokio::test]
async fn test_cache_is_scoped_to_the_active_profile() {
    let inner = Arc::new(CountingService::default());
    let profile = Arc::new(SwitchableProfile(Mutex::new(Some("system".to_string()))));
    let service = cached(&inner).with_profiles(profile.clone());
    let cancel = CancellationToken::new();

    service.get_resources("vpc", "all", &cancel).await.unwrap();
    *profile.0.lock().unwrap() = Some("1".to_string());
    service.get_resources("vpc", "all", &cancel).await.unwrap();
    service.get_resources("vpc", "all", &cancel).await.unwrap();

    assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cleared_cache_refetches() {
    let inner = Arc::new(CountingService::default());
    let service = cached(&inner);
    let cancel = CancellationToken::new();

    service.get_resources("vpc", "all", &cancel).await.unwrap();
    service.cache().clear();
    service.get_resources("vpc", "all", &cancel).await.unwrap();

    assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Dispatch through the CLI
// ============================================================================

#[tokio::test]
async fn test_unknown_service_returns_message_without_cli_calls() {
    let executor = Arc::new(StubExecutor::new());
    let service = CliResourceService::new(RegionAggregator::new(executor.clone()));

    let resources = service
        .get_resources("lambda", "all", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resources.service, "lambda");
    assert_eq!(
        resources.message.as_deref(),
        Some("Resource drilldown not implemented for service \"lambda\"")
    );
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn test_s3_is_listed_once_without_a_region() {
    let executor = Arc::new(
        StubExecutor::new().with_regions(&["us-east-1", "eu-west-1"]).on_arg(
            "list-buckets",
            StubResponse::json(
                r#"{"Buckets": [
                    {"Name": "logs", "CreationDate": "2024-01-01T00:00:00+00:00"},
                    {"Name": "assets", "CreationDate": "2024-02-01T00:00:00+00:00"}
                ]}"#,
            ),
        ),
    );
    let service = CliResourceService::new(RegionAggregator::new(executor.clone()));

    let resources = service
        .get_resources("s3", ALL_REGIONS, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resources.s3_buckets.len(), 2);
    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(region_of(&calls[0]), None);
}

#[tokio::test]
async fn test_ec2_across_all_regions() {
    let executor = Arc::new(
        StubExecutor::new()
            .with_regions(&["us-east-1", "me-south-1"])
            .on_region("us-east-1", StubResponse::json(ec2_instances_json("us-east-1", 2)))
            .on_region("me-south-1", StubResponse::error(AUTH_FAILURE)),
    );
    let service = CliResourceService::new(RegionAggregator::new(executor));

    let resources = service
        .get_resources("EC2", "all", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resources.service, "ec2");
    assert_eq!(resources.ec2_instances.len(), 2);
    assert_eq!(
        resources.message.as_deref(),
        Some("Skipped regions due to authentication errors: me-south-1")
    );

    let json = serde_json::to_value(&resources).unwrap();
    assert_eq!(json["ec2Instances"][0]["instanceType"], "t3.micro");
    assert!(json.get("vpcs").is_none());
}

// ============================================================================
// Summary
// ============================================================================

#[tokio::test]
async fn test_summary_omits_failed_kinds_and_keeps_order() {
    let inner = CountingService::default();

    let summary = summarize_resources(&inner, &CancellationToken::new()).await;

    let services: Vec<&str> = summary.summaries.iter().map(|s| s.service.as_str()).collect();
    let expected: Vec<&str> = ResourceKind::ALL
        .iter()
        .filter(|k| **k != ResourceKind::Rds)
        .map(|k| k.key())
        .collect();
    assert_eq!(services, expected);
    assert_eq!(inner.calls.load(Ordering::SeqCst), ResourceKind::ALL.len());

    // CountingService only ever fills `vpcs`
    let vpc = summary.summaries.iter().find(|s| s.service == "vpc").unwrap();
    assert_eq!(vpc.count, 1);
    assert_eq!(vpc.display_name, "VPC");
    assert_eq!(vpc.resource_type, "vpcs");
    let ec2 = summary.summaries.iter().find(|s| s.service == "ec2").unwrap();
    assert_eq!(ec2.count, 0);
}
