//! Cost Explorer reports against a stubbed AWS CLI.

mod common;

use awsdash_web::app::cost_explorer::{CliCostService, CostError, CostService};
use awsdash_web::app::resource_explorer::{CliError, TtlCache};
use common::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SERVICE_GROUPS: &str = r#"{
    "ResultsByTime": [{
        "Total": {"UnblendedCost": {"Amount": "120.0", "Unit": "USD"}},
        "Groups": [
            {"Keys": ["Amazon Elastic Compute Cloud - Compute"],
             "Metrics": {"UnblendedCost": {"Amount": "100.0", "Unit": "USD"}}},
            {"Keys": ["Amazon Simple Storage Service"],
             "Metrics": {"UnblendedCost": {"Amount": "20.0", "Unit": "USD"}}},
            {"Keys": ["AWS Glue"],
             "Metrics": {"UnblendedCost": {"Amount": "not-a-number", "Unit": "USD"}}}
        ]
    }]
}"#;

const RECORD_TYPE_GROUPS: &str = r#"{
    "ResultsByTime": [{
        "Groups": [
            {"Keys": ["Usage"], "Metrics": {"UnblendedCost": {"Amount": "120", "Unit": "USD"}}},
            {"Keys": ["Credit"], "Metrics": {"UnblendedCost": {"Amount": "-15", "Unit": "USD"}}}
        ]
    }]
}"#;

fn service(executor: &Arc<StubExecutor>) -> CliCostService {
    CliCostService::new(executor.clone(), TtlCache::new(Duration::from_secs(60)))
}

fn january() -> (Option<&'static str>, Option<&'static str>) {
    (Some("2024-01-01"), Some("2024-01-31"))
}

#[tokio::test]
async fn test_overview_nets_credits_against_usage() {
    let executor = Arc::new(
        StubExecutor::new()
            .on_arg("Key=SERVICE", StubResponse::json(SERVICE_GROUPS))
            .on_arg("Key=RECORD_TYPE", StubResponse::json(RECORD_TYPE_GROUPS)),
    );
    let (start, end) = january();

    let overview = service(&executor)
        .get_cost_overview(start, end, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(overview.total, 120.0);
    assert_eq!(overview.credits_applied, 15.0);
    assert_eq!(overview.net_total, 105.0);
    assert_eq!(overview.currency, "USD");
    assert_eq!(overview.start, "2024-01-01");
    assert_eq!(overview.end, "2024-01-31");
}

#[tokio::test]
async fn test_time_period_end_is_exclusive() {
    let executor = Arc::new(
        StubExecutor::new()
            .on_arg("Key=SERVICE", StubResponse::json(SERVICE_GROUPS))
            .on_arg("Key=RECORD_TYPE", StubResponse::json(RECORD_TYPE_GROUPS)),
    );
    let (start, end) = january();

    service(&executor)
        .get_cost_report(start, end, &CancellationToken::new())
        .await
        .unwrap();

    let calls = executor.calls();
    assert_eq!(calls.len(), 2);
    for args in &calls {
        assert_eq!(&args[..2], &["ce".to_string(), "get-cost-and-usage".to_string()]);
        assert!(args.contains(&"Start=2024-01-01,End=2024-02-01".to_string()));
        assert!(args.contains(&"UnblendedCost".to_string()));
    }
}

#[tokio::test]
async fn test_service_costs_are_mapped_for_drilldown() {
    let executor = Arc::new(
        StubExecutor::new()
            .on_arg("Key=SERVICE", StubResponse::json(SERVICE_GROUPS))
            .on_arg("Key=RECORD_TYPE", StubResponse::json(RECORD_TYPE_GROUPS)),
    );
    let (start, end) = january();

    let services = service(&executor)
        .get_service_costs(start, end, &CancellationToken::new())
        .await
        .unwrap();

    // Glue is dropped for its bad amount; Elastic IPs is always offered
    let names: Vec<&str> = services.iter().map(|s| s.display_name.as_str()).collect();
    assert_eq!(names, vec!["EC2", "Amazon S3", "Elastic IPs"]);
    assert_eq!(services[0].drilldown_key.as_deref(), Some("ec2"));
    assert_eq!(services[0].cost, 100.0);
    assert_eq!(services[2].cost, 0.0);
}

#[tokio::test]
async fn test_disabled_cost_explorer_is_reported() {
    let executor = Arc::new(StubExecutor::new().otherwise(StubResponse::error(
        "An error occurred (AccessDeniedException): User not enabled for cost explorer access",
    )));

    let err = service(&executor)
        .get_cost_overview(None, None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CostError::ExplorerDisabled));
}

#[tokio::test]
async fn test_record_type_failure_falls_back_to_service_total() {
    let executor = Arc::new(
        StubExecutor::new()
            .on_arg("Key=SERVICE", StubResponse::json(SERVICE_GROUPS))
            .on_arg("Key=RECORD_TYPE", StubResponse::error("An error occurred (ThrottlingException)")),
    );
    let (start, end) = january();

    let overview = service(&executor)
        .get_cost_overview(start, end, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(overview.total, 120.0);
    assert_eq!(overview.credits_applied, 0.0);
    assert_eq!(overview.net_total, 120.0);
}

#[tokio::test]
async fn test_service_query_failure_is_returned() {
    let executor = Arc::new(
        StubExecutor::new()
            .on_arg("Key=SERVICE", StubResponse::error("An error occurred (InternalError)"))
            .on_arg("Key=RECORD_TYPE", StubResponse::json(RECORD_TYPE_GROUPS)),
    );

    let err = service(&executor)
        .get_cost_report(None, None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CostError::Cli(CliError::Command { .. })));
}

#[tokio::test]
async fn test_empty_results_are_no_data() {
    let executor = Arc::new(StubExecutor::new().otherwise(StubResponse::json(r#"{"ResultsByTime": []}"#)));

    let err = service(&executor)
        .get_cost_report(None, None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CostError::NoData));
}

#[tokio::test]
async fn test_overview_and_services_share_one_cached_report() {
    let executor = Arc::new(
        StubExecutor::new()
            .on_arg("Key=SERVICE", StubResponse::json(SERVICE_GROUPS))
            .on_arg("Key=RECORD_TYPE", StubResponse::json(RECORD_TYPE_GROUPS)),
    );
    let costs = service(&executor);
    let cancel = CancellationToken::new();
    let (start, end) = january();

    costs.get_cost_overview(start, end, &cancel).await.unwrap();
    costs.get_service_costs(start, end, &cancel).await.unwrap();
    assert_eq!(executor.call_count(), 2);

    costs.cache().clear();
    costs.get_cost_overview(start, end, &cancel).await.unwrap();
    assert_eq!(executor.call_count(), 4);
}

#[tokio::test]
async fn test_invalid_dates_fall_back_to_month_to_date() {
    let executor = Arc::new(
        StubExecutor::new()
            .on_arg("Key=SERVICE", StubResponse::json(SERVICE_GROUPS))
            .on_arg("Key=RECORD_TYPE", StubResponse::json(RECORD_TYPE_GROUPS)),
    );

    let overview = service(&executor)
        .get_cost_overview(Some("2024-03-10"), Some("2024-03-01"), &CancellationToken::new())
        .await
        .unwrap();

    assert!(overview.start.ends_with("-01"));
    assert!(overview.start <= overview.end);
    assert_ne!(overview.start, "2024-03-10");
}
