//! Cost Explorer queries through the AWS CLI.
//!
//! One report (overview plus per-service costs) is fetched per profile and
//! period and cached, so `/api/cost` and `/api/services` for the same period
//! cost at most two CLI calls between them.

use super::date_range::DateRange;
use super::derivation::{
    derive_record_type_totals, derive_service_costs, net_total, CostAndUsageOutput, CostOverview,
    RecordTypeTotals, ServiceCost, COST_METRIC, DEFAULT_CURRENCY,
};
use crate::app::resource_explorer::cache::TtlCache;
use crate::app::resource_explorer::cli_errors::CliError;
use crate::app::resource_explorer::cli_executor::{CliEnvironment, CliExecutor};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CostError {
    #[error("aws cost explorer is not enabled for this account")]
    ExplorerDisabled,

    #[error("no cost data returned from cost explorer")]
    NoData,

    #[error(transparent)]
    Cli(#[from] CliError),
}

impl CostError {
    /// Cost Explorer reports a disabled account only through its message text.
    fn from_cli(error: CliError) -> Self {
        let lower = error.to_string().to_lowercase();
        if lower.contains("cost explorer") && lower.contains("enable") {
            CostError::ExplorerDisabled
        } else {
            CostError::Cli(error)
        }
    }
}

/// Overview and service breakdown for one period
#[derive(Debug, Clone, PartialEq)]
pub struct CostReport {
    pub overview: CostOverview,
    pub services: Vec<ServiceCost>,
}

#[async_trait]
pub trait CostService: Send + Sync {
    /// Report for the inclusive `start..=end` period; missing or invalid
    /// dates mean the current month to date.
    async fn get_cost_report(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<CostReport, CostError>;

    async fn get_cost_overview(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<CostOverview, CostError> {
        Ok(self.get_cost_report(start, end, cancel).await?.overview)
    }

    async fn get_service_costs(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ServiceCost>, CostError> {
        Ok(self.get_cost_report(start, end, cancel).await?.services)
    }
}

pub fn cost_cache_key(profile: Option<&str>, range: &DateRange) -> String {
    format!(
        "cost-and-services:{}:{}:{}",
        profile.unwrap_or("system"),
        range.ce_start,
        range.ce_end
    )
}

/// `ce get-cost-and-usage` arguments grouped by one dimension
fn cost_and_usage_args(range: &DateRange, group_by: &str) -> Vec<String> {
    vec![
        "ce".to_string(),
        "get-cost-and-usage".to_string(),
        "--time-period".to_string(),
        format!("Start={},End={}", range.ce_start, range.ce_end),
        "--granularity".to_string(),
        "MONTHLY".to_string(),
        "--metrics".to_string(),
        COST_METRIC.to_string(),
        "--group-by".to_string(),
        format!("Type=DIMENSION,Key={}", group_by),
    ]
}

/// [`CostService`] backed by the AWS CLI with a TTL cache.
pub struct CliCostService {
    executor: Arc<dyn CliExecutor>,
    cache: TtlCache<CostReport>,
    profiles: Option<Arc<dyn CliEnvironment>>,
}

impl CliCostService {
    pub fn new(executor: Arc<dyn CliExecutor>, cache: TtlCache<CostReport>) -> Self {
        Self {
            executor,
            cache,
            profiles: None,
        }
    }

    pub fn with_profiles(mut self, profiles: Arc<dyn CliEnvironment>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn cache(&self) -> &TtlCache<CostReport> {
        &self.cache
    }

    async fn query(
        &self,
        range: &DateRange,
        group_by: &str,
        cancel: &CancellationToken,
    ) -> Result<CostAndUsageOutput, CostError> {
        let raw = self
            .executor
            .run_json(&cost_and_usage_args(range, group_by), cancel)
            .await
            .map_err(CostError::from_cli)?;
        serde_json::from_slice(&raw)
            .map_err(|e| CostError::Cli(CliError::parse("get-cost-and-usage", e)))
    }

    async fn fetch_record_type_totals(
        &self,
        range: &DateRange,
        cancel: &CancellationToken,
    ) -> Result<RecordTypeTotals, CostError> {
        let output = self.query(range, "RECORD_TYPE", cancel).await?;
        let first = output
            .results_by_time
            .into_iter()
            .next()
            .ok_or(CostError::NoData)?;
        Ok(derive_record_type_totals(&first.groups))
    }

    async fn fetch(
        &self,
        range: &DateRange,
        cancel: &CancellationToken,
    ) -> Result<CostReport, CostError> {
        let output = self.query(range, "SERVICE", cancel).await?;
        let first = output
            .results_by_time
            .into_iter()
            .next()
            .ok_or(CostError::NoData)?;

        let services = derive_service_costs(&first.groups);

        let totals = match self.fetch_record_type_totals(range, cancel).await {
            Ok(totals) => totals,
            Err(CostError::Cli(CliError::Cancelled)) => {
                return Err(CostError::Cli(CliError::Cancelled));
            }
            Err(e) => {
                warn!("RECORD_TYPE breakdown failed, using service total: {}", e);
                let fallback = first.total.get(COST_METRIC);
                RecordTypeTotals {
                    usage_total: fallback.and_then(|m| m.parse_amount()).unwrap_or(0.0),
                    credits_applied: 0.0,
                    currency: fallback
                        .filter(|m| m.parse_amount().is_some())
                        .map(|m| m.unit.clone())
                        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                }
            }
        };

        let overview = CostOverview {
            total: totals.usage_total,
            net_total: net_total(totals.usage_total, totals.credits_applied),
            credits_applied: totals.credits_applied,
            currency: totals.currency,
            start: range.display_start.clone(),
            end: range.display_end.clone(),
        };

        Ok(CostReport { overview, services })
    }
}

#[async_trait]
impl CostService for CliCostService {
    async fn get_cost_report(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<CostReport, CostError> {
        let range = DateRange::from_query(start, end);
        let profile = self.profiles.as_ref().and_then(|p| p.active_profile());
        let key = cost_cache_key(profile.as_deref(), &range);

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        debug!(
            "Fetching cost report {}..{} (exclusive end)",
            range.ce_start, range.ce_end
        );
        let report = self.fetch(&range, cancel).await?;
        info!(
            "Cost report {}..={}: {:.2} {} across {} services",
            range.display_start,
            range.display_end,
            report.overview.net_total,
            report.overview.currency,
            report.services.len()
        );

        self.cache.set(key, report.clone());
        Ok(report)
    }
}
