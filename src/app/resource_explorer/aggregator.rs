//! Bounded parallel aggregation of one resource kind across regions.
//!
//! A request for region `all` enumerates the usable regions, then runs one CLI
//! call per region with at most `max_concurrent` calls in flight. The
//! coordinator owns the merge: workers only hand back their own region's
//! outcome through the join set.
//!
//! Merge rules:
//! - records are appended in completion order (no ordering guarantee)
//! - a region failing with a skippable error ([`CliError::is_skippable`]) is
//!   recorded and reported in the result message
//! - any other failure cancels the remaining workers and is returned as-is,
//!   discarding whatever already succeeded
//!
//! ```text
//! list_regions ──► spawn N workers ──► Semaphore(max_concurrent)
//!                                          │ aws <op> --region r
//!                      coordinator ◄───────┘ JoinSet::join_next
//! ```

use super::cli_errors::CliError;
use super::cli_executor::CliExecutor;
use super::normalizers::ResourceNormalizer;
use super::regions::RegionEnumerator;
use super::state::RegionSelector;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Default cap on simultaneous per-region CLI calls
pub const DEFAULT_MAX_CONCURRENT_REGIONS: usize = 5;

/// Prefix of the advisory message listing skipped regions
pub const SKIPPED_REGIONS_PREFIX: &str = "Skipped regions due to authentication errors: ";

/// Merged records for one kind, with an advisory message when regions were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult<T> {
    pub records: Vec<T>,
    pub message: Option<String>,
}

impl<T> AggregateResult<T> {
    pub fn from_records(records: Vec<T>) -> Self {
        Self {
            records,
            message: None,
        }
    }
}

/// Advisory message for skipped regions, `None` when nothing was skipped.
pub fn skipped_regions_message(skipped: &[String]) -> Option<String> {
    if skipped.is_empty() {
        None
    } else {
        Some(format!("{}{}", SKIPPED_REGIONS_PREFIX, skipped.join(", ")))
    }
}

/// Outcome of a single region worker
struct RegionOutcome<T> {
    region: String,
    records: Result<Vec<T>, CliError>,
}

/// Drives CLI calls for a resource kind over one or all regions.
#[derive(Clone)]
pub struct RegionAggregator {
    executor: Arc<dyn CliExecutor>,
    regions: RegionEnumerator,
    max_concurrent: usize,
}

impl RegionAggregator {
    pub fn new(executor: Arc<dyn CliExecutor>) -> Self {
        Self {
            regions: RegionEnumerator::new(executor.clone()),
            executor,
            max_concurrent: DEFAULT_MAX_CONCURRENT_REGIONS,
        }
    }

    /// Override the in-flight cap. Zero is treated as one.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Query `normalizer`'s kind for the regions named by `selector`.
    ///
    /// A single region (or the CLI default) is one call whose failure is
    /// returned unchanged; `All` fans out as described in the module docs.
    pub async fn aggregate<N: ResourceNormalizer>(
        &self,
        normalizer: Arc<N>,
        selector: &RegionSelector,
        cancel: &CancellationToken,
    ) -> Result<AggregateResult<N::Record>, CliError> {
        match selector {
            RegionSelector::All => self.query_all_regions(normalizer, cancel).await,
            single => self
                .query_single_region(normalizer.as_ref(), single.region(), cancel)
                .await
                .map(AggregateResult::from_records),
        }
    }

    pub async fn query_single_region<N: ResourceNormalizer>(
        &self,
        normalizer: &N,
        region: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<N::Record>, CliError> {
        fetch_region(self.executor.as_ref(), normalizer, region, cancel).await
    }

    async fn query_all_regions<N: ResourceNormalizer>(
        &self,
        normalizer: Arc<N>,
        cancel: &CancellationToken,
    ) -> Result<AggregateResult<N::Record>, CliError> {
        let kind = normalizer.kind();

        // Enumeration failure aborts before any per-region work starts
        let regions = self.regions.list_regions(cancel).await?;
        let region_count = regions.len();
        let start = Instant::now();

        // Workers get a child token so a fatal error here stops the rest
        // without cancelling the caller's token. The guard covers every
        // early return.
        let workers_cancel = cancel.child_token();
        let _workers_guard = workers_cancel.clone().drop_guard();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut workers = JoinSet::new();

        for region in regions {
            let executor = self.executor.clone();
            let normalizer = normalizer.clone();
            let semaphore = semaphore.clone();
            let worker_cancel = workers_cancel.clone();

            workers.spawn(async move {
                // The semaphore is never closed, so acquisition cannot fail
                let Some(_permit) = semaphore.acquire_owned().await.ok() else {
                    return RegionOutcome {
                        region,
                        records: Err(CliError::Cancelled),
                    };
                };

                trace_debug!("Querying {} in {}", normalizer.kind(), region);
                let records =
                    fetch_region(executor.as_ref(), normalizer.as_ref(), Some(&region), &worker_cancel)
                        .await;
                RegionOutcome { region, records }
            });
        }

        let mut merged = Vec::new();
        let mut skipped = Vec::new();

        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    workers.abort_all();
                    info!("Aggregation of {} across regions cancelled", kind);
                    return Err(CliError::Cancelled);
                }
                joined = workers.join_next() => joined,
            };

            let Some(joined) = joined else {
                break;
            };

            let outcome = joined.map_err(|e| CliError::Worker(e.to_string()))?;

            match outcome.records {
                Ok(mut records) => merged.append(&mut records),
                Err(e) if e.is_skippable() => {
                    log_warn!("Skipping region {} for {}: {}", outcome.region, kind, e);
                    skipped.push(outcome.region);
                }
                Err(e) => {
                    error!(
                        "Aggregation of {} failed in region {} ({}): {}",
                        kind,
                        outcome.region,
                        e.short_label(),
                        e
                    );
                    workers.abort_all();
                    return Err(e);
                }
            }
        }

        info!(
            "Aggregated {} {} records from {} regions ({} skipped) in {:?}",
            merged.len(),
            kind,
            region_count,
            skipped.len(),
            start.elapsed()
        );

        Ok(AggregateResult {
            records: merged,
            message: skipped_regions_message(&skipped),
        })
    }
}

/// One CLI call for one region, projected into records.
async fn fetch_region<N: ResourceNormalizer>(
    executor: &dyn CliExecutor,
    normalizer: &N,
    region: Option<&str>,
    cancel: &CancellationToken,
) -> Result<Vec<N::Record>, CliError> {
    let region = region.filter(|r| !r.is_empty());

    let mut args: Vec<String> = normalizer
        .operation()
        .iter()
        .map(|s| s.to_string())
        .collect();
    if let Some(region) = region {
        args.push("--region".to_string());
        args.push(region.to_string());
    }

    let raw = executor.run_json(&args, cancel).await?;
    normalizer.normalize(&raw, region)
}
