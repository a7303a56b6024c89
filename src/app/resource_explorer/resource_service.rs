//! Resource drilldown: dispatch from a service name to the matching
//! normalizer, with an optional TTL cache in front.

use super::aggregator::RegionAggregator;
use super::cache::TtlCache;
use super::cli_errors::CliError;
use super::cli_executor::CliEnvironment;
use super::global_services::GlobalServiceRegistry;
use super::normalizers::*;
use super::state::{
    RegionSelector, ResourceKind, ResourceSummary, ResourcesSummaryResponse, ServiceResources,
};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Region argument used when every region should be covered
pub const ALL_REGIONS: &str = "all";

/// Fetches the resources of one service for a region selector string
/// (`""`, a region name, or `all`).
#[async_trait]
pub trait ResourceService: Send + Sync {
    async fn get_resources(
        &self,
        service: &str,
        region: &str,
        cancel: &CancellationToken,
    ) -> Result<ServiceResources, CliError>;
}

pub fn not_implemented_message(service: &str) -> String {
    format!("Resource drilldown not implemented for service \"{}\"", service)
}

/// [`ResourceService`] that runs the CLI through a [`RegionAggregator`].
pub struct CliResourceService {
    aggregator: RegionAggregator,
    globals: GlobalServiceRegistry,
}

impl CliResourceService {
    pub fn new(aggregator: RegionAggregator) -> Self {
        Self {
            aggregator,
            globals: GlobalServiceRegistry::new(),
        }
    }

    async fn query<N: ResourceNormalizer>(
        &self,
        normalizer: N,
        selector: &RegionSelector,
        cancel: &CancellationToken,
    ) -> Result<ServiceResources, CliError> {
        let normalizer = Arc::new(normalizer);
        let result = self
            .aggregator
            .aggregate(normalizer.clone(), selector, cancel)
            .await?;
        Ok(normalizer.into_service_resources(result))
    }
}

#[async_trait]
impl ResourceService for CliResourceService {
    async fn get_resources(
        &self,
        service: &str,
        region: &str,
        cancel: &CancellationToken,
    ) -> Result<ServiceResources, CliError> {
        let Some(kind) = ResourceKind::parse(service) else {
            return Ok(ServiceResources {
                service: service.to_string(),
                message: Some(not_implemented_message(service)),
                ..Default::default()
            });
        };

        let selector = if self.globals.is_global(kind) {
            RegionSelector::Default
        } else {
            RegionSelector::parse(region)
        };

        match kind {
            ResourceKind::Ec2 => self.query(Ec2InstanceNormalizer, &selector, cancel).await,
            ResourceKind::Vpc => self.query(VpcNormalizer, &selector, cancel).await,
            ResourceKind::ElasticIp => self.query(ElasticIpNormalizer, &selector, cancel).await,
            ResourceKind::S3 => self.query(S3BucketNormalizer, &selector, cancel).await,
            ResourceKind::Rds => self.query(RdsInstanceNormalizer, &selector, cancel).await,
            ResourceKind::Rekognition => {
                self.query(RekognitionCollectionNormalizer, &selector, cancel)
                    .await
            }
        }
    }
}

/// Cache key scoped to the active profile so switching credentials never
/// serves another account's resources.
pub fn resource_cache_key(profile: Option<&str>, service: &str, region: &str) -> String {
    format!(
        "{}|{}|{}",
        profile.unwrap_or("system"),
        service.trim().to_lowercase(),
        region.trim().to_lowercase()
    )
}

/// Caching decorator. Only successful responses are stored.
pub struct CachedResourceService {
    inner: Arc<dyn ResourceService>,
    cache: TtlCache<ServiceResources>,
    profiles: Option<Arc<dyn CliEnvironment>>,
}

impl CachedResourceService {
    pub fn new(inner: Arc<dyn ResourceService>, cache: TtlCache<ServiceResources>) -> Self {
        Self {
            inner,
            cache,
            profiles: None,
        }
    }

    pub fn with_profiles(mut self, profiles: Arc<dyn CliEnvironment>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn cache(&self) -> &TtlCache<ServiceResources> {
        &self.cache
    }
}

#[async_trait]
impl ResourceService for CachedResourceService {
    async fn get_resources(
        &self,
        service: &str,
        region: &str,
        cancel: &CancellationToken,
    ) -> Result<ServiceResources, CliError> {
        let profile = self.profiles.as_ref().and_then(|p| p.active_profile());
        let key = resource_cache_key(profile.as_deref(), service, region);

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let resources = self.inner.get_resources(service, region, cancel).await?;
        self.cache.set(key, resources.clone());
        Ok(resources)
    }
}

/// Count every kind across all regions concurrently.
///
/// A kind that fails is logged and left out of the summary rather than
/// failing the whole response. Summaries keep [`ResourceKind::ALL`] order.
pub async fn summarize_resources(
    service: &dyn ResourceService,
    cancel: &CancellationToken,
) -> ResourcesSummaryResponse {
    let queries = ResourceKind::ALL.iter().map(|kind| async move {
        let result = service.get_resources(kind.key(), ALL_REGIONS, cancel).await;
        (*kind, result)
    });

    let mut summaries = Vec::new();
    for (kind, result) in join_all(queries).await {
        match result {
            Ok(resources) => summaries.push(ResourceSummary {
                service: kind.key().to_string(),
                display_name: kind.display_name().to_string(),
                resource_type: kind.resource_field().to_string(),
                count: resources.count(kind),
            }),
            Err(e) => warn!("Resource summary for {} failed: {}", kind, e),
        }
    }

    info!(
        "Resource summary built for {}/{} services",
        summaries.len(),
        ResourceKind::ALL.len()
    );
    ResourcesSummaryResponse { summaries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_profile_scoped_and_lowercased() {
        assert_eq!(resource_cache_key(None, "EC2", "ALL"), "system|ec2|all");
        assert_eq!(
            resource_cache_key(Some("3"), "vpc", "us-east-1"),
            "3|vpc|us-east-1"
        );
    }

    #[test]
    fn test_cache_key_ignores_surrounding_whitespace() {
        assert_eq!(
            resource_cache_key(None, " ec2", " us-east-1 "),
            resource_cache_key(None, "ec2", "us-east-1")
        );
    }

    #[test]
    fn test_not_implemented_message() {
        assert_eq!(
            not_implemented_message("lambda"),
            "Resource drilldown not implemented for service \"lambda\""
        );
    }
}
