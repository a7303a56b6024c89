//! Resource drilldown over the AWS CLI.
//!
//! Layering, leaf to root: [`cli_executor`] runs the CLI and [`cli_errors`]
//! classifies its failures, [`normalizers`] project raw output into records,
//! [`aggregator`] fans a kind out across regions, and [`resource_service`]
//! maps service names to kinds with a [`cache::TtlCache`] in front.

pub mod aggregator;
pub mod cache;
pub mod cli_errors;
pub mod cli_executor;
pub mod global_services;
pub mod normalizers;
pub mod regions;
pub mod resource_service;
pub mod state;

pub use aggregator::{AggregateResult, RegionAggregator, DEFAULT_MAX_CONCURRENT_REGIONS};
pub use cache::TtlCache;
pub use cli_errors::CliError;
pub use cli_executor::{cli_args, AwsCliExecutor, CliEnvironment, CliExecutor};
pub use global_services::GlobalServiceRegistry;
pub use normalizers::ResourceNormalizer;
pub use regions::RegionEnumerator;
pub use resource_service::{
    summarize_resources, CachedResourceService, CliResourceService, ResourceService,
};
pub use state::{RegionSelector, ResourceKind, ServiceResources};
