//! Billing data from AWS Cost Explorer.

pub mod date_range;
pub mod derivation;
pub mod service;

pub use date_range::DateRange;
pub use derivation::{normalize_service_name, CostOverview, ServiceCost};
pub use service::{CliCostService, CostError, CostReport, CostService};
