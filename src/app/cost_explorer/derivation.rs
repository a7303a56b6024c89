//! Pure projection of Cost Explorer `get-cost-and-usage` output into the
//! dashboard's cost overview and per-service breakdown.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metric requested from Cost Explorer for every query
pub const COST_METRIC: &str = "UnblendedCost";

/// Currency used until a metric reports its own unit
pub const DEFAULT_CURRENCY: &str = "USD";

/// Magnitudes below this are floating point noise from usage minus credits
const NET_ZERO_EPSILON: f64 = 1e-7;

/// Overall cost for a period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostOverview {
    /// Usage cost before credits
    pub total: f64,
    /// Cost after credits
    pub net_total: f64,
    /// Absolute value of credits applied
    pub credits_applied: f64,
    pub currency: String,
    /// Inclusive display range, `YYYY-MM-DD`
    pub start: String,
    pub end: String,
}

/// Cost of one service for the period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCost {
    /// Service name as reported by Cost Explorer
    pub service: String,
    pub display_name: String,
    /// Resource kind key when the dashboard can drill into this service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drilldown_key: Option<String>,
    pub cost: f64,
    pub currency: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostAndUsageOutput {
    #[serde(default)]
    pub results_by_time: Vec<ResultByTime>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultByTime {
    #[serde(default)]
    pub groups: Vec<CostGroup>,
    #[serde(default)]
    pub total: HashMap<String, MetricValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostGroup {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub metrics: HashMap<String, MetricValue>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricValue {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub unit: String,
}

impl MetricValue {
    pub fn parse_amount(&self) -> Option<f64> {
        self.amount.trim().parse::<f64>().ok()
    }
}

impl CostGroup {
    /// First group key and its parsed `UnblendedCost`, or `None` when the
    /// group has no key, no metric, or an unparsable amount.
    fn key_and_cost(&self) -> Option<(&str, f64, &str)> {
        let key = self.keys.first()?;
        let metric = self.metrics.get(COST_METRIC)?;
        let amount = metric.parse_amount()?;
        Some((key.as_str(), amount, metric.unit.as_str()))
    }
}

/// Usage and credits derived from a `RECORD_TYPE` grouped query.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTypeTotals {
    pub usage_total: f64,
    pub credits_applied: f64,
    pub currency: String,
}

impl RecordTypeTotals {
    pub fn net_total(&self) -> f64 {
        net_total(self.usage_total, self.credits_applied)
    }
}

/// Sum usage and credit groups. Credits are reported negative by Cost
/// Explorer; their absolute value is accumulated. Other record types
/// (tax, refund, ...) are ignored.
pub fn derive_record_type_totals(groups: &[CostGroup]) -> RecordTypeTotals {
    let mut totals = RecordTypeTotals {
        usage_total: 0.0,
        credits_applied: 0.0,
        currency: DEFAULT_CURRENCY.to_string(),
    };

    for (record_type, amount, unit) in groups.iter().filter_map(CostGroup::key_and_cost) {
        totals.currency = unit.to_string();
        match record_type.to_lowercase().as_str() {
            "usage" => totals.usage_total += amount,
            "credit" => totals.credits_applied += amount.abs(),
            _ => {}
        }
    }

    totals
}

/// Usage minus credits, snapped to zero when within float noise
pub fn net_total(usage: f64, credits: f64) -> f64 {
    let net = usage - credits;
    if net.abs() < NET_ZERO_EPSILON {
        0.0
    } else {
        net
    }
}

/// Map a Cost Explorer service name to a display name and drilldown key.
/// First match wins.
pub fn normalize_service_name(name: &str) -> (String, Option<&'static str>) {
    let lower = name.to_lowercase();

    let mapped = if lower.contains("elastic compute cloud") || lower.starts_with("ec2") {
        Some(("EC2", "ec2"))
    } else if lower.contains("virtual private cloud") {
        Some(("VPC", "vpc"))
    } else if lower.contains("elastic ip") {
        Some(("Elastic IPs", "eip"))
    } else if lower.contains("rekognition") {
        Some(("Rekognition", "rekognition"))
    } else if lower.contains("simple storage service") || lower.contains("s3") {
        Some(("Amazon S3", "s3"))
    } else if lower.contains("relational database service") {
        Some(("RDS", "rds"))
    } else {
        None
    };

    match mapped {
        Some((display, key)) => (display.to_string(), Some(key)),
        None => (name.to_string(), None),
    }
}

/// Per-service costs from a `SERVICE` grouped query, with a zero-cost
/// Elastic IPs entry appended when none is present so the drilldown is
/// always reachable.
pub fn derive_service_costs(groups: &[CostGroup]) -> Vec<ServiceCost> {
    let mut services: Vec<ServiceCost> = groups
        .iter()
        .filter_map(CostGroup::key_and_cost)
        .map(|(name, cost, unit)| {
            let (display_name, drilldown_key) = normalize_service_name(name);
            ServiceCost {
                service: name.to_string(),
                display_name,
                drilldown_key: drilldown_key.map(str::to_string),
                cost,
                currency: unit.to_string(),
            }
        })
        .collect();

    let has_eip = services
        .iter()
        .any(|s| s.drilldown_key.as_deref() == Some("eip"));
    if !has_eip {
        services.push(ServiceCost {
            service: "Elastic IPs".to_string(),
            display_name: "Elastic IPs".to_string(),
            drilldown_key: Some("eip".to_string()),
            cost: 0.0,
            currency: DEFAULT_CURRENCY.to_string(),
        });
    }

    services
}
