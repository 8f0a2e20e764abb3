//! Metric categories and the per-metric info shown beside the chart.

use exam_timeline_core::HealthMetric;
use serde::Serialize;

use crate::chart::metric_color;
use crate::names::{metric_display_name, normalize_metric_name};
use crate::reference::resolve_reference;

/// Category of metrics the lab did not classify.
pub const UNCATEGORIZED: &str = "Sem categoria";

fn category_of(metric: &HealthMetric) -> &str {
    metric
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .unwrap_or(UNCATEGORIZED)
}

/// Distinct categories in first-seen order.
pub fn metric_categories(metrics: &[HealthMetric]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for metric in metrics {
        let category = category_of(metric);
        if !categories.iter().any(|seen| seen == category) {
            categories.push(category.to_string());
        }
    }
    categories
}

/// Keep the canonical names having at least one measurement in `category`.
/// `None` keeps every name.
pub fn filter_by_category(
    names: &[String],
    metrics: &[HealthMetric],
    category: Option<&str>,
) -> Vec<String> {
    let Some(category) = category else {
        return names.to_vec();
    };

    names
        .iter()
        .filter(|name| {
            metrics.iter().any(|metric| {
                category_of(metric) == category && normalize_metric_name(&metric.name) == **name
            })
        })
        .cloned()
        .collect()
}

/// Descriptive card of one metric, taken from its first measurement.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricInfo {
    pub key: String,
    pub label: String,
    pub color: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub reference_min: Option<f64>,
    pub reference_max: Option<f64>,
}

impl MetricInfo {
    /// `"70 a 99 mg/dL"`, with `-` for a missing bound; `None` without bounds.
    pub fn reference_label(&self) -> Option<String> {
        if self.reference_min.is_none() && self.reference_max.is_none() {
            return None;
        }
        let bound = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
        let range = format!("{} a {}", bound(self.reference_min), bound(self.reference_max));
        Some(match self.unit.as_deref() {
            Some(unit) => format!("{range} {unit}"),
            None => range,
        })
    }
}

pub fn metric_info(metrics: &[HealthMetric], key: &str) -> Option<MetricInfo> {
    let first = metrics
        .iter()
        .find(|metric| normalize_metric_name(&metric.name) == key)?;
    let reference = resolve_reference(first);

    Some(MetricInfo {
        key: key.to_string(),
        label: metric_display_name(key),
        color: metric_color(key),
        category: first
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .map(str::to_string),
        unit: first.unit.clone(),
        reference_min: reference.min,
        reference_max: reference.max,
    })
}

/// Info cards for `keys`, skipping names no measurement carries.
pub fn metric_infos(metrics: &[HealthMetric], keys: &[String]) -> Vec<MetricInfo> {
    keys.iter()
        .filter_map(|key| metric_info(metrics, key))
        .collect()
}
