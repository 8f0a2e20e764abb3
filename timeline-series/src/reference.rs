//! Reference ranges from explicit bounds or lab free text.

use std::sync::LazyLock;

use exam_timeline_core::HealthMetric;
use regex::Regex;

use crate::value::{parse_decimal_text, parse_metric_value};

static BOUNDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d,.]+)\s*(?:-|a|to)\s*([\d,.]+)").unwrap());
static UPPER_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:<|até|inf\.|inferior a)\s*([\d,.]+)").unwrap());
static LOWER_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:>|sup\.|superior a)\s*([\d,.]+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReferenceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ReferenceRange {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Read a range written the way labs print it.
///
/// `"70 - 99"` gives both bounds, `"< 200"` / `"Até 150"` an upper bound with
/// zero as lower bound, `"> 60"` only a lower bound.
pub fn parse_reference_range(text: &str) -> ReferenceRange {
    let text = text.trim();

    if let Some(captures) = BOUNDED.captures(text) {
        return ReferenceRange {
            min: parse_decimal_text(&captures[1]),
            max: parse_decimal_text(&captures[2]),
        };
    }

    if let Some(captures) = UPPER_ONLY.captures(text) {
        return ReferenceRange {
            min: Some(0.0),
            max: parse_decimal_text(&captures[1]),
        };
    }

    if let Some(captures) = LOWER_ONLY.captures(text) {
        return ReferenceRange {
            min: parse_decimal_text(&captures[1]),
            max: None,
        };
    }

    ReferenceRange::default()
}

/// Bounds of a metric; explicit `referenceMin`/`referenceMax` win over the
/// free-text range, which only fills the gaps.
pub fn resolve_reference(metric: &HealthMetric) -> ReferenceRange {
    let explicit = ReferenceRange {
        min: parse_metric_value(metric.reference_min.as_ref()),
        max: parse_metric_value(metric.reference_max.as_ref()),
    };

    if explicit.min.is_some() && explicit.max.is_some() {
        return explicit;
    }

    let Some(text) = metric.reference_range.as_deref() else {
        return explicit;
    };

    let parsed = parse_reference_range(text);
    ReferenceRange {
        min: explicit.min.or(parsed.min),
        max: explicit.max.or(parsed.max),
    }
}
