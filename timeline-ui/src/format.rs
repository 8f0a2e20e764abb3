//! pt-BR labels for the chart and its tooltip.

use exam_timeline_core::MetricStatus;

/// `1234.5` -> `"1234,5"`; at most two decimals, trailing zeros dropped.
pub fn format_value(value: f64) -> String {
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.replace('.', ",")
}

pub fn status_label(status: MetricStatus) -> Option<&'static str> {
    match status {
        MetricStatus::Normal => Some("normal"),
        MetricStatus::High => Some("alto"),
        MetricStatus::Low => Some("baixo"),
        MetricStatus::Attention => Some("atenção"),
        MetricStatus::Unknown => None,
    }
}

/// `"14,2 g/dL"`, or the bare number without a unit.
pub fn value_with_unit(value: f64, unit: Option<&str>) -> String {
    match unit.map(str::trim).filter(|unit| !unit.is_empty()) {
        Some(unit) => format!("{} {unit}", format_value(value)),
        None => format_value(value),
    }
}
