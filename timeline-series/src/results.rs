//! Structured results from free-text exam lines such as `Glicose: 95 mg/dL`.

use std::sync::LazyLock;

use exam_timeline_core::MetricStatus;
use regex::Regex;
use serde::Serialize;

use crate::names::{metric_display_name, normalize_metric_name};
use crate::value::parse_decimal_text;

static LINE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"^(.+?):\s*([\d,.]+)\s*(.*)$").unwrap(),
        Regex::new(r"^(.+?)\s*=\s*([\d,.]+)\s*(.*)$").unwrap(),
        Regex::new(r"^(.+?)\s*-\s*([\d,.]+)\s*(.*)$").unwrap(),
    ]
});

const DEFAULT_UNIT: &str = "units";
const OTHER_CATEGORY: &str = "Other";

struct NormalRangeEntry {
    key: &'static str,
    min: f64,
    max: f64,
    unit: &'static str,
    category: &'static str,
}

const NORMAL_RANGES: &[NormalRangeEntry] = &[
    NormalRangeEntry { key: "hemoglobina", min: 12.0, max: 16.0, unit: "g/dL", category: "Blood Test" },
    NormalRangeEntry { key: "glicose", min: 70.0, max: 100.0, unit: "mg/dL", category: "Blood Test" },
    NormalRangeEntry { key: "colesterol total", min: 0.0, max: 200.0, unit: "mg/dL", category: "Blood Test" },
    NormalRangeEntry { key: "tsh", min: 0.4, max: 4.0, unit: "mIU/L", category: "Hormones" },
    NormalRangeEntry { key: "t4 livre", min: 0.8, max: 1.8, unit: "ng/dL", category: "Hormones" },
    NormalRangeEntry { key: "triglicerídeos", min: 0.0, max: 150.0, unit: "mg/dL", category: "Blood Test" },
    NormalRangeEntry { key: "creatinina", min: 0.6, max: 1.2, unit: "mg/dL", category: "Renal Function" },
    NormalRangeEntry { key: "ureia", min: 15.0, max: 40.0, unit: "mg/dL", category: "Renal Function" },
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct NormalRange {
    pub min: f64,
    /// `None` when no upper limit is known.
    pub max: Option<f64>,
}

/// One result line turned into a classified measurement.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResult {
    pub category: String,
    /// Canonical series key.
    pub key: String,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub normal_range: NormalRange,
    pub status: MetricStatus,
}

/// Parse `Name: value unit`, `Name = value unit` and `Name - value unit` lines.
/// Lines without a readable value are skipped.
pub fn parse_result_lines(text: &str) -> Vec<ParsedResult> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_result_line)
        .collect()
}

fn parse_result_line(line: &str) -> Option<ParsedResult> {
    let captures = LINE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(line))?;

    let key = normalize_metric_name(captures[1].trim());
    let value = parse_decimal_text(&captures[2])?;
    let line_unit = captures
        .get(3)
        .map(|unit| unit.as_str().trim())
        .filter(|unit| !unit.is_empty())
        .unwrap_or(DEFAULT_UNIT);

    let known = NORMAL_RANGES.iter().find(|entry| entry.key == key);
    let (normal_range, unit, category) = match known {
        Some(entry) => (
            NormalRange { min: entry.min, max: Some(entry.max) },
            entry.unit,
            entry.category,
        ),
        None => (NormalRange { min: 0.0, max: None }, line_unit, OTHER_CATEGORY),
    };

    Some(ParsedResult {
        category: category.to_string(),
        name: metric_display_name(&key),
        key,
        value,
        unit: unit.to_string(),
        normal_range,
        status: classify(value, &normal_range),
    })
}

fn classify(value: f64, range: &NormalRange) -> MetricStatus {
    if value < range.min {
        MetricStatus::Low
    } else if range.max.is_some_and(|max| value > max) {
        MetricStatus::High
    } else {
        MetricStatus::Normal
    }
}
