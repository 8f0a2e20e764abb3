//! Core data model for the exam metric timeline: exams, health metrics, the
//! chart-ready series and the configuration that shapes it.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

mod selection;

pub use selection::MetricSelection;

/// Clinical metrics shown first when they are available, in this order.
pub const PRIMARY_METRICS: [&str; 8] = [
    "hemoglobina",
    "glicose",
    "colesterol total",
    "hematócrito",
    "leucócitos",
    "plaquetas",
    "vitamina d",
    "albumina",
];

/// Settings that shape how a series is built and labelled.
/// Missing fields take their default when deserialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct SeriesConfig {
    /// Maximum number of metrics offered for plotting.
    pub max_series: usize,
    /// Canonical names placed ahead of every other metric.
    pub primary_metrics: Vec<String>,
    /// Offset (minutes east of UTC) used to turn instants into calendar days.
    pub display_offset_minutes: i32,
    /// `chrono` format string of the row grouping key.
    pub date_format: String,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            max_series: 8,
            primary_metrics: PRIMARY_METRICS.iter().map(|name| name.to_string()).collect(),
            display_offset_minutes: -180,
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

impl SeriesConfig {
    /// Reject settings the builder cannot work with.
    pub fn validate(&self) -> Result<(), TimelineError> {
        if self.max_series == 0 {
            return Err(TimelineError::InvalidConfig(
                "max_series must be at least 1".to_string(),
            ));
        }
        if self.display_offset().is_none() {
            return Err(TimelineError::InvalidConfig(format!(
                "display offset of {} minutes is out of range",
                self.display_offset_minutes
            )));
        }
        if self.date_format.trim().is_empty() {
            return Err(TimelineError::InvalidConfig(
                "date_format cannot be empty".to_string(),
            ));
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(TimelineError::InvalidConfig(format!(
                "date_format {:?} is not a valid strftime pattern",
                self.date_format
            )));
        }
        Ok(())
    }

    /// Fixed offset for display dates; `None` when the minutes are out of range.
    pub fn display_offset(&self) -> Option<FixedOffset> {
        self.display_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }
}

/// A value as sent by the API: either a JSON number or free text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl Hash for RawValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            RawValue::Number(number) => {
                0u8.hash(state);
                number.to_bits().hash(state);
            }
            RawValue::Text(text) => {
                1u8.hash(state);
                text.hash(state);
            }
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

/// Classification attached to a metric by the lab or the analysis step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case", from = "Option<String>")]
pub enum MetricStatus {
    Normal,
    High,
    Low,
    Attention,
    #[default]
    Unknown,
}

impl MetricStatus {
    /// Map a free-text status (Portuguese or English) onto the vocabulary.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "normal" => MetricStatus::Normal,
            "alto" | "alta" | "elevado" | "elevada" | "high" => MetricStatus::High,
            "baixo" | "baixa" | "low" => MetricStatus::Low,
            "atencao" | "atenção" | "attention" | "limítrofe" | "limitrofe" | "borderline" => {
                MetricStatus::Attention
            }
            _ => MetricStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricStatus::Normal => "normal",
            MetricStatus::High => "high",
            MetricStatus::Low => "low",
            MetricStatus::Attention => "attention",
            MetricStatus::Unknown => "unknown",
        }
    }
}

impl From<Option<String>> for MetricStatus {
    fn from(label: Option<String>) -> Self {
        label
            .as_deref()
            .map(MetricStatus::from_label)
            .unwrap_or_default()
    }
}

/// An uploaded exam. Dates are kept as the text the API sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: i64,
    #[serde(default)]
    pub profile_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub exam_date: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub laboratory_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Exam {
    /// Date shown for the exam: the exam date, then the upload date, then
    /// the record creation date.
    pub fn display_date(&self) -> Option<&str> {
        [&self.exam_date, &self.upload_date, &self.created_at]
            .into_iter()
            .filter_map(|date| date.as_deref())
            .find(|date| !date.trim().is_empty())
    }
}

/// A single lab measurement, optionally linked to the exam it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetric {
    pub id: i64,
    #[serde(default)]
    pub exam_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub value: Option<RawValue>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub status: MetricStatus,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub reference_min: Option<RawValue>,
    #[serde(default)]
    pub reference_max: Option<RawValue>,
    #[serde(default)]
    pub reference_range: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// One metric value inside a series row.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCell {
    pub value: f64,
    pub unit: Option<String>,
    pub status: MetricStatus,
    pub reference_min: Option<f64>,
    pub reference_max: Option<f64>,
}

/// All metric values recorded on one display date.
///
/// Serializes to the flat object charting libraries expect:
/// `{"date": "15/01/2024", "hemoglobina": 14.5, "hemoglobina_unit": "g/dL", ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub date: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub exam_id: i64,
    pub exam_name: String,
    pub cells: BTreeMap<String, MetricCell>,
}

impl SeriesRow {
    pub fn new(date: impl Into<String>, timestamp: Option<DateTime<Utc>>, exam: &Exam) -> Self {
        Self {
            date: date.into(),
            timestamp,
            exam_id: exam.id,
            exam_name: exam.name.clone(),
            cells: BTreeMap::new(),
        }
    }

    pub fn cell(&self, metric: &str) -> Option<&MetricCell> {
        self.cells.get(metric)
    }

    pub fn value(&self, metric: &str) -> Option<f64> {
        self.cells.get(metric).map(|cell| cell.value)
    }
}

impl Serialize for SeriesRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("date", &self.date)?;
        map.serialize_entry(
            "timestamp",
            &self.timestamp.map(|instant| instant.timestamp_millis()),
        )?;
        map.serialize_entry("examId", &self.exam_id)?;
        map.serialize_entry("examName", &self.exam_name)?;
        for (metric, cell) in &self.cells {
            map.serialize_entry(metric, &cell.value)?;
            map.serialize_entry(&format!("{metric}_unit"), &cell.unit)?;
            map.serialize_entry(&format!("{metric}_status"), &cell.status)?;
            if let Some(min) = cell.reference_min {
                map.serialize_entry(&format!("{metric}_min"), &min)?;
            }
            if let Some(max) = cell.reference_max {
                map.serialize_entry(&format!("{metric}_max"), &max)?;
            }
        }
        map.end()
    }
}

/// Chart-ready table for one patient, rebuilt from exams and metrics.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct TrendSeries {
    /// One row per exam date, oldest first.
    pub rows: Vec<SeriesRow>,
    /// Every canonical metric seen for the patient, first-seen order.
    pub available: Vec<String>,
    /// Metrics offered for plotting: primary metrics first, capped.
    pub displayed: Vec<String>,
}

impl TrendSeries {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Points of one metric across the rows, in row order.
    pub fn points<'a>(&'a self, metric: &'a str) -> impl Iterator<Item = (&'a SeriesRow, f64)> + 'a {
        self.rows
            .iter()
            .filter_map(move |row| row.value(metric).map(|value| (row, value)))
    }
}

/// Errors raised while reading input or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("could not read input: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failure reported by the collaborator that fetches exams or metrics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request failed with status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SeriesConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_series, 8);
        assert_eq!(config.primary_metrics[0], "hemoglobina");
        assert_eq!(
            config.display_offset().map(|offset| offset.local_minus_utc()),
            Some(-3 * 3600)
        );
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let zero = SeriesConfig {
            max_series: 0,
            ..SeriesConfig::default()
        };
        assert!(matches!(zero.validate(), Err(TimelineError::InvalidConfig(_))));

        let far = SeriesConfig {
            display_offset_minutes: 24 * 60,
            ..SeriesConfig::default()
        };
        assert!(far.validate().is_err());

        let blank = SeriesConfig {
            date_format: "  ".to_string(),
            ..SeriesConfig::default()
        };
        assert!(blank.validate().is_err());

        let broken = SeriesConfig {
            date_format: "%d/%Q".to_string(),
            ..SeriesConfig::default()
        };
        assert!(broken.validate().is_err());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: SeriesConfig =
            serde_json::from_str(r#"{"max_series": 4}"#).expect("partial config");
        assert_eq!(config.max_series, 4);
        assert_eq!(config.date_format, "%d/%m/%Y");
        assert_eq!(config.primary_metrics.len(), PRIMARY_METRICS.len());
    }

    #[test]
    fn status_accepts_portuguese_labels() {
        assert_eq!(MetricStatus::from_label("Alto"), MetricStatus::High);
        assert_eq!(MetricStatus::from_label("elevado"), MetricStatus::High);
        assert_eq!(MetricStatus::from_label(" baixo "), MetricStatus::Low);
        assert_eq!(MetricStatus::from_label("atenção"), MetricStatus::Attention);
        assert_eq!(MetricStatus::from_label("normal"), MetricStatus::Normal);
        assert_eq!(MetricStatus::from_label("???"), MetricStatus::Unknown);
    }

    #[test]
    fn metric_deserializes_from_api_json() {
        let json = r#"{
            "id": 3,
            "examId": null,
            "name": "Hemoglobina",
            "value": "14,5",
            "unit": "g/dL",
            "status": "alto",
            "date": "2024-01-15T10:00:00Z"
        }"#;
        let metric: HealthMetric = serde_json::from_str(json).expect("metric");
        assert_eq!(metric.exam_id, None);
        assert_eq!(metric.value, Some(RawValue::Text("14,5".to_string())));
        assert_eq!(metric.status, MetricStatus::High);
        assert_eq!(metric.reference_range, None);

        let numeric: HealthMetric =
            serde_json::from_str(r#"{"id": 4, "name": "Glicose", "value": 95, "status": null}"#)
                .expect("numeric metric");
        assert_eq!(numeric.value, Some(RawValue::Number(95.0)));
        assert_eq!(numeric.status, MetricStatus::Unknown);
    }

    #[test]
    fn exam_falls_back_to_upload_date() {
        let exam: Exam = serde_json::from_str(
            r#"{"id": 1, "name": "Hemograma", "examDate": "", "createdAt": "2024-03-02T12:00:00Z"}"#,
        )
        .expect("exam");
        assert_eq!(exam.display_date(), Some("2024-03-02T12:00:00Z"));

        let dated = Exam {
            exam_date: Some("2024-01-15".to_string()),
            ..exam
        };
        assert_eq!(dated.display_date(), Some("2024-01-15"));
    }

    #[test]
    fn exam_accepts_upload_and_creation_dates_together() {
        let exam: Exam = serde_json::from_str(
            r#"{"id": 1, "name": "H", "examDate": null,
                "uploadDate": "2024-01-16T10:00:00Z", "createdAt": "2024-01-17T08:00:00Z"}"#,
        )
        .expect("exam with both dates");
        assert_eq!(exam.upload_date.as_deref(), Some("2024-01-16T10:00:00Z"));
        assert_eq!(exam.created_at.as_deref(), Some("2024-01-17T08:00:00Z"));
        assert_eq!(exam.display_date(), Some("2024-01-16T10:00:00Z"));

        let created_only = Exam {
            upload_date: Some("  ".to_string()),
            ..exam
        };
        assert_eq!(created_only.display_date(), Some("2024-01-17T08:00:00Z"));
    }

    #[test]
    fn row_serializes_flat() {
        let exam = Exam {
            id: 9,
            profile_id: None,
            name: "Hemograma".to_string(),
            exam_date: None,
            upload_date: None,
            created_at: None,
            laboratory_name: None,
            status: None,
        };
        let mut row = SeriesRow::new("15/01/2024", None, &exam);
        row.cells.insert(
            "hemoglobina".to_string(),
            MetricCell {
                value: 14.5,
                unit: Some("g/dL".to_string()),
                status: MetricStatus::Normal,
                reference_min: Some(12.0),
                reference_max: None,
            },
        );

        let value = serde_json::to_value(&row).expect("row json");
        assert_eq!(value["date"], "15/01/2024");
        assert_eq!(value["timestamp"], serde_json::Value::Null);
        assert_eq!(value["examId"], 9);
        assert_eq!(value["hemoglobina"], 14.5);
        assert_eq!(value["hemoglobina_unit"], "g/dL");
        assert_eq!(value["hemoglobina_status"], "normal");
        assert_eq!(value["hemoglobina_min"], 12.0);
        assert!(value.get("hemoglobina_max").is_none());
    }
}
