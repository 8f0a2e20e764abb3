//! Exam metric series: joins a patient's exams with their lab metrics and
//! produces one chart row per exam date, one column per canonical metric.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use exam_timeline_core::{
    Exam, HealthMetric, MetricCell, SeriesConfig, SeriesRow, TimelineError, TrendSeries,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

pub mod cache;
pub mod catalog;
pub mod chart;
pub mod dates;
pub mod names;
pub mod reference;
pub mod results;
pub mod session;
pub mod value;

pub use cache::SeriesCache;
pub use catalog::{filter_by_category, metric_categories, metric_infos, MetricInfo, UNCATEGORIZED};
pub use chart::{tooltip_entries, ChartLine, ChartModel, ChartPoint, TooltipEntry};
pub use dates::{date_key, DateKey};
pub use names::{metric_display_name, normalize_metric_name};
pub use results::{parse_result_lines, ParsedResult};
pub use session::{TrendSession, TrendView};
pub use value::parse_metric_value;

use dates::UNDATED_LABEL;
use reference::resolve_reference;

/// Parse the exam collection returned by the API.
pub fn exams_from_json_str(json: &str) -> Result<Vec<Exam>, TimelineError> {
    serde_json::from_str(json).map_err(|err| TimelineError::Parse(format!("exams: {err}")))
}

/// Parse the health-metric collection returned by the API.
pub fn metrics_from_json_str(json: &str) -> Result<Vec<HealthMetric>, TimelineError> {
    serde_json::from_str(json).map_err(|err| TimelineError::Parse(format!("metrics: {err}")))
}

/// Build a series from the two JSON collections.
pub fn build_series_from_json(
    exams_json: &str,
    metrics_json: &str,
    config: &SeriesConfig,
) -> Result<TrendSeries, TimelineError> {
    config.validate()?;
    let exams = exams_from_json_str(exams_json)?;
    let metrics = metrics_from_json_str(metrics_json)?;
    Ok(build_series(&exams, &metrics, config))
}

/// Build a series from already-decoded `serde_json::Value` collections.
pub fn build_series_from_values(
    exams: &Value,
    metrics: &Value,
    config: &SeriesConfig,
) -> Result<TrendSeries, TimelineError> {
    config.validate()?;
    let exams = Vec::<Exam>::deserialize(exams)
        .map_err(|err| TimelineError::Parse(format!("exams: {err}")))?;
    let metrics = Vec::<HealthMetric>::deserialize(metrics)
        .map_err(|err| TimelineError::Parse(format!("metrics: {err}")))?;
    Ok(build_series(&exams, &metrics, config))
}

/// Join exams with their metrics into chart rows.
///
/// A metric belongs to an exam when its `examId` matches. Only when an exam
/// has no linked metric at all are unlinked metrics recorded on the same
/// display date attributed to it. Values that cannot be parsed are skipped.
pub fn build_series(
    exams: &[Exam],
    metrics: &[HealthMetric],
    config: &SeriesConfig,
) -> TrendSeries {
    if exams.is_empty() || metrics.is_empty() {
        return TrendSeries::default();
    }

    let mut builder = SeriesBuilder::new(metrics, config);
    for exam in exams {
        builder.add_exam(exam);
    }

    let available = available_metrics(metrics);
    let displayed = prioritize_metrics(&available, config);

    TrendSeries {
        rows: builder.finish(),
        available,
        displayed,
    }
}

/// Exams left after dropping the `excluded` ids, in their original order.
pub fn select_exams(exams: &[Exam], excluded: &BTreeSet<i64>) -> Vec<Exam> {
    exams
        .iter()
        .filter(|exam| !excluded.contains(&exam.id))
        .cloned()
        .collect()
}

/// Canonical names of every metric, in first-seen order.
pub fn available_metrics(metrics: &[HealthMetric]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for metric in metrics {
        let name = normalize_metric_name(&metric.name);
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Metrics offered for plotting: configured primary metrics first (in their
/// configured order), then the others in first-seen order, capped at
/// `max_series`.
pub fn prioritize_metrics(available: &[String], config: &SeriesConfig) -> Vec<String> {
    let limit = config.max_series;
    let mut displayed: Vec<String> = Vec::with_capacity(limit.min(available.len()));

    let primary = config
        .primary_metrics
        .iter()
        .filter(|name| available.contains(name));

    for name in primary.chain(available.iter()) {
        if displayed.len() >= limit {
            break;
        }
        if !displayed.contains(name) {
            displayed.push(name.clone());
        }
    }

    displayed
}

struct SeriesBuilder<'a> {
    config: &'a SeriesConfig,
    metrics: &'a [HealthMetric],
    /// Unlinked metrics with their display-date label.
    orphans: Vec<(&'a HealthMetric, String)>,
    rows: Vec<SeriesRow>,
    row_index: HashMap<String, usize>,
}

impl<'a> SeriesBuilder<'a> {
    fn new(metrics: &'a [HealthMetric], config: &'a SeriesConfig) -> Self {
        let orphans = metrics
            .iter()
            .filter(|metric| metric.exam_id.is_none())
            .map(|metric| (metric, date_key(metric.date.as_deref(), config).label))
            .filter(|(_, label)| label != UNDATED_LABEL)
            .collect();

        Self {
            config,
            metrics,
            orphans,
            rows: Vec::new(),
            row_index: HashMap::new(),
        }
    }

    fn add_exam(&mut self, exam: &Exam) {
        let key = date_key(exam.display_date(), self.config);
        let matched = self.matched_metrics(exam.id, &key.label);
        if matched.is_empty() {
            return;
        }

        let cells: Vec<(String, MetricCell)> = matched
            .into_iter()
            .filter_map(|metric| resolve_cell(exam, metric))
            .collect();

        if cells.is_empty() {
            debug!(exam_id = exam.id, date = %key.label, "no readable metric values, row skipped");
            return;
        }

        let row = self.row_for(&key, exam);
        for (name, cell) in cells {
            row.cells.insert(name, cell);
        }
    }

    fn matched_metrics(&self, exam_id: i64, label: &str) -> Vec<&'a HealthMetric> {
        let direct: Vec<&HealthMetric> = self
            .metrics
            .iter()
            .filter(|metric| metric.exam_id == Some(exam_id))
            .collect();

        if !direct.is_empty() {
            return direct;
        }

        let fallback: Vec<&HealthMetric> = self
            .orphans
            .iter()
            .filter(|(_, orphan_label)| orphan_label == label)
            .map(|(metric, _)| *metric)
            .collect();

        if !fallback.is_empty() {
            debug!(exam_id, date = label, count = fallback.len(), "attributing unlinked metrics by date");
        }
        fallback
    }

    fn row_for(&mut self, key: &DateKey, exam: &Exam) -> &mut SeriesRow {
        let index = match self.row_index.get(&key.label) {
            Some(&index) => {
                let row = &mut self.rows[index];
                row.exam_id = exam.id;
                row.exam_name = exam.name.clone();
                row.timestamp = key.timestamp.or(row.timestamp);
                index
            }
            None => {
                debug!(exam_id = exam.id, date = %key.label, "new series row");
                self.rows
                    .push(SeriesRow::new(key.label.clone(), key.timestamp, exam));
                let index = self.rows.len() - 1;
                self.row_index.insert(key.label.clone(), index);
                index
            }
        };
        &mut self.rows[index]
    }

    fn finish(mut self) -> Vec<SeriesRow> {
        self.rows.sort_by(|a, b| match (a.timestamp, b.timestamp) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        self.rows
    }
}

fn resolve_cell(exam: &Exam, metric: &HealthMetric) -> Option<(String, MetricCell)> {
    let name = normalize_metric_name(&metric.name);
    let Some(value) = parse_metric_value(metric.value.as_ref()) else {
        warn!(
            exam_id = exam.id,
            metric_id = metric.id,
            metric = %name,
            raw = ?metric.value,
            "skipping metric with unreadable value"
        );
        return None;
    };

    let reference = resolve_reference(metric);
    Some((
        name,
        MetricCell {
            value,
            unit: metric.unit.clone(),
            status: metric.status,
            reference_min: reference.min,
            reference_max: reference.max,
        },
    ))
}
