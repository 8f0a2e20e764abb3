//! Chart model handed to the renderer: one line per selected metric.

use chrono::{DateTime, Utc};
use exam_timeline_core::{MetricSelection, MetricStatus, SeriesRow, TrendSeries};
use serde::Serialize;

use crate::names::metric_display_name;

/// Fixed colors for metrics whose name contains one of these keywords.
/// First match wins, so narrower keywords come before broader ones.
const KEYWORD_COLORS: &[(&str, &str)] = &[
    ("hdl", "#2e7d32"),
    ("vldl", "#6a1b9a"),
    ("ldl", "#ef6c00"),
    ("hemograma", "#e53935"),
    ("glicemia", "#8e24aa"),
    ("glicose", "#8e24aa"),
    ("colesterol", "#43a047"),
    ("triglicerídeos", "#fb8c00"),
    ("creatinina", "#1e88e5"),
    ("tsh", "#00897b"),
    ("t4", "#00acc1"),
    ("ácido úrico", "#6d4c41"),
    ("tgo", "#f4511e"),
    ("tgp", "#d81b60"),
    ("hemoglobina", "#b71c1c"),
    ("hematócrito", "#880e4f"),
    ("proteína c reativa", "#283593"),
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartPoint {
    /// Index of the row on the x axis.
    pub row: usize,
    pub date: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartLine {
    pub key: String,
    pub label: String,
    pub color: String,
    pub unit: Option<String>,
    pub points: Vec<ChartPoint>,
    pub reference_min: Option<f64>,
    pub reference_max: Option<f64>,
}

/// Everything the chart needs: the x-axis dates and the plotted lines.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct ChartModel {
    pub dates: Vec<String>,
    pub lines: Vec<ChartLine>,
}

impl ChartModel {
    /// Selected metrics absent from the series produce no line.
    pub fn build(series: &TrendSeries, selection: &MetricSelection) -> Self {
        let dates = series.rows.iter().map(|row| row.date.clone()).collect();
        let lines = selection
            .selected()
            .iter()
            .filter_map(|metric| build_line(series, metric))
            .collect();
        Self { dates, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Smallest and largest plotted value, reference bounds included.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        let values = self.lines.iter().flat_map(|line| {
            line.points
                .iter()
                .map(|point| point.value)
                .chain(line.reference_min)
                .chain(line.reference_max)
        });
        values.fold(None, |bounds, value| match bounds {
            None => Some((value, value)),
            Some((low, high)) => Some((low.min(value), high.max(value))),
        })
    }
}

fn build_line(series: &TrendSeries, metric: &str) -> Option<ChartLine> {
    let mut unit = None;
    let mut reference_min = None;
    let mut reference_max = None;

    let points: Vec<ChartPoint> = series
        .rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let cell = row.cell(metric)?;
            unit = cell.unit.clone().or(unit.take());
            reference_min = cell.reference_min.or(reference_min);
            reference_max = cell.reference_max.or(reference_max);
            Some(ChartPoint {
                row: index,
                date: row.date.clone(),
                timestamp: row.timestamp,
                value: cell.value,
            })
        })
        .collect();

    if points.is_empty() {
        return None;
    }

    Some(ChartLine {
        key: metric.to_string(),
        label: metric_display_name(metric),
        color: metric_color(metric),
        unit,
        points,
        reference_min,
        reference_max,
    })
}

/// One tooltip line for a hovered row.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TooltipEntry {
    pub label: String,
    pub value: f64,
    pub unit: Option<String>,
    pub status: MetricStatus,
}

/// Tooltip content of `row` for the given metrics, from the row's companion
/// unit and status fields.
pub fn tooltip_entries(row: &SeriesRow, metrics: &[String]) -> Vec<TooltipEntry> {
    metrics
        .iter()
        .filter_map(|metric| {
            let cell = row.cell(metric)?;
            Some(TooltipEntry {
                label: metric_display_name(metric),
                value: cell.value,
                unit: cell.unit.clone(),
                status: cell.status,
            })
        })
        .collect()
}

/// Stable color of a metric: a fixed color for common exams, otherwise an
/// HSL color derived from the name.
pub fn metric_color(metric: &str) -> String {
    let lowered = metric.to_lowercase();
    if let Some((_, color)) = KEYWORD_COLORS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
    {
        return color.to_string();
    }

    let hash = metric.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit)
            .wrapping_add(hash.wrapping_shl(5))
            .wrapping_sub(hash)
    });
    let hue = hash.unsigned_abs() % 360;
    let saturation = 65 + (hash >> 3).unsigned_abs() % 26;
    let lightness = 40 + (hash >> 6).unsigned_abs() % 21;
    format!("hsl({hue}, {saturation}%, {lightness}%)")
}
