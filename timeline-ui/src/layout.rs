//! Plot geometry: maps chart rows and values onto SVG coordinates.

use exam_timeline_series::{ChartLine, ChartModel};

pub const WIDTH: f64 = 720.0;
pub const HEIGHT: f64 = 320.0;
const PADDING_LEFT: f64 = 56.0;
const PADDING_RIGHT: f64 = 24.0;
const PADDING_Y: f64 = 24.0;
const HEADROOM: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    columns: usize,
    min: f64,
    max: f64,
}

impl ChartLayout {
    /// `None` when the chart has nothing to plot.
    pub fn new(chart: &ChartModel) -> Option<Self> {
        let (low, high) = chart.value_bounds()?;
        let span = high - low;
        let margin = if span > 0.0 {
            span * HEADROOM
        } else {
            low.abs().max(1.0) * HEADROOM
        };
        Some(Self {
            columns: chart.dates.len().max(1),
            min: low - margin,
            max: high + margin,
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Horizontal center of the row's column.
    pub fn x(&self, row: usize) -> f64 {
        PADDING_LEFT + self.column_width() * (row as f64 + 0.5)
    }

    pub fn y(&self, value: f64) -> f64 {
        let ratio = (value - self.min) / (self.max - self.min);
        HEIGHT - PADDING_Y - ratio * (HEIGHT - 2.0 * PADDING_Y)
    }

    pub fn column_width(&self) -> f64 {
        (WIDTH - PADDING_LEFT - PADDING_RIGHT) / self.columns as f64
    }

    pub fn column_left(&self, row: usize) -> f64 {
        PADDING_LEFT + self.column_width() * row as f64
    }

    pub fn plot_left(&self) -> f64 {
        PADDING_LEFT
    }

    pub fn plot_right(&self) -> f64 {
        WIDTH - PADDING_RIGHT
    }

    pub fn plot_top(&self) -> f64 {
        PADDING_Y
    }

    pub fn plot_bottom(&self) -> f64 {
        HEIGHT - PADDING_Y
    }

    /// SVG `points` attribute of a line.
    pub fn polyline(&self, line: &ChartLine) -> String {
        line.points
            .iter()
            .map(|point| format!("{:.1},{:.1}", self.x(point.row), self.y(point.value)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Evenly spaced axis values, bottom to top.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        if count < 2 {
            return vec![self.min];
        }
        let step = (self.max - self.min) / (count - 1) as f64;
        (0..count).map(|index| self.min + step * index as f64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_timeline_series::ChartPoint;

    fn chart(values: &[f64]) -> ChartModel {
        let points = values
            .iter()
            .enumerate()
            .map(|(row, value)| ChartPoint {
                row,
                date: format!("0{}/01/2024", row + 1),
                timestamp: None,
                value: *value,
            })
            .collect::<Vec<_>>();
        ChartModel {
            dates: points.iter().map(|point| point.date.clone()).collect(),
            lines: vec![ChartLine {
                key: "glicose".to_string(),
                label: "Glicose".to_string(),
                color: "#8e24aa".to_string(),
                unit: Some("mg/dL".to_string()),
                points,
                reference_min: None,
                reference_max: None,
            }],
        }
    }

    #[test]
    fn empty_chart_has_no_layout() {
        assert_eq!(ChartLayout::new(&ChartModel::default()), None);
    }

    #[test]
    fn higher_values_sit_higher() {
        let layout = ChartLayout::new(&chart(&[90.0, 110.0])).expect("layout");
        assert!(layout.y(110.0) < layout.y(90.0));
        assert!(layout.y(110.0) > layout.plot_top());
        assert!(layout.y(90.0) < layout.plot_bottom());
        assert!(layout.x(0) < layout.x(1));
        assert!(layout.x(1) < layout.plot_right());
    }

    #[test]
    fn flat_series_stays_inside_plot() {
        let layout = ChartLayout::new(&chart(&[5.0])).expect("layout");
        let y = layout.y(5.0);
        assert!((y - (HEIGHT / 2.0)).abs() < 1e-9);
        assert_eq!(layout.columns(), 1);
    }

    #[test]
    fn polyline_lists_every_point() {
        let data = chart(&[1.0, 2.0, 3.0]);
        let layout = ChartLayout::new(&data).expect("layout");
        let points = layout.polyline(&data.lines[0]);
        assert_eq!(points.split(' ').count(), 3);

        let ticks = layout.ticks(5);
        assert_eq!(ticks.len(), 5);
        assert!(ticks[0] < 1.0 && ticks[4] > 3.0);
    }
}
