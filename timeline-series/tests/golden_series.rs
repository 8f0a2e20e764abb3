use std::fs;

use exam_timeline_core::{MetricSelection, SeriesConfig};
use exam_timeline_series::{build_series_from_json, ChartModel};
use serde_json::Value;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|err| panic!("could not read fixture {name}: {err}"))
}

#[test]
fn patient_history_matches_golden() {
    let series = build_series_from_json(
        &read_fixture("exams.json"),
        &read_fixture("metrics.json"),
        &SeriesConfig::default(),
    )
    .expect("series from fixtures");

    let actual = serde_json::to_value(&series).expect("serialize series");
    let expected: Value =
        serde_json::from_str(&read_fixture("series_snapshot.json")).expect("golden is valid JSON");

    assert_eq!(actual, expected);
}

#[test]
fn golden_history_charts_every_displayed_metric_with_data() {
    let series = build_series_from_json(
        &read_fixture("exams.json"),
        &read_fixture("metrics.json"),
        &SeriesConfig::default(),
    )
    .expect("series from fixtures");

    let mut selection = MetricSelection::default();
    selection.sync_available(&series.displayed);
    let chart = ChartModel::build(&series, &selection);

    assert_eq!(chart.dates, ["09/01/2024", "18/03/2024", "02/06/2024"]);
    let keys: Vec<&str> = chart.lines.iter().map(|line| line.key.as_str()).collect();
    // plaquetas and tsh never produced a plottable value.
    assert_eq!(
        keys,
        [
            "hemoglobina",
            "glicose",
            "colesterol total",
            "leucócitos",
            "vitamina d",
            "colesterol hdl",
        ]
    );

    let cholesterol = &chart.lines[2];
    assert_eq!(cholesterol.label, "Colesterol Total");
    assert_eq!(cholesterol.points.len(), 1);
    assert_eq!(cholesterol.points[0].row, 0);
    assert_eq!(cholesterol.reference_max, Some(190.0));
}
