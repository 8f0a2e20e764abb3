//! JavaScript bridge to the series builder, usable from any frontend framework.

use exam_timeline_core::{RawValue, SeriesConfig, TimelineError};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// Build the chart series from the `exams` and `healthMetrics` arrays
/// returned by the API.
#[wasm_bindgen]
pub fn build_series(
    exams: JsValue,
    metrics: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let exams = from_value::<serde_json::Value>(exams)
        .map_err(|err| JsValue::from_str(&format!("Não foi possível ler os exames: {err}")))?;
    let metrics = from_value::<serde_json::Value>(metrics)
        .map_err(|err| JsValue::from_str(&format!("Não foi possível ler as métricas: {err}")))?;
    let cfg = read_config(config)?;

    let series = exam_timeline_series::build_series_from_values(&exams, &metrics, &cfg)
        .map_err(|err| JsValue::from_str(&format_timeline_error(err)))?;

    to_value(&series)
        .map_err(|err| JsValue::from_str(&format!("Falha ao serializar a série: {err}")))
}

/// Numeric reading of a raw metric value; `NaN` when it has none.
#[wasm_bindgen]
pub fn parse_metric_value(value: JsValue) -> f64 {
    let raw = from_value::<Option<RawValue>>(value).ok().flatten();
    exam_timeline_series::parse_metric_value(raw.as_ref()).unwrap_or(f64::NAN)
}

/// Structured results from free-text exam lines (`Glicose: 95 mg/dL`).
#[wasm_bindgen]
pub fn parse_result_lines(text: &str) -> Result<JsValue, JsValue> {
    let results = exam_timeline_series::parse_result_lines(text);
    to_value(&results)
        .map_err(|err| JsValue::from_str(&format!("Falha ao serializar os resultados: {err}")))
}

/// Missing or partial config objects fall back to the defaults field by field.
fn read_config(config: Option<JsValue>) -> Result<SeriesConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => from_value(js_cfg)
            .map_err(|err| JsValue::from_str(&format!("Não foi possível ler a configuração: {err}"))),
        _ => Ok(SeriesConfig::default()),
    }
}

fn format_timeline_error(err: TimelineError) -> String {
    format!("Timeline error: {err}")
}
