use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use exam_timeline_core::{SeriesConfig, TrendSeries};
use exam_timeline_series::{
    build_series, exams_from_json_str, metric_display_name, metrics_from_json_str,
    parse_result_lines, select_exams, ParsedResult,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "exam_timeline_series=info,exam_timeline_cli=info";

#[derive(Parser, Debug)]
#[command(
    name = "exam-timeline",
    about = "Gera a série temporal de métricas a partir dos exames de um paciente."
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Monta a série do gráfico a partir dos JSON de exames e métricas.
    Series {
        /// Arquivo JSON com a lista de exames.
        #[arg(long)]
        exams: PathBuf,
        /// Arquivo JSON com a lista de métricas.
        #[arg(long)]
        metrics: PathBuf,
        /// Configuração em JSON; campos ausentes usam o padrão.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Número máximo de métricas exibidas.
        #[arg(long)]
        max_series: Option<usize>,
        /// Id de exame a deixar fora da série (pode repetir).
        #[arg(long = "exclude-exam")]
        exclude_exams: Vec<i64>,
        /// Imprime a série completa em JSON.
        #[arg(long)]
        json: bool,
    },
    /// Extrai resultados de linhas de texto como `Glicose: 95 mg/dL`.
    Parse {
        /// Arquivo de texto com um resultado por linha.
        #[arg(short, long)]
        input: PathBuf,
        /// Imprime os resultados em JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    match Args::parse().command {
        Command::Series {
            exams,
            metrics,
            config,
            max_series,
            exclude_exams,
            json,
        } => run_series(
            &exams,
            &metrics,
            config.as_deref(),
            max_series,
            &exclude_exams.into_iter().collect(),
            json,
        ),
        Command::Parse { input, json } => run_parse(&input, json),
    }
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Não foi possível ler {path:?}"))
}

fn load_config(path: Option<&Path>, max_series: Option<usize>) -> anyhow::Result<SeriesConfig> {
    let mut config = match path {
        Some(path) => serde_json::from_str::<SeriesConfig>(&read_file(path)?)
            .with_context(|| format!("Configuração inválida em {path:?}"))?,
        None => SeriesConfig::default(),
    };
    if let Some(max_series) = max_series {
        config.max_series = max_series;
    }
    config.validate()?;
    Ok(config)
}

fn run_series(
    exams_path: &Path,
    metrics_path: &Path,
    config_path: Option<&Path>,
    max_series: Option<usize>,
    excluded: &BTreeSet<i64>,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path, max_series)?;
    let exams = exams_from_json_str(&read_file(exams_path)?)
        .with_context(|| format!("Exames inválidos em {exams_path:?}"))?;
    let metrics = metrics_from_json_str(&read_file(metrics_path)?)
        .with_context(|| format!("Métricas inválidas em {metrics_path:?}"))?;

    let included = select_exams(&exams, excluded);
    info!(
        exams = exams.len(),
        included = included.len(),
        metrics = metrics.len(),
        "building series"
    );
    let series = build_series(&included, &metrics, &config);

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
    } else {
        print_series(&series, exams.len());
    }
    Ok(())
}

/// Message shown instead of rows, matching the chart's empty states.
fn empty_state(series: &TrendSeries, exam_count: usize) -> Option<&'static str> {
    if exam_count == 0 {
        Some("Nenhum exame encontrado")
    } else if series.is_empty() {
        Some("Nenhuma métrica extraída")
    } else {
        None
    }
}

fn print_series(series: &TrendSeries, exam_count: usize) {
    if let Some(message) = empty_state(series, exam_count) {
        println!("{message}");
        return;
    }

    let displayed: Vec<String> = series
        .displayed
        .iter()
        .map(|metric| metric_display_name(metric))
        .collect();
    println!("Métricas exibidas: {}", displayed.join(", "));

    for row in &series.rows {
        let values: Vec<String> = series
            .displayed
            .iter()
            .filter_map(|metric| {
                let cell = row.cell(metric)?;
                let label = metric_display_name(metric);
                Some(match cell.unit.as_deref() {
                    Some(unit) => format!("{label}={} {unit}", cell.value),
                    None => format!("{label}={}", cell.value),
                })
            })
            .collect();
        println!("{}  {}  {}", row.date, row.exam_name, values.join("; "));
    }
}

fn run_parse(input: &Path, json: bool) -> anyhow::Result<()> {
    let text = read_file(input)?;
    let results = parse_result_lines(&text);
    info!(lines = text.lines().count(), results = results.len(), "parsed result lines");

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        results.iter().for_each(print_result);
    }
    Ok(())
}

fn print_result(result: &ParsedResult) {
    let range = match result.normal_range.max {
        Some(max) => format!("{}-{}", result.normal_range.min, max),
        None => format!(">= {}", result.normal_range.min),
    };
    println!(
        "[{}] {}: {} {} ({}; ref {range})",
        result.category,
        result.name,
        result.value,
        result.unit,
        result.status.as_str()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_timeline_core::{Exam, HealthMetric, MetricStatus, RawValue};

    #[test]
    fn empty_states_distinguish_missing_exams_from_missing_metrics() {
        let config = SeriesConfig::default();
        let metric = HealthMetric {
            id: 1,
            exam_id: Some(1),
            name: "Glicose".to_string(),
            value: Some(RawValue::from("90")),
            unit: None,
            status: MetricStatus::Normal,
            date: None,
            reference_min: None,
            reference_max: None,
            reference_range: None,
            category: None,
        };
        let no_exams = build_series(&[], &[metric], &config);
        assert_eq!(empty_state(&no_exams, 0), Some("Nenhum exame encontrado"));

        let exam: Exam =
            serde_json::from_str(r#"{"id": 1, "name": "Hemograma", "examDate": "2024-01-15"}"#)
                .expect("exam");
        let no_metrics = build_series(&[exam], &[], &config);
        assert_eq!(empty_state(&no_metrics, 1), Some("Nenhuma métrica extraída"));
    }

    #[test]
    fn partial_config_file_with_override() {
        let dir = std::env::temp_dir().join(format!("exam-timeline-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{"date_format": "%Y-%m-%d"}"#).expect("write config");

        let config = load_config(Some(&path), Some(3)).expect("config");
        assert_eq!(config.max_series, 3);
        assert_eq!(config.date_format, "%Y-%m-%d");
        assert!(load_config(None, Some(0)).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
