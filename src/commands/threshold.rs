use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::cli::{SmoothingMode, ThresholdArgs};
use crate::kneedle::{KneeParams, Smoothing, ThresholdOutcome, find_threshold};

const STD_COLUMN: &str = "score_std";

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ColumnThreshold {
    column: String,
    points: usize,
    #[serde(flatten)]
    outcome: ThresholdOutcome,
}

pub fn run(args: ThresholdArgs) -> Result<()> {
    let records = load_table_analysis(&args.report)?;
    let params = KneeParams {
        sensitivity: args.sensitivity,
        smoothing: match args.smoothing {
            SmoothingMode::None => Smoothing::None,
            SmoothingMode::Polynomial => Smoothing::Polynomial {
                degree: args.degree,
            },
        },
    };

    let columns = if args.columns.is_empty() {
        score_columns(&records)
    } else {
        args.columns.clone()
    };
    info!(
        report = %args.report.display(),
        items = records.len(),
        columns = columns.len(),
        "computing knee thresholds"
    );

    let thresholds = compute_thresholds(&records, &columns, &params);

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &thresholds)
            .context("failed to serialize threshold json output")?;
        writeln!(output)?;
    } else {
        for threshold in &thresholds {
            writeln!(output, "{}", format_line(threshold))?;
        }
    }
    output.flush()?;
    Ok(())
}

fn load_table_analysis(path: &Path) -> Result<Vec<Map<String, Value>>> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let report: Value = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let Some(entries) = report.get("table_analysis").and_then(Value::as_array) else {
        bail!("{} has no table_analysis array", path.display());
    };
    if entries.is_empty() {
        bail!("{} has an empty table_analysis array", path.display());
    }

    Ok(entries
        .iter()
        .filter_map(|entry| entry.as_object().cloned())
        .collect())
}

/// Every `score_*` key holding a number in at least one record, except the
/// cross-rater standard deviation.
fn score_columns(records: &[Map<String, Value>]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| record.iter())
        .filter(|(key, value)| {
            key.starts_with("score_") && key.as_str() != STD_COLUMN && value.is_number()
        })
        .map(|(key, _)| key.clone())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

fn column_values(records: &[Map<String, Value>], column: &str) -> Vec<f64> {
    records
        .iter()
        .filter_map(|record| record.get(column).and_then(Value::as_f64))
        .collect()
}

fn compute_thresholds(
    records: &[Map<String, Value>],
    columns: &[String],
    params: &KneeParams,
) -> Vec<ColumnThreshold> {
    columns
        .iter()
        .map(|column| {
            let values = column_values(records, column);
            if values.is_empty() {
                warn!(column = %column, "column has no numeric values");
            }
            ColumnThreshold {
                column: column.clone(),
                points: values.len(),
                outcome: find_threshold(&values, params),
            }
        })
        .collect()
}

fn format_line(threshold: &ColumnThreshold) -> String {
    match threshold.outcome {
        ThresholdOutcome::Found {
            value,
            curve,
            direction,
            ..
        } => format!(
            "threshold for {}: {value} ({} {})",
            threshold.column,
            curve.as_str(),
            direction.as_str()
        ),
        ThresholdOutcome::NotFound => format!("threshold for {}: not found", threshold.column),
    }
}
