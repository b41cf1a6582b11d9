//! Dataset generation command

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use waittime_lib::simulation::{DatasetBuilder, SimulationConfig};

use crate::output::{print_record, print_success, FieldRow, OutputFormat};

#[derive(Serialize)]
struct SimulationSummary {
    path: String,
    rows: usize,
    seed: u64,
    mean_wait_time_seconds: f64,
    max_wait_time_seconds: f64,
}

/// Generate a synthetic queue dataset and write it as CSV
pub async fn simulate(
    output: PathBuf,
    num_samples: usize,
    seed: u64,
    noise_level: f64,
    format: OutputFormat,
) -> Result<()> {
    let builder = DatasetBuilder::new(SimulationConfig {
        num_samples,
        seed,
        noise_level,
        ..Default::default()
    });

    let path = output.clone();
    let dataset = tokio::task::spawn_blocking(move || builder.build_and_save(&path))
        .await
        .context("Simulation task failed")??;

    let targets = dataset.targets();
    let summary = SimulationSummary {
        path: output.display().to_string(),
        rows: dataset.len(),
        seed,
        mean_wait_time_seconds: targets.mean().unwrap_or(0.0),
        max_wait_time_seconds: targets.fold(0.0_f64, |acc, v| acc.max(*v)),
    };

    if format == OutputFormat::Table {
        print_success(&format!("Wrote {} rows to {}", summary.rows, summary.path));
    }
    let rows = vec![
        FieldRow::new("Rows", summary.rows),
        FieldRow::new("Seed", summary.seed),
        FieldRow::new("Mean wait (s)", format!("{:.2}", summary.mean_wait_time_seconds)),
        FieldRow::new("Max wait (s)", format!("{:.2}", summary.max_wait_time_seconds)),
    ];
    print_record(&summary, rows, format)
}
