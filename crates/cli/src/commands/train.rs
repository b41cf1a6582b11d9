//! Training commands

use anyhow::{Context, Result};
use std::path::PathBuf;
use waittime_lib::{
    simulation::SimulationConfig, ModelTrainer, ModelType, TrainerConfig, TrainingReport,
};

use crate::client::ApiClient;
use crate::output::{color_r2, color_status, print_info, print_record, FieldRow, OutputFormat};

/// Ask the service to retrain and swap in the new model
pub async fn train_remote(client: &ApiClient, model_type: &str, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Table {
        print_info(&format!("Training {} model on the server...", model_type));
    }
    let report = client.train(model_type).await?;
    print_report(&report, format)
}

/// Train in-process, writing the dataset and model to local paths
pub async fn train_local(
    model_type: &str,
    data_path: PathBuf,
    model_path: PathBuf,
    num_samples: usize,
    seed: u64,
    format: OutputFormat,
) -> Result<()> {
    let model_type: ModelType = model_type.parse()?;
    let trainer = ModelTrainer::new(TrainerConfig {
        data_path,
        model_path,
        simulation: SimulationConfig {
            num_samples,
            seed,
            ..Default::default()
        },
        ..Default::default()
    });

    let model = tokio::task::spawn_blocking(move || trainer.train(model_type, None))
        .await
        .context("Training task failed")??;
    print_report(&model.report(), format)
}

fn print_report(report: &TrainingReport, format: OutputFormat) -> Result<()> {
    let rows = vec![
        FieldRow::new("Status", color_status(&report.status)),
        FieldRow::new("Model type", report.model_type),
        FieldRow::new("R²", color_r2(report.r2_score)),
        FieldRow::new("MSE", format!("{:.2}", report.mse)),
        FieldRow::new("Train samples", report.train_samples),
        FieldRow::new("Holdout samples", report.holdout_samples),
        FieldRow::new("Trained at", report.trained_at.to_rfc3339()),
    ];
    print_record(report, rows, format)
}
