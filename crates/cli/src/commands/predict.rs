//! Prediction commands

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use waittime_lib::{PredictionRequest, PredictionResult};

use crate::client::ApiClient;
use crate::output::{format_wait, print_record, FieldRow, OutputFormat};

/// Predict the wait for a known queue size
pub async fn predict(
    client: &ApiClient,
    queue_size: i64,
    avg_service_time: f64,
    arrival_rate: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    let request = PredictionRequest {
        queue_size,
        avg_service_time,
        arrival_rate,
    };
    let result = client.predict(&request).await?;
    print_prediction(&result, format)
}

/// Predict the wait for the queue visible in an image
pub async fn predict_image(
    client: &ApiClient,
    image_path: &Path,
    avg_service_time: f64,
    arrival_rate: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    let image = tokio::fs::read(image_path)
        .await
        .with_context(|| format!("Failed to read image {}", image_path.display()))?;
    let result = client
        .predict_image(image, avg_service_time, arrival_rate)
        .await?;
    print_prediction(&result, format)
}

fn print_prediction(result: &PredictionResult, format: OutputFormat) -> Result<()> {
    let rows = vec![
        FieldRow::new(
            "Predicted wait",
            format_wait(result.predicted_wait_time_seconds).green().bold(),
        ),
        FieldRow::new("Seconds", format!("{:.2}", result.predicted_wait_time_seconds)),
        FieldRow::new("Minutes", format!("{:.2}", result.predicted_wait_time_minutes)),
        FieldRow::new("Queue size", result.queue_size),
        FieldRow::new("Avg service time (s)", result.avg_service_time),
        FieldRow::new("Arrival rate (/min)", result.arrival_rate),
    ];
    print_record(result, rows, format)
}
