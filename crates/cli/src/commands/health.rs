//! Service health command

use anyhow::Result;

use crate::client::ApiClient;
use crate::output::{color_status, print_record, FieldRow, OutputFormat};

/// Show whether the service has a model loaded
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;
    let rows = vec![
        FieldRow::new("Status", color_status(health.status.as_str())),
        FieldRow::new("Model loaded", health.model_loaded),
    ];
    print_record(&health, rows, format)
}
