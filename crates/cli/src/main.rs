//! Wait Time Predictor CLI
//!
//! A command-line tool for querying the prediction service and for
//! generating data and training models locally.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{health, predict, simulate, train};
use std::path::PathBuf;
use waittime_lib::{
    simulation::{DEFAULT_DATA_PATH, DEFAULT_NOISE_LEVEL, DEFAULT_NUM_SAMPLES, DEFAULT_SEED},
    store::DEFAULT_MODEL_PATH,
};

/// Wait Time Predictor CLI
#[derive(Parser)]
#[command(name = "wtp")]
#[command(author, version, about = "CLI for the Wait Time Predictor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via WTP_API_URL env var or the config file)
    #[arg(long, env = "WTP_API_URL")]
    pub api_url: Option<String>,

    /// Output format (defaults to the config file setting, then table)
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the wait time for a queue
    Predict {
        /// Number of people in the queue
        #[arg(long, short, allow_negative_numbers = true)]
        queue_size: i64,

        /// Average service time per person in seconds
        #[arg(long, short = 's')]
        service_time: f64,

        /// Arrival rate in people per minute (server default 2.0)
        #[arg(long, short)]
        arrival_rate: Option<f64>,
    },

    /// Predict the wait time from a photo of the queue
    PredictImage {
        /// Image file (jpg, png, ...)
        image: PathBuf,

        /// Average service time per person in seconds
        #[arg(long, short = 's')]
        service_time: f64,

        /// Arrival rate in people per minute
        #[arg(long, short)]
        arrival_rate: Option<f64>,
    },

    /// Retrain the model
    Train {
        /// Model type (linear or random_forest)
        #[arg(long, short, default_value = "linear")]
        model_type: String,

        /// Train in this process instead of on the server
        #[arg(long)]
        local: bool,

        /// Dataset path for local training
        #[arg(long, default_value = DEFAULT_DATA_PATH)]
        data_path: PathBuf,

        /// Model path for local training
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model_path: PathBuf,

        /// Rows to generate when the local dataset is missing
        #[arg(long, default_value_t = DEFAULT_NUM_SAMPLES)]
        samples: usize,

        /// Seed for local dataset generation
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },

    /// Check service health
    Health,

    /// Generate a synthetic queue dataset
    Simulate {
        /// Output CSV path
        #[arg(long, short, default_value = DEFAULT_DATA_PATH)]
        output: PathBuf,

        /// Number of rows
        #[arg(long, default_value_t = DEFAULT_NUM_SAMPLES)]
        samples: usize,

        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Standard deviation of the multiplicative label noise
        #[arg(long, default_value_t = DEFAULT_NOISE_LEVEL)]
        noise: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    let format = match (cli.format, &config.default_format) {
        (Some(format), _) => format,
        (None, Some(name)) => name.parse()?,
        (None, None) => output::OutputFormat::default(),
    };
    let api_url = config.resolve_api_url(cli.api_url);

    match cli.command {
        Commands::Predict {
            queue_size,
            service_time,
            arrival_rate,
        } => {
            let client = client::ApiClient::new(&api_url)?;
            predict::predict(&client, queue_size, service_time, arrival_rate, format).await?;
        }
        Commands::PredictImage {
            image,
            service_time,
            arrival_rate,
        } => {
            let client = client::ApiClient::new(&api_url)?;
            predict::predict_image(&client, &image, service_time, arrival_rate, format).await?;
        }
        Commands::Train {
            model_type,
            local,
            data_path,
            model_path,
            samples,
            seed,
        } => {
            if local {
                train::train_local(&model_type, data_path, model_path, samples, seed, format)
                    .await?;
            } else {
                let client = client::ApiClient::new(&api_url)?;
                train::train_remote(&client, &model_type, format).await?;
            }
        }
        Commands::Health => {
            let client = client::ApiClient::new(&api_url)?;
            health::show_health(&client, format).await?;
        }
        Commands::Simulate {
            output,
            samples,
            seed,
            noise,
        } => {
            simulate::simulate(output, samples, seed, noise, format).await?;
        }
    }

    Ok(())
}
