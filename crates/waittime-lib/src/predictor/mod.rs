//! Prediction service
//!
//! [`WaitTimePredictor`] owns the live model and the single-flight gate that
//! serializes loading and training. Image input goes through a
//! [`PeopleCounter`] that turns pixels into a queue size.

mod service;
mod vision;

pub use service::{PredictorConfig, PredictorStats, WaitTimePredictor, DEFAULT_TRAINING_TIMEOUT};
pub use vision::{FixedPeopleCounter, PeopleCounter, DEFAULT_MAX_PEOPLE};
