//! HTTP front end for the wait time predictor

pub mod api;
pub mod config;
pub mod counter;
