//! Subcommand implementations

pub mod health;
pub mod predict;
pub mod simulate;
pub mod train;
