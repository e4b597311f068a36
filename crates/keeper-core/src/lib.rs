//! keeper-core — configuration and shared parsing helpers for Keeper.

pub mod config;
pub mod duration;

pub use config::KeeperConfig;
pub use duration::{parse_duration, DurationError};
