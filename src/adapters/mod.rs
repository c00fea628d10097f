//! Provider payload adapters
//!
//! This module provides adapters that parse raw provider JSON payloads and map
//! them to [`DailyReading`] values.

mod oura;

pub use oura::OuraAdapter;

use crate::error::TrackerError;
use crate::types::DailyReading;

/// Trait for readiness payload adapters
pub trait ReadinessAdapter {
    /// Parse raw JSON into readings ordered oldest first
    fn parse(&self, raw_json: &str) -> Result<Vec<DailyReading>, TrackerError>;
}
