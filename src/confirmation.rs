//! Ovulation confirmation
//!
//! A sustained temperature rise after an LH surge confirms ovulation. The
//! evaluator averages the temperature deviation of the two most recent readings
//! and checks it against a fixed band.

use crate::types::{Confirmation, DailyReading, OvulationConfirmation};

/// Number of trailing readings averaged
pub const CONFIRMATION_READINGS: usize = 2;

/// Lowest averaged deviation (°C) that confirms ovulation
pub const MIN_CONFIRMING_DEVIATION: f64 = 0.3;

/// Highest averaged deviation (°C) that confirms ovulation
pub const MAX_CONFIRMING_DEVIATION: f64 = 0.8;

/// Evaluate the trailing readings; `readings` must be ordered oldest first
pub fn confirm_ovulation(readings: &[DailyReading]) -> Confirmation {
    if readings.len() < CONFIRMATION_READINGS {
        return Confirmation::InsufficientData {
            available: readings.len(),
        };
    }

    let recent = &readings[readings.len() - CONFIRMATION_READINGS..];
    let sum: f64 = recent.iter().map(DailyReading::temperature_or_zero).sum();
    let average = sum / recent.len() as f64;

    Confirmation::Evaluated(OvulationConfirmation {
        confirmed: (MIN_CONFIRMING_DEVIATION..=MAX_CONFIRMING_DEVIATION).contains(&average),
        average_temperature_deviation: average,
    })
}
