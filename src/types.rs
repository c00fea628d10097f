//! Core types for the Cycle Flux engine
//!
//! This module defines the values that flow through each stage of a tracker
//! operation: configuration, readings, cycle arithmetic results, classifier
//! verdicts, LH test actions and outbound alerts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::TrackerError;

/// Default average cycle length in days
pub const DEFAULT_CYCLE_LENGTH_DAYS: u32 = 30;

/// Alert thresholds applied by the signal classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// HRV balance below this value counts as a drop
    pub hrv_threshold: f64,
    /// Absolute temperature deviation (°C) at or above this value is abnormal
    pub temp_threshold: f64,
    /// Send oyster alerts for illness-likely readings
    pub oyster_protocol_enabled: bool,
    /// Treat records missing HRV or temperature as no data instead of zero
    #[serde(default)]
    pub strict_readings: bool,
}

/// Immutable cycle configuration handed to the engine at startup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleConfig {
    /// First day of the current cycle (day 1)
    pub cycle_start_date: NaiveDate,
    /// Average cycle length in days, always > 0
    average_cycle_length_days: u32,
    /// Classifier thresholds
    pub alert_thresholds: AlertThresholds,
}

impl CycleConfig {
    /// Create a configuration, rejecting a zero cycle length
    pub fn new(
        cycle_start_date: NaiveDate,
        average_cycle_length_days: u32,
        alert_thresholds: AlertThresholds,
    ) -> Result<Self, TrackerError> {
        if average_cycle_length_days == 0 {
            return Err(TrackerError::Config(
                "averageCycleLength must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            cycle_start_date,
            average_cycle_length_days,
            alert_thresholds,
        })
    }

    pub fn average_cycle_length_days(&self) -> u32 {
        self.average_cycle_length_days
    }
}

/// One day of readiness data as returned by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReading {
    /// Calendar day the reading describes
    pub date: NaiveDate,
    /// HRV balance contributor, if the provider reported one
    pub hrv_balance: Option<f64>,
    /// Temperature deviation from baseline (°C), if reported
    pub temperature_deviation: Option<f64>,
    /// Overall readiness score, informational only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness_score: Option<f64>,
}

impl DailyReading {
    pub fn new(date: NaiveDate, hrv_balance: f64, temperature_deviation: f64) -> Self {
        Self {
            date,
            hrv_balance: Some(hrv_balance),
            temperature_deviation: Some(temperature_deviation),
            readiness_score: None,
        }
    }

    /// HRV balance, absent values count as 0
    pub fn hrv_or_zero(&self) -> f64 {
        self.hrv_balance.unwrap_or(0.0)
    }

    /// Temperature deviation, absent values count as 0
    pub fn temperature_or_zero(&self) -> f64 {
        self.temperature_deviation.unwrap_or(0.0)
    }

    /// Both metrics were reported
    pub fn is_complete(&self) -> bool {
        self.hrv_balance.is_some() && self.temperature_deviation.is_some()
    }

    /// Metrics line used in logs and oyster alerts
    pub fn metrics_summary(&self) -> String {
        format!(
            "HRV={}, Temp={:.2}°C",
            self.hrv_or_zero(),
            self.temperature_or_zero()
        )
    }
}

/// 1-indexed day of the current cycle
///
/// Instants before the cycle start yield values <= 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleDay(pub i64);

impl CycleDay {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CycleDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cycle-day range in which ovulation is expected (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvulationWindow {
    pub min_day: i64,
    pub max_day: i64,
}

impl OvulationWindow {
    pub fn contains(&self, day: CycleDay) -> bool {
        day.0 >= self.min_day && day.0 <= self.max_day
    }
}

/// Physiological state assigned to a daily reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationResult {
    /// No reading available
    NoData,
    /// Out of window, or HRV not depressed
    Nominal,
    /// In window, HRV depressed, temperature normal
    HormonalShiftLikely,
    /// In window, HRV depressed, temperature abnormal
    IllnessLikely,
}

impl ClassificationResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationResult::NoData => "no_data",
            ClassificationResult::Nominal => "nominal",
            ClassificationResult::HormonalShiftLikely => "hormonal_shift_likely",
            ClassificationResult::IllnessLikely => "illness_likely",
        }
    }
}

/// Manual LH test outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LhTestResult {
    Positive,
    Negative,
}

impl FromStr for LhTestResult {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "pos" | "+" => Ok(LhTestResult::Positive),
            "negative" | "neg" | "-" => Ok(LhTestResult::Negative),
            other => Err(TrackerError::InvalidLhResult(other.to_string())),
        }
    }
}

/// Payload of an ovulation alert raised by a positive LH test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvulationAlert {
    pub cycle_day: CycleDay,
    pub surge_detected_at: DateTime<Utc>,
    pub expected_ovulation: String,
    pub fertility_window: String,
    pub action: String,
}

/// Outbound alert kinds understood by the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    Ovulation(OvulationAlert),
    Oyster { metrics: String },
}

/// Outcome of recording a manual LH test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Action {
    OvulationAlert(OvulationAlert),
    ContinueMonitoring { cycle_day: CycleDay },
}

/// Full classifier verdict for one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub cycle_day: CycleDay,
    pub state: ClassificationResult,
    /// Formatted metrics, present whenever a reading was classified
    pub metrics: Option<String>,
    /// Advice surfaced to the caller, never dispatched
    pub recommendation: Option<String>,
    /// Alert the dispatcher should send
    pub alert: Option<Alert>,
}

/// Averaged post-surge temperature and whether it confirms ovulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OvulationConfirmation {
    pub confirmed: bool,
    pub average_temperature_deviation: f64,
}

/// Result of a confirmation query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Confirmation {
    /// Fewer than two trailing readings; cannot confirm yet
    InsufficientData { available: usize },
    Evaluated(OvulationConfirmation),
}

/// A rendered message ready for the notification transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Summary of a daily check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub cycle_day: CycleDay,
    pub state: ClassificationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hrv_balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_deviation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    /// Id of the dispatched alert, if one was sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<Uuid>,
}

/// Where today falls relative to the expected ovulation window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStatus {
    pub cycle_day: CycleDay,
    pub window: OvulationWindow,
    pub in_window: bool,
    /// Days until the window opens; 0 once it has opened
    pub days_until_window: i64,
}
