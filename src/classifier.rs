//! Signal classification
//!
//! Turns a cycle day and a daily reading into one of four physiological states
//! and decides whether an alert is warranted. Also handles manual LH tests.
//!
//! Branches are evaluated in order and the first match wins:
//! 1. no reading -> `NoData`
//! 2. day outside the expected ovulation window -> `Nominal`
//! 3. HRV at or above threshold -> `Nominal`
//! 4. |temperature deviation| below threshold -> `HormonalShiftLikely`
//! 5. otherwise -> `IllnessLikely` (oyster alert when the protocol is enabled)

use chrono::{DateTime, Utc};

use crate::clock::expected_ovulation_window;
use crate::types::{
    Action, Alert, Assessment, ClassificationResult, CycleConfig, CycleDay, DailyReading,
    LhTestResult, OvulationAlert,
};

/// Advice surfaced when a hormonal shift is likely
pub const TAKE_LH_TEST: &str = "Take LH test today";

/// Advice surfaced when illness is likely
pub const CHECK_FOR_ILLNESS: &str = "Temperature abnormal - check for illness";

/// Expected ovulation after a positive LH test
pub const EXPECTED_OVULATION: &str = "Tomorrow or day after (12-36h window)";

/// Peak fertility after a positive LH test
pub const FERTILITY_WINDOW: &str = "TODAY through +48 hours";

/// Recommended action after a positive LH test
pub const SURGE_ACTION: &str = "Sex tonight + tomorrow night for optimal timing";

/// Classify a reading for the given cycle day
pub fn classify(
    day: CycleDay,
    reading: Option<&DailyReading>,
    config: &CycleConfig,
) -> Assessment {
    let thresholds = &config.alert_thresholds;

    let reading = match reading {
        Some(r) if !thresholds.strict_readings || r.is_complete() => r,
        _ => return verdict(day, ClassificationResult::NoData, None, None, None),
    };
    let metrics = Some(reading.metrics_summary());

    let window = expected_ovulation_window(config);
    if !window.contains(day) {
        return verdict(day, ClassificationResult::Nominal, metrics, None, None);
    }

    if reading.hrv_or_zero() >= thresholds.hrv_threshold {
        return verdict(day, ClassificationResult::Nominal, metrics, None, None);
    }

    if reading.temperature_or_zero().abs() < thresholds.temp_threshold {
        return verdict(
            day,
            ClassificationResult::HormonalShiftLikely,
            metrics,
            Some(TAKE_LH_TEST),
            None,
        );
    }

    let alert = if thresholds.oyster_protocol_enabled {
        Some(Alert::Oyster {
            metrics: reading.metrics_summary(),
        })
    } else {
        None
    };

    verdict(
        day,
        ClassificationResult::IllnessLikely,
        metrics,
        Some(CHECK_FOR_ILLNESS),
        alert,
    )
}

/// Decide what a manual LH test result means for the given day
pub fn record_manual_test(day: CycleDay, result: LhTestResult, now: DateTime<Utc>) -> Action {
    match result {
        LhTestResult::Positive => Action::OvulationAlert(OvulationAlert {
            cycle_day: day,
            surge_detected_at: now,
            expected_ovulation: EXPECTED_OVULATION.to_string(),
            fertility_window: FERTILITY_WINDOW.to_string(),
            action: SURGE_ACTION.to_string(),
        }),
        LhTestResult::Negative => Action::ContinueMonitoring { cycle_day: day },
    }
}

fn verdict(
    cycle_day: CycleDay,
    state: ClassificationResult,
    metrics: Option<String>,
    recommendation: Option<&str>,
    alert: Option<Alert>,
) -> Assessment {
    Assessment {
        cycle_day,
        state,
        metrics,
        recommendation: recommendation.map(str::to_string),
        alert,
    }
}
