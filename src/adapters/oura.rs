//! Oura vendor adapter
//!
//! Parses Oura v2 `daily_readiness` payloads into daily readings.

use crate::error::TrackerError;
use crate::types::DailyReading;
use chrono::NaiveDate;
use serde::Deserialize;

use super::ReadinessAdapter;

/// Oura readiness payload adapter
pub struct OuraAdapter;

impl ReadinessAdapter for OuraAdapter {
    fn parse(&self, raw_json: &str) -> Result<Vec<DailyReading>, TrackerError> {
        let payload: OuraReadinessPayload = serde_json::from_str(raw_json)?;
        Ok(into_readings(payload))
    }
}

/// Map a decoded payload into readings; a null or missing `data` is empty
fn into_readings(payload: OuraReadinessPayload) -> Vec<DailyReading> {
    let mut readings: Vec<DailyReading> = payload
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|record| DailyReading {
            date: record.day,
            hrv_balance: record.contributors.and_then(|c| c.hrv_balance),
            temperature_deviation: record.temperature_deviation,
            readiness_score: record.score,
        })
        .collect();

    // Stable sort keeps provider order for duplicate days
    readings.sort_by_key(|r| r.date);
    readings
}

// Oura API response structures

#[derive(Debug, Deserialize)]
struct OuraReadinessPayload {
    #[serde(default)]
    data: Option<Vec<OuraReadiness>>,
}

#[derive(Debug, Deserialize)]
struct OuraReadiness {
    day: NaiveDate,
    score: Option<f64>,
    temperature_deviation: Option<f64>,
    contributors: Option<OuraContributors>,
}

#[derive(Debug, Deserialize)]
struct OuraContributors {
    hrv_balance: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_oura_payload() {
        let json = r#"{
            "data": [
                {
                    "id": "b2",
                    "day": "2024-01-16",
                    "score": 68,
                    "temperature_deviation": 0.12,
                    "temperature_trend_deviation": 0.05,
                    "timestamp": "2024-01-16T00:00:00+00:00",
                    "contributors": {
                        "activity_balance": 80,
                        "body_temperature": 95,
                        "hrv_balance": 41,
                        "previous_day_activity": 70,
                        "previous_night": 66,
                        "recovery_index": 90,
                        "resting_heart_rate": 88,
                        "sleep_balance": 77
                    }
                },
                {
                    "id": "b1",
                    "day": "2024-01-15",
                    "score": 81,
                    "temperature_deviation": -0.2,
                    "contributors": { "hrv_balance": 72 }
                }
            ],
            "next_token": null
        }"#;

        let readings = OuraAdapter.parse(json).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(readings[0].hrv_balance, Some(72.0));
        assert_eq!(readings[1].date, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
        assert_eq!(readings[1].hrv_balance, Some(41.0));
        assert_eq!(readings[1].temperature_deviation, Some(0.12));
        assert_eq!(readings[1].readiness_score, Some(68.0));
    }

    #[test]
    fn test_missing_fields_stay_absent() {
        let json = r#"{"data": [{"day": "2024-01-16", "contributors": {"hrv_balance": null}}]}"#;
        let readings = OuraAdapter.parse(json).unwrap();

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].hrv_balance, None);
        assert_eq!(readings[0].temperature_deviation, None);
    }

    #[test]
    fn test_empty_or_absent_data() {
        assert!(OuraAdapter.parse(r#"{"data": []}"#).unwrap().is_empty());
        assert!(OuraAdapter.parse(r#"{"data": null}"#).unwrap().is_empty());
        assert!(OuraAdapter.parse("{}").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json() {
        assert!(OuraAdapter.parse("not valid json").is_err());
    }
}
