//! Tracker orchestration
//!
//! This module provides the public operations of Cycle Flux:
//! - `daily_check`: fetch the latest reading, classify it, dispatch any alert
//! - `record_lh_test`: act on a manual LH test result
//! - `confirm_ovulation`: check the post-surge temperature rise
//!
//! Each operation performs at most one provider fetch and one send. Provider
//! and transport failures are not retried; they abort the operation and
//! propagate to the caller.

use chrono::{DateTime, Days, Utc};
use tracing::{info, warn};

use crate::classifier::{classify, record_manual_test};
use crate::clock::{current_day, window_status};
use crate::confirmation::confirm_ovulation;
use crate::dispatcher::{AlertDispatcher, MessageIdentity};
use crate::error::TrackerError;
use crate::provider::ReadinessProvider;
use crate::transport::NotificationPort;
use crate::types::{
    Action, Alert, ClassificationResult, Confirmation, CycleConfig, DailyReading, DailyReport,
    LhTestResult, WindowStatus,
};

/// Days fetched before today for the daily check
const DAILY_CHECK_LOOKBACK_DAYS: u64 = 1;

/// Days fetched before today for ovulation confirmation
const CONFIRMATION_LOOKBACK_DAYS: u64 = 2;

/// Single-person cycle tracker with an immutable configuration
pub struct CycleTracker<P, N> {
    config: CycleConfig,
    provider: P,
    dispatcher: AlertDispatcher<N>,
}

impl<P: ReadinessProvider, N: NotificationPort> CycleTracker<P, N> {
    pub fn new(config: CycleConfig, provider: P, transport: N, identity: MessageIdentity) -> Self {
        Self {
            config,
            provider,
            dispatcher: AlertDispatcher::new(transport, identity),
        }
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &AlertDispatcher<N> {
        &self.dispatcher
    }

    /// Run the daily check for the current time
    pub async fn daily_check(&self) -> Result<DailyReport, TrackerError> {
        self.daily_check_at(Utc::now()).await
    }

    /// Run the daily check as of `now`
    pub async fn daily_check_at(&self, now: DateTime<Utc>) -> Result<DailyReport, TrackerError> {
        let cycle_day = current_day(&self.config, now);
        let today = now.date_naive();
        let start = today
            .checked_sub_days(Days::new(DAILY_CHECK_LOOKBACK_DAYS))
            .unwrap_or(today);

        let readings = self.provider.fetch_daily_readiness(start, today).await?;
        let latest = readings.last();

        let assessment = classify(cycle_day, latest, &self.config);

        match assessment.state {
            ClassificationResult::NoData => info!("No readiness data available"),
            _ => info!(
                "Day {}: {}",
                cycle_day,
                assessment.metrics.as_deref().unwrap_or_default()
            ),
        }
        match assessment.state {
            ClassificationResult::HormonalShiftLikely => {
                warn!("Significant HRV drop detected, temperature normal - likely hormonal");
                info!("Recommendation: {}", assessment.recommendation.as_deref().unwrap_or_default());
            }
            ClassificationResult::IllnessLikely => {
                warn!("Significant HRV drop detected, temperature abnormal - check for illness");
            }
            ClassificationResult::NoData | ClassificationResult::Nominal => {}
        }

        let reported = latest.filter(|_| assessment.state != ClassificationResult::NoData);

        let alert_id = match &assessment.alert {
            Some(alert) => Some(self.dispatcher.send(alert).await?.id),
            None => None,
        };

        Ok(DailyReport {
            cycle_day,
            state: assessment.state,
            hrv_balance: reported.map(DailyReading::hrv_or_zero),
            temperature_deviation: reported.map(DailyReading::temperature_or_zero),
            recommendation: assessment.recommendation,
            alert_id,
        })
    }

    /// Record a manual LH test taken now
    pub async fn record_lh_test(&self, result: LhTestResult) -> Result<Action, TrackerError> {
        self.record_lh_test_at(result, Utc::now()).await
    }

    /// Record a manual LH test taken at `now`; positive results alert immediately
    pub async fn record_lh_test_at(
        &self,
        result: LhTestResult,
        now: DateTime<Utc>,
    ) -> Result<Action, TrackerError> {
        let cycle_day = current_day(&self.config, now);
        let action = record_manual_test(cycle_day, result, now);

        match &action {
            Action::OvulationAlert(alert) => {
                info!("LH surge detected on Day {cycle_day}");
                self.dispatcher.send(&Alert::Ovulation(alert.clone())).await?;
            }
            Action::ContinueMonitoring { .. } => {
                info!("LH negative on Day {cycle_day} - continue monitoring");
            }
        }

        Ok(action)
    }

    /// Check for a confirming temperature rise as of now
    pub async fn confirm_ovulation(&self) -> Result<Confirmation, TrackerError> {
        self.confirm_ovulation_at(Utc::now()).await
    }

    /// Check for a confirming temperature rise as of `now`
    pub async fn confirm_ovulation_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Confirmation, TrackerError> {
        let today = now.date_naive();
        let start = today
            .checked_sub_days(Days::new(CONFIRMATION_LOOKBACK_DAYS))
            .unwrap_or(today);

        let readings = self.provider.fetch_daily_readiness(start, today).await?;
        let confirmation = confirm_ovulation(&readings);

        match confirmation {
            Confirmation::InsufficientData { available } => {
                info!("Not enough data for confirmation ({available} readings)");
            }
            Confirmation::Evaluated(result) if result.confirmed => info!(
                "Temperature spike confirmed ({:.2}°C) - ovulation occurred",
                result.average_temperature_deviation
            ),
            Confirmation::Evaluated(result) => info!(
                "No temperature spike yet ({:.2}°C) - waiting",
                result.average_temperature_deviation
            ),
        }

        Ok(confirmation)
    }

    /// Cycle day and window position for now; no I/O
    pub fn window_status(&self) -> WindowStatus {
        window_status(&self.config, Utc::now())
    }

    pub fn window_status_at(&self, now: DateTime<Utc>) -> WindowStatus {
        window_status(&self.config, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertThresholds, CycleDay, DailyReading, OutboundMessage};
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use std::sync::Mutex;

    /// In-memory provider recording requested ranges
    #[derive(Default)]
    struct FakeProvider {
        readings: Vec<DailyReading>,
        fail: bool,
        requests: Mutex<Vec<(NaiveDate, NaiveDate)>>,
    }

    #[async_trait]
    impl ReadinessProvider for FakeProvider {
        async fn fetch_daily_readiness(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<DailyReading>, TrackerError> {
            self.requests.lock().unwrap().push((start, end));
            if self.fail {
                return Err(TrackerError::ProviderFailure("HTTP 503".to_string()));
            }
            Ok(self.readings.clone())
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        sent: Mutex<Vec<OutboundMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationPort for FakeNotifier {
        fn name(&self) -> &str {
            "fake"
        }

        async fn send(&self, message: &OutboundMessage) -> Result<(), TrackerError> {
            if self.fail {
                return Err(TrackerError::TransportFailure("smtp down".to_string()));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn config(oyster: bool) -> CycleConfig {
        config_with(oyster, false)
    }

    fn config_with(oyster: bool, strict_readings: bool) -> CycleConfig {
        CycleConfig::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            30,
            AlertThresholds {
                hrv_threshold: 50.0,
                temp_threshold: 0.3,
                oyster_protocol_enabled: oyster,
                strict_readings,
            },
        )
        .unwrap()
    }

    fn reading(day: u32, hrv: f64, temp: f64) -> DailyReading {
        DailyReading::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), hrv, temp)
    }

    fn tracker(
        oyster: bool,
        provider: FakeProvider,
        notifier: FakeNotifier,
    ) -> CycleTracker<FakeProvider, FakeNotifier> {
        CycleTracker::new(
            config(oyster),
            provider,
            notifier,
            MessageIdentity {
                from: "tracker@example.com".to_string(),
                to: "partner@example.com".to_string(),
            },
        )
    }

    fn jan16() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 16, 7, 30, 0).unwrap()
    }

    fn sent_count(t: &CycleTracker<FakeProvider, FakeNotifier>) -> usize {
        t.dispatcher().transport().sent.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_daily_check_hormonal_shift_sends_nothing() {
        let provider = FakeProvider {
            readings: vec![reading(15, 70.0, 0.0), reading(16, 40.0, 0.1)],
            ..Default::default()
        };
        let t = tracker(true, provider, FakeNotifier::default());

        let report = t.daily_check_at(jan16()).await.unwrap();

        assert_eq!(report.cycle_day, CycleDay(16));
        assert_eq!(report.state, ClassificationResult::HormonalShiftLikely);
        assert_eq!(report.hrv_balance, Some(40.0));
        assert_eq!(report.recommendation.as_deref(), Some("Take LH test today"));
        assert!(report.alert_id.is_none());
        assert_eq!(sent_count(&t), 0);
    }

    #[tokio::test]
    async fn test_daily_check_requests_yesterday_through_today() {
        let t = tracker(true, FakeProvider::default(), FakeNotifier::default());
        t.daily_check_at(jan16()).await.unwrap();

        let requests = t.provider.requests.lock().unwrap();
        assert_eq!(
            requests.as_slice(),
            &[(
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
            )]
        );
    }

    #[tokio::test]
    async fn test_daily_check_illness_sends_one_oyster_alert() {
        let provider = FakeProvider {
            readings: vec![reading(16, 40.0, 0.5)],
            ..Default::default()
        };
        let t = tracker(true, provider, FakeNotifier::default());

        let report = t.daily_check_at(jan16()).await.unwrap();

        assert_eq!(report.state, ClassificationResult::IllnessLikely);
        let sent = t.dispatcher().transport().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(report.alert_id, Some(sent[0].id));
        assert!(sent[0].subject.starts_with("🦪 Oyster Alert"));
        assert!(sent[0].body.contains("HRV=40"));
        assert!(sent[0].body.contains("Temp=0.50°C"));
    }

    #[tokio::test]
    async fn test_daily_check_illness_without_oyster_protocol() {
        let provider = FakeProvider {
            readings: vec![reading(16, 40.0, 0.5)],
            ..Default::default()
        };
        let t = tracker(false, provider, FakeNotifier::default());

        let report = t.daily_check_at(jan16()).await.unwrap();

        assert_eq!(report.state, ClassificationResult::IllnessLikely);
        assert!(report.alert_id.is_none());
        assert_eq!(sent_count(&t), 0);
    }

    #[tokio::test]
    async fn test_daily_check_without_data() {
        let t = tracker(true, FakeProvider::default(), FakeNotifier::default());
        let report = t.daily_check_at(jan16()).await.unwrap();

        assert_eq!(report.state, ClassificationResult::NoData);
        assert_eq!(report.hrv_balance, None);
        assert_eq!(sent_count(&t), 0);
    }

    fn reading_without_hrv(day: u32, temp: f64) -> DailyReading {
        DailyReading {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            hrv_balance: None,
            temperature_deviation: Some(temp),
            readiness_score: None,
        }
    }

    #[tokio::test]
    async fn test_daily_check_reports_zero_defaulted_metrics() {
        let provider = FakeProvider {
            readings: vec![reading_without_hrv(16, 0.1)],
            ..Default::default()
        };
        let t = tracker(true, provider, FakeNotifier::default());

        let report = t.daily_check_at(jan16()).await.unwrap();

        assert_eq!(report.state, ClassificationResult::HormonalShiftLikely);
        assert_eq!(report.hrv_balance, Some(0.0));
        assert_eq!(report.temperature_deviation, Some(0.1));
    }

    #[tokio::test]
    async fn test_daily_check_strict_readings_treats_partial_record_as_no_data() {
        let provider = FakeProvider {
            readings: vec![reading_without_hrv(16, 0.5)],
            ..Default::default()
        };
        let t = CycleTracker::new(
            config_with(true, true),
            provider,
            FakeNotifier::default(),
            MessageIdentity {
                from: "tracker@example.com".to_string(),
                to: "partner@example.com".to_string(),
            },
        );

        let report = t.daily_check_at(jan16()).await.unwrap();

        assert_eq!(report.state, ClassificationResult::NoData);
        assert_eq!(report.hrv_balance, None);
        assert_eq!(report.temperature_deviation, None);
        assert!(report.recommendation.is_none());
        assert!(report.alert_id.is_none());
        assert_eq!(sent_count(&t), 0);
    }

    #[tokio::test]
    async fn test_daily_check_uses_latest_reading() {
        let provider = FakeProvider {
            readings: vec![reading(15, 10.0, 0.9), reading(16, 80.0, 0.0)],
            ..Default::default()
        };
        let t = tracker(true, provider, FakeNotifier::default());

        let report = t.daily_check_at(jan16()).await.unwrap();
        assert_eq!(report.state, ClassificationResult::Nominal);
        assert_eq!(sent_count(&t), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_aborts_before_alerting() {
        let provider = FakeProvider {
            readings: vec![reading(16, 40.0, 0.5)],
            fail: true,
            ..Default::default()
        };
        let t = tracker(true, provider, FakeNotifier::default());

        let result = t.daily_check_at(jan16()).await;
        assert!(matches!(result, Err(TrackerError::ProviderFailure(_))));
        assert_eq!(sent_count(&t), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates_from_daily_check() {
        let provider = FakeProvider {
            readings: vec![reading(16, 40.0, 0.5)],
            ..Default::default()
        };
        let notifier = FakeNotifier {
            fail: true,
            ..Default::default()
        };
        let t = tracker(true, provider, notifier);

        let result = t.daily_check_at(jan16()).await;
        assert!(matches!(result, Err(TrackerError::TransportFailure(_))));
    }

    #[tokio::test]
    async fn test_positive_lh_test_sends_ovulation_alert() {
        let t = tracker(true, FakeProvider::default(), FakeNotifier::default());
        let now = Utc.with_ymd_and_hms(2024, 1, 17, 20, 0, 0).unwrap();

        let action = t.record_lh_test_at(LhTestResult::Positive, now).await.unwrap();

        assert!(matches!(action, Action::OvulationAlert(ref a) if a.cycle_day == CycleDay(17)));
        let sent = t.dispatcher().transport().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].subject,
            "🎯 Ovulation Alert: Fertile Window Open (Day 17)"
        );
        assert_eq!(sent[0].to, "partner@example.com");
        // no provider round trip for manual tests
        assert!(t.provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_negative_lh_test_sends_nothing() {
        let t = tracker(true, FakeProvider::default(), FakeNotifier::default());
        let action = t
            .record_lh_test_at(LhTestResult::Negative, jan16())
            .await
            .unwrap();

        assert_eq!(
            action,
            Action::ContinueMonitoring {
                cycle_day: CycleDay(16)
            }
        );
        assert_eq!(sent_count(&t), 0);
    }

    #[tokio::test]
    async fn test_confirm_ovulation_fetches_two_days_back() {
        let provider = FakeProvider {
            readings: vec![reading(14, 0.0, 0.0), reading(15, 60.0, 0.4), reading(16, 60.0, 0.6)],
            ..Default::default()
        };
        let t = tracker(true, provider, FakeNotifier::default());

        let confirmation = t.confirm_ovulation_at(jan16()).await.unwrap();

        match confirmation {
            Confirmation::Evaluated(c) => {
                assert!(c.confirmed);
                assert!((c.average_temperature_deviation - 0.5).abs() < 1e-9);
            }
            other => panic!("expected evaluation, got {other:?}"),
        }
        assert_eq!(
            t.provider.requests.lock().unwrap()[0].0,
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap()
        );
        assert_eq!(sent_count(&t), 0);
    }

    #[tokio::test]
    async fn test_confirm_ovulation_insufficient_data() {
        let provider = FakeProvider {
            readings: vec![reading(16, 60.0, 0.6)],
            ..Default::default()
        };
        let t = tracker(true, provider, FakeNotifier::default());

        assert_eq!(
            t.confirm_ovulation_at(jan16()).await.unwrap(),
            Confirmation::InsufficientData { available: 1 }
        );
    }

    #[test]
    fn test_window_status_at() {
        let t = tracker(true, FakeProvider::default(), FakeNotifier::default());
        let status = t.window_status_at(jan16());
        assert_eq!(status.cycle_day, CycleDay(16));
        assert!(status.in_window);
    }
}
