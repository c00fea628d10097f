//! Alert dispatch
//!
//! Renders alerts into fixed message templates and hands them to the
//! notification transport. The dispatcher knows nothing about thresholds;
//! it only sends what the classifier asked for.

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::TrackerError;
use crate::transport::NotificationPort;
use crate::types::{Alert, OutboundMessage, OvulationAlert};

/// Sender and recipient for outbound alerts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageIdentity {
    pub from: String,
    pub to: String,
}

/// Stateless formatter plus sender
pub struct AlertDispatcher<N> {
    transport: N,
    identity: MessageIdentity,
}

impl<N: NotificationPort> AlertDispatcher<N> {
    pub fn new(transport: N, identity: MessageIdentity) -> Self {
        Self {
            transport,
            identity,
        }
    }

    pub fn transport(&self) -> &N {
        &self.transport
    }

    /// Render and send one alert. Transport errors propagate unchanged.
    pub async fn send(&self, alert: &Alert) -> Result<OutboundMessage, TrackerError> {
        let message = render(alert, &self.identity);
        self.transport.send(&message).await?;

        match alert {
            Alert::Ovulation(_) => info!(
                message_id = %message.id,
                transport = self.transport.name(),
                "Ovulation alert sent to {}",
                message.to
            ),
            Alert::Oyster { .. } => warn!(
                message_id = %message.id,
                transport = self.transport.name(),
                "Oyster alert sent to {}",
                message.to
            ),
        }

        Ok(message)
    }
}

/// Render an alert into a message for the given identity
pub fn render(alert: &Alert, identity: &MessageIdentity) -> OutboundMessage {
    let (subject, body) = match alert {
        Alert::Ovulation(data) => (ovulation_subject(data), ovulation_body(data)),
        Alert::Oyster { metrics } => (
            "🦪 Oyster Alert: Significant HRV Drop + Elevated Temperature".to_string(),
            oyster_body(metrics),
        ),
    };

    OutboundMessage {
        id: Uuid::new_v4(),
        from: identity.from.clone(),
        to: identity.to.clone(),
        subject,
        body,
    }
}

fn ovulation_subject(data: &OvulationAlert) -> String {
    format!(
        "🎯 Ovulation Alert: Fertile Window Open (Day {})",
        data.cycle_day
    )
}

fn ovulation_body(data: &OvulationAlert) -> String {
    format!(
        "\
LH SURGE DETECTED TODAY
━━━━━━━━━━━━━━━━━━━━━━━━━━━━
Ovulation happening in next 12-36 hours.

📅 TIMING:
• LH Surge: Today (Day {day})
• Expected Ovulation: {expected}
• Peak Fertility: {window}

🎯 ACTION PLAN:
✅ Sex tonight
✅ Sex tomorrow
✅ Optional: Day after for extra coverage

Temperature spike will confirm ovulation in 1-2 days.

Good luck! 🍀

Sent by Cycle Flux
",
        day = data.cycle_day,
        expected = data.expected_ovulation,
        window = data.fertility_window,
    )
}

fn oyster_body(metrics: &str) -> String {
    format!(
        "\
OYSTER PROTOCOL TRIGGERED
━━━━━━━━━━━━━━━━━━━━━━━━━━━━
Significant stress/illness indicators detected.

📊 METRICS:
{metrics}

⚠️ RECOMMENDATION:
This combination suggests illness or severe stress, not just hormonal changes.

🛑 ACTION:
• Rest today
• Monitor symptoms
• Hydrate well
• Check temperature manually

Will continue monitoring. Update you tomorrow.

Sent by Cycle Flux
"
    )
}
