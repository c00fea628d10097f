//! Cycle Flux - readiness signal classification and alerting for cycle tracking
//!
//! Flux turns daily wearable readiness readings into cycle-aware decisions
//! through a small deterministic pipeline: cycle clock → signal classification
//! → alert dispatch. A manual LH test result takes a shorter path straight to
//! the dispatcher, and a separate confirmation step checks the post-surge
//! temperature rise.
//!
//! ## Modules
//!
//! - **Engine**: `clock`, `classifier`, `confirmation`, `dispatcher` (pure logic
//!   and message templates)
//! - **Ports**: `provider` (readiness data) and `transport` (notifications)
//! - **Orchestration**: `tracker` runs the three public operations

pub mod adapters;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod confirmation;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod provider;
pub mod tracker;
pub mod transport;
pub mod types;

pub use config::{CredentialResolver, Settings};
pub use dispatcher::{AlertDispatcher, MessageIdentity};
pub use error::TrackerError;
pub use provider::{OuraClient, ReadinessProvider};
pub use tracker::CycleTracker;
pub use transport::{LogTransport, NotificationPort, RelayTransport};

/// Flux version reported by the CLI
pub const FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name used in reports
pub const PRODUCER_NAME: &str = "cycle-flux";
