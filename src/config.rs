//! Settings loading
//!
//! Reads the JSON settings file, validates it and resolves the provider token.
//! The engine itself only ever sees the resulting [`Settings`] value.
//!
//! ```json
//! {
//!   "cycleStart": "2024-01-01",
//!   "averageCycleLength": 30,
//!   "ouraToken": "file:~/.config/oura/token",
//!   "alerts": { "hvrThreshold": 50, "tempThreshold": 0.3, "oysterProtocol": true },
//!   "email": { "service": "https://relay.example.com/send", "from": "...", "pass": "...", "to": "..." }
//! }
//! ```

use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dispatcher::MessageIdentity;
use crate::error::TrackerError;
use crate::provider::OURA_API_BASE_URL;
use crate::types::{AlertThresholds, CycleConfig, DEFAULT_CYCLE_LENGTH_DAYS};

/// Prefix marking a token that must be read from a local file
pub const FILE_TOKEN_PREFIX: &str = "file:";

/// Settings file as written by the user
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsFile {
    pub cycle_start: String,
    #[serde(default)]
    pub average_cycle_length: Option<u32>,
    pub oura_token: String,
    #[serde(default)]
    pub oura_base_url: Option<String>,
    pub alerts: AlertSettings,
    pub email: EmailSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSettings {
    #[serde(rename = "hvrThreshold", alias = "hrvThreshold")]
    pub hrv_threshold: f64,
    pub temp_threshold: f64,
    #[serde(default)]
    pub oyster_protocol: bool,
    #[serde(default)]
    pub strict_readings: bool,
}

/// Notification transport identity
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// HTTP(S) endpoint of the mail relay
    pub service: String,
    pub from: String,
    pub pass: String,
    pub to: String,
}

impl EmailSettings {
    pub fn identity(&self) -> MessageIdentity {
        MessageIdentity {
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }

    /// Relay endpoint, trimmed
    pub fn relay_url(&self) -> &str {
        self.service.trim()
    }

    fn validate(&self) -> Result<(), TrackerError> {
        let service = self.relay_url();
        if service.starts_with("http://") || service.starts_with("https://") {
            Ok(())
        } else {
            Err(TrackerError::Config(format!(
                "email.service '{}' must be an http(s) relay URL",
                self.service
            )))
        }
    }
}

/// Validated settings with the provider token resolved
#[derive(Debug, Clone)]
pub struct Settings {
    pub cycle: CycleConfig,
    pub email: EmailSettings,
    pub oura_token: String,
    pub oura_base_url: String,
}

impl Settings {
    /// Load, validate and resolve settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, TrackerError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            TrackerError::Config(format!("Cannot read settings {}: {e}", path.display()))
        })?;
        Self::from_json(&raw, &CredentialResolver::default())
    }

    /// Parse settings JSON, resolving the token with `resolver`
    pub fn from_json(json: &str, resolver: &CredentialResolver) -> Result<Self, TrackerError> {
        let file: SettingsFile = serde_json::from_str(json)?;
        Self::from_file(file, resolver)
    }

    pub fn from_file(file: SettingsFile, resolver: &CredentialResolver) -> Result<Self, TrackerError> {
        let cycle_start_date = NaiveDate::parse_from_str(file.cycle_start.trim(), "%Y-%m-%d")
            .map_err(|e| {
                TrackerError::DateParseError(format!("cycleStart '{}': {e}", file.cycle_start))
            })?;

        for (name, value) in [
            ("alerts.hvrThreshold", file.alerts.hrv_threshold),
            ("alerts.tempThreshold", file.alerts.temp_threshold),
        ] {
            if !value.is_finite() {
                return Err(TrackerError::Config(format!("{name} must be a finite number")));
            }
        }

        file.email.validate()?;

        let cycle = CycleConfig::new(
            cycle_start_date,
            file.average_cycle_length.unwrap_or(DEFAULT_CYCLE_LENGTH_DAYS),
            AlertThresholds {
                hrv_threshold: file.alerts.hrv_threshold,
                temp_threshold: file.alerts.temp_threshold,
                oyster_protocol_enabled: file.alerts.oyster_protocol,
                strict_readings: file.alerts.strict_readings,
            },
        )?;

        let oura_token = resolver.resolve(&file.oura_token)?;

        Ok(Self {
            cycle,
            email: file.email,
            oura_token,
            oura_base_url: file
                .oura_base_url
                .unwrap_or_else(|| OURA_API_BASE_URL.to_string()),
        })
    }
}

/// Resolves secrets given inline or as `file:<path>` references
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    home: Option<PathBuf>,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self {
            home: dirs::home_dir(),
        }
    }
}

impl CredentialResolver {
    /// Resolver expanding `~` to a specific directory
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: Some(home.into()),
        }
    }

    /// Return the secret, reading and trimming the file for `file:` references
    pub fn resolve(&self, raw: &str) -> Result<String, TrackerError> {
        let Some(reference) = raw.strip_prefix(FILE_TOKEN_PREFIX) else {
            return Ok(raw.to_string());
        };

        let path = self.expand_home(reference.trim())?;
        let secret = fs::read_to_string(&path).map_err(|e| {
            TrackerError::Credential(format!("Cannot read {}: {e}", path.display()))
        })?;

        let secret = secret.trim();
        if secret.is_empty() {
            return Err(TrackerError::Credential(format!(
                "{} is empty",
                path.display()
            )));
        }
        Ok(secret.to_string())
    }

    fn expand_home(&self, reference: &str) -> Result<PathBuf, TrackerError> {
        let Some(rest) = reference.strip_prefix('~') else {
            return Ok(PathBuf::from(reference));
        };
        let home = self.home.as_ref().ok_or_else(|| {
            TrackerError::Credential("Home directory is unknown, cannot expand '~'".to_string())
        })?;
        Ok(home.join(rest.trim_start_matches('/')))
    }
}
