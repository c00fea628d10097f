//! Cycle CLI - Command-line interface for Cycle Flux
//!
//! Commands:
//! - check: fetch today's readiness reading, classify it, send any alert
//! - lh: record a manual LH test result
//! - confirm: check for the post-surge temperature rise
//! - status: show the cycle day and expected ovulation window
//! - doctor: diagnose settings and environment

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cycle_flux::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use cycle_flux::types::{Action, Confirmation, DailyReport, LhTestResult, WindowStatus};
use cycle_flux::{
    CycleTracker, LogTransport, NotificationPort, OuraClient, RelayTransport, Settings,
    TrackerError, FLUX_VERSION, PRODUCER_NAME,
};

/// Cycle - cycle-aware readiness alerts
#[derive(Parser)]
#[command(name = "cycle")]
#[command(version = FLUX_VERSION)]
#[command(about = "Classify daily readiness readings against the ovulation window", long_about = None)]
struct Cli {
    /// Settings file
    #[arg(short, long, global = true, default_value = "config.json")]
    config: PathBuf,

    /// Log alerts instead of delivering them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Log format
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch today's reading, classify it and send any alert
    Check,

    /// Record a manual LH test result
    Lh {
        /// Test result: positive or negative
        result: String,
    },

    /// Check whether the temperature rise confirms ovulation
    Confirm,

    /// Show the cycle day and expected ovulation window
    Status,

    /// Diagnose settings and environment
    Doctor,
}

type Tracker = CycleTracker<OuraClient, Box<dyn NotificationPort>>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: cli.log_level,
        format: cli.log_format,
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CycleCliError> {
    match cli.command {
        Commands::Doctor => cmd_doctor(&cli.config, cli.json),
        Commands::Check => {
            let tracker = build_tracker(&cli.config, cli.dry_run)?;
            let report = tracker.daily_check().await?;
            print_report(&report, cli.json)
        }
        Commands::Lh { result } => {
            let result: LhTestResult = result.parse()?;
            let tracker = build_tracker(&cli.config, cli.dry_run)?;
            let action = tracker.record_lh_test(result).await?;
            print_action(&action, cli.json)
        }
        Commands::Confirm => {
            let tracker = build_tracker(&cli.config, cli.dry_run)?;
            let confirmation = tracker.confirm_ovulation().await?;
            print_confirmation(&confirmation, cli.json)
        }
        Commands::Status => {
            let tracker = build_tracker(&cli.config, cli.dry_run)?;
            print_status(&tracker.window_status(), cli.json)
        }
    }
}

fn build_tracker(config: &Path, dry_run: bool) -> Result<Tracker, CycleCliError> {
    let settings = Settings::load(config)?;
    let provider = OuraClient::with_base_url(&settings.oura_token, &settings.oura_base_url);

    let transport: Box<dyn NotificationPort> = if dry_run {
        Box::new(LogTransport)
    } else {
        Box::new(RelayTransport::new(
            settings.email.relay_url(),
            &settings.email.from,
            &settings.email.pass,
        ))
    };
    tracing::debug!("Using '{}' notification transport", transport.name());

    let identity = settings.email.identity();
    Ok(CycleTracker::new(settings.cycle, provider, transport, identity))
}

fn print_report(report: &DailyReport, json: bool) -> Result<(), CycleCliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Day {}: {}", report.cycle_day, report.state.as_str());
    if let (Some(hrv), Some(temp)) = (report.hrv_balance, report.temperature_deviation) {
        println!("  HRV balance:           {hrv}");
        println!("  Temperature deviation: {temp:.2}°C");
    }
    if let Some(recommendation) = &report.recommendation {
        println!("  Recommendation:        {recommendation}");
    }
    if let Some(id) = report.alert_id {
        println!("  Alert sent:            {id}");
    }
    Ok(())
}

fn print_action(action: &Action, json: bool) -> Result<(), CycleCliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(action)?);
        return Ok(());
    }

    match action {
        Action::OvulationAlert(alert) => {
            println!("LH surge recorded on Day {}", alert.cycle_day);
            println!("  Expected ovulation: {}", alert.expected_ovulation);
            println!("  Fertility window:   {}", alert.fertility_window);
            println!("  Action:             {}", alert.action);
        }
        Action::ContinueMonitoring { cycle_day } => {
            println!("LH negative on Day {cycle_day} - continue monitoring");
        }
    }
    Ok(())
}

fn print_confirmation(confirmation: &Confirmation, json: bool) -> Result<(), CycleCliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(confirmation)?);
        return Ok(());
    }

    match confirmation {
        Confirmation::InsufficientData { available } => {
            println!("Cannot confirm yet: {available} of 2 readings available");
        }
        Confirmation::Evaluated(result) if result.confirmed => println!(
            "Ovulation confirmed: average temperature deviation {:.2}°C",
            result.average_temperature_deviation
        ),
        Confirmation::Evaluated(result) => println!(
            "No temperature spike yet: average deviation {:.2}°C",
            result.average_temperature_deviation
        ),
    }
    Ok(())
}

fn print_status(status: &WindowStatus, json: bool) -> Result<(), CycleCliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
        return Ok(());
    }

    println!("Cycle day:        {}", status.cycle_day);
    println!(
        "Ovulation window: day {} to day {}",
        status.window.min_day, status.window.max_day
    );
    if status.in_window {
        println!("Today is inside the expected window");
    } else if status.days_until_window > 0 {
        println!("Window opens in {} day(s)", status.days_until_window);
    } else {
        println!("Expected window has passed");
    }
    Ok(())
}

fn cmd_doctor(config: &Path, json: bool) -> Result<(), CycleCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, FLUX_VERSION),
    });

    match Settings::load(config) {
        Ok(settings) => {
            checks.push(DoctorCheck {
                name: "settings".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Loaded {} (cycle start {}, length {} days)",
                    config.display(),
                    settings.cycle.cycle_start_date,
                    settings.cycle.average_cycle_length_days()
                ),
            });

            checks.push(if settings.oura_token.trim().is_empty() {
                DoctorCheck {
                    name: "oura_token".to_string(),
                    status: CheckStatus::Error,
                    message: "Oura token is empty".to_string(),
                }
            } else {
                DoctorCheck {
                    name: "oura_token".to_string(),
                    status: CheckStatus::Ok,
                    message: "Oura token resolved".to_string(),
                }
            });

            checks.push(DoctorCheck {
                name: "transport".to_string(),
                status: CheckStatus::Ok,
                message: format!("Alerts delivered via relay {}", settings.email.relay_url()),
            });

            if !settings.cycle.alert_thresholds.oyster_protocol_enabled {
                checks.push(DoctorCheck {
                    name: "oyster_protocol".to_string(),
                    status: CheckStatus::Warning,
                    message: "Oyster protocol disabled; illness readings will not alert"
                        .to_string(),
                });
            }
        }
        Err(e) => checks.push(DoctorCheck {
            name: "settings".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        }),
    }

    checks.push(if atty::is(atty::Stream::Stdout) {
        DoctorCheck {
            name: "stdout".to_string(),
            status: CheckStatus::Ok,
            message: "stdout is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdout".to_string(),
            status: CheckStatus::Ok,
            message: "stdout is piped (consider --log-format json for cron)".to_string(),
        }
    });

    let has_errors = checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: FLUX_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Cycle Doctor Report");
        println!("===================");
        for check in &report.checks {
            let icon = match check.status {
                CheckStatus::Ok => "✓",
                CheckStatus::Warning => "⚠",
                CheckStatus::Error => "✗",
            };
            println!("{} {}: {}", icon, check.name, check.message);
        }
    }

    if has_errors {
        Err(CycleCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum CycleCliError {
    Tracker(TrackerError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<TrackerError> for CycleCliError {
    fn from(e: TrackerError) -> Self {
        CycleCliError::Tracker(e)
    }
}

impl From<serde_json::Error> for CycleCliError {
    fn from(e: serde_json::Error) -> Self {
        CycleCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CycleCliError> for CliError {
    fn from(e: CycleCliError) -> Self {
        match e {
            CycleCliError::Tracker(e) => {
                let (code, hint) = match &e {
                    TrackerError::ProviderFailure(_) => {
                        ("PROVIDER_FAILURE", "Check the Oura token and network access")
                    }
                    TrackerError::TransportFailure(_) => {
                        ("TRANSPORT_FAILURE", "Check email.service and sender credentials")
                    }
                    TrackerError::Config(_) | TrackerError::DateParseError(_) => {
                        ("CONFIG_ERROR", "Run 'cycle doctor' for details")
                    }
                    TrackerError::Credential(_) => {
                        ("CREDENTIAL_ERROR", "Check the file: path in ouraToken")
                    }
                    TrackerError::JsonError(_) => ("JSON_ERROR", "Check settings JSON syntax"),
                    TrackerError::InvalidLhResult(_) => {
                        ("INVALID_ARGUMENT", "Use 'positive' or 'negative'")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            CycleCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            CycleCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
