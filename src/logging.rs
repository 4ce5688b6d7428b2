/// Structured logging for the reservoir data mirror
///
/// Provides context-rich logging with pipeline component and lane (source)
/// identifiers, timestamps, and severity levels. Records go through the
/// `log` facade; `init_logger` installs an `env_logger` backend writing to
/// the console or to an append-only log file for scheduled runs.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;

use chrono::Utc;
use serde::Deserialize;

use crate::error::{FailureType, MirrorError};

/// Environment variable overriding the configured filter (`env_logger`
/// syntax, e.g. `MIRROR_LOG=debug`).
pub const LOG_ENV: &str = "MIRROR_LOG";

const TARGET: &str = "twr_mirror";

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Fetcher,
    Decoder,
    Validator,
    Mapper,
    Publisher,
    Orchestrator,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Fetcher => write!(f, "FETCH"),
            Component::Decoder => write!(f, "DECODE"),
            Component::Validator => write!(f, "VALIDATE"),
            Component::Mapper => write!(f, "MAP"),
            Component::Publisher => write!(f, "PUBLISH"),
            Component::Orchestrator => write!(f, "RUN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// `[logging]` section of the mirror configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level to emit.
    pub level: LogLevel,
    /// Append log lines to this file instead of stderr.
    pub file: Option<String>,
    /// Prefix console lines with a UTC timestamp and level.
    pub timestamps: bool,
}

/// Install the global logger. Fails if the log file cannot be opened or a
/// logger is already installed.
pub fn init_logger(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(config.level.into()).parse_env(LOG_ENV);

    // File output always carries timestamps; there is nobody watching it live.
    let timestamps = config.timestamps || config.file.is_some();
    builder.format(move |buf, record| {
        if timestamps {
            writeln!(
                buf,
                "{} {} {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
                record.level(),
                record.args()
            )
        } else {
            writeln!(buf, "   {}", record.args())
        }
    });

    if let Some(path) = &config.file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

fn format_entry(component: Component, lane: Option<&str>, message: &str) -> String {
    let lane_part = lane.map(|l| format!(" [{}]", l)).unwrap_or_default();
    format!("{}{}: {}", component, lane_part, message)
}

pub fn info(component: Component, lane: Option<&str>, message: &str) {
    log::info!(target: TARGET, "{}", format_entry(component, lane, message));
}

pub fn warn(component: Component, lane: Option<&str>, message: &str) {
    log::warn!(target: TARGET, "{}", format_entry(component, lane, message));
}

pub fn error(component: Component, lane: Option<&str>, message: &str) {
    log::error!(target: TARGET, "{}", format_entry(component, lane, message));
}

pub fn debug(component: Component, lane: Option<&str>, message: &str) {
    log::debug!(target: TARGET, "{}", format_entry(component, lane, message));
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// The component an error originates from.
pub fn component_of(err: &MirrorError) -> Component {
    match err {
        MirrorError::Transport { .. } => Component::Fetcher,
        MirrorError::Decode(_) => Component::Decoder,
        MirrorError::Validation(_) => Component::Validator,
        MirrorError::Serialize { .. } => Component::Mapper,
        MirrorError::Publish { .. } => Component::Publisher,
    }
}

/// Log a lane failure with its classification.
///
/// Shape changes are errors: someone has to update the schema. Transport
/// and sink failures are warnings; the next scheduled run usually clears
/// them.
pub fn log_lane_failure(err: &MirrorError) {
    let failure_type = err.failure_type();
    let message = format!("lane failed [{}]: {}", failure_type, err);
    let lane = Some(err.source_name());

    match failure_type {
        FailureType::SourceChanged => error(component_of(err), lane, &message),
        FailureType::Transport | FailureType::Sink => warn(component_of(err), lane, &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Lane counts for a finished run. Logged at debug level; the single
/// terminal line belongs to the orchestrator.
pub fn log_run_summary(total: usize, successful: usize, failed: usize) {
    debug(
        Component::Orchestrator,
        None,
        &format!("Run complete: {}/{} lanes mirrored, {} failed", successful, total, failed),
    );
}
