//! Structured logging for the TES batch service
//!
//! Provides context-rich logging with station/table identifiers,
//! timestamps, and severity levels. Supports both console output
//! and file-based logging for long batch runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::TesError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
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

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Which part of the pipeline emitted a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Config,
    Archive,
    Engine,
    Sink,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Config => write!(f, "CFG"),
            Component::Archive => write!(f, "ARCH"),
            Component::Engine => write!(f, "ENG"),
            Component::Sink => write!(f, "OUT"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - a station has gaps in its measurement record
    Expected,
    /// Unexpected failure - corrupt file or I/O problem in the archive
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, component: &Component, context: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let context_part = context.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, component, context_part, message)
    }

    /// Log a message with the global logger
    fn log(&self, level: LogLevel, component: &Component, context: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, component, context, message);
        let context_part = context.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, context_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, context_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG]{} {}", context_part, message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, context: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &component, context, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, context: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, context, message);
}

/// Log a warning message
pub fn warn(component: Component, context: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, context, message);
}

/// Log an error message
pub fn error(component: Component, context: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, context, message);
}

/// Log a debug message
pub fn debug(component: Component, context: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, context, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify an archive read failure.
///
/// Missing per-date files are routine in a multi-year station record; short
/// or unparseable files point at a damaged archive.
pub fn classify_archive_failure(err: &TesError) -> FailureType {
    match err {
        TesError::MissingData { .. } => FailureType::Expected,
        TesError::Parse { .. } | TesError::ShortSeries { .. } | TesError::Io { .. } => {
            FailureType::Unexpected
        }
        TesError::InvalidDate(_) => FailureType::Unexpected,
        _ => FailureType::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log an archive failure with automatic classification
pub fn log_archive_failure(station: &str, operation: &str, err: &TesError) {
    let failure_type = classify_archive_failure(err);

    let message = format!(
        "{} failed [{}]: {}",
        operation,
        failure_type,
        err
    );

    match failure_type {
        FailureType::Expected => warn(Component::Archive, Some(station), &message),
        FailureType::Unexpected => error(Component::Archive, Some(station), &message),
        FailureType::Unknown => warn(Component::Archive, Some(station), &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a finished run
pub fn log_run_summary(tables_written: usize, station_days: usize, skipped: usize) {
    let message = format!(
        "Run complete: {} tables from {} station-days, {} skipped",
        tables_written,
        station_days,
        skipped
    );

    if skipped == 0 {
        info(Component::System, None, &message);
    } else if station_days == 0 {
        error(Component::System, None, &message);
    } else {
        warn(Component::System, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_failure_classification() {
        let missing = TesError::MissingData { path: PathBuf::from("170101UVAmo.txt") };
        assert_eq!(classify_archive_failure(&missing), FailureType::Expected);

        let short = TesError::ShortSeries {
            path: PathBuf::from("170101UVAmo.txt"),
            expected: 780,
            found: 12,
        };
        assert_eq!(classify_archive_failure(&short), FailureType::Unexpected);

        let config = TesError::Configuration("bad".to_string());
        assert_eq!(classify_archive_failure(&config), FailureType::Unknown);
    }

    #[test]
    fn test_entry_format_includes_component_and_context() {
        let entry = Logger::format_entry(LogLevel::Warning, &Component::Archive, Some("2017/CCA"), "gap");
        assert!(entry.contains("WARN ARCH [2017/CCA]: gap"), "got '{}'", entry);
    }
}
