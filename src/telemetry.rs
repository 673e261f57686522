//! Local rejection telemetry
//!
//! When enabled, every rejected verification is appended to a JSONL file so
//! moderators can see which checks trip submitters up most. Only failure
//! categories and messages are recorded, never image data.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::verify::ValidationFailure;

/// One line of the telemetry log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// UTC time, `YYYY-MM-DDTHH:MM:SSZ`
    pub timestamp: String,
    /// Subcommand that ran (`sprite`, `portrait`, `recolor`...)
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Failure kind, e.g. `palette_overflow`
    pub error_type: String,
    pub context: String,
    /// Acknowledgement flag that would let the submission through
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ErrorEntry {
    pub fn new(command: impl Into<String>, error_type: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            timestamp: utc_timestamp(SystemTime::now()),
            command: command.into(),
            file: None,
            error_type: error_type.into(),
            context: context.into(),
            suggestion: None,
        }
    }

    /// Entry for a rejected submission.
    pub fn from_failure(command: &str, failure: &ValidationFailure) -> Self {
        let mut entry = Self::new(command, failure.kind.as_str(), failure.message.clone());
        entry.suggestion = failure.kind.escape_flag().map(str::to_string);
        entry
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Seconds since the epoch as an ISO 8601 UTC string.
fn utc_timestamp(now: SystemTime) -> String {
    let secs = now.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    let (year, month, day) = civil_date((secs / 86_400) as i64);
    let rem = secs % 86_400;
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        rem / 3600,
        rem % 3600 / 60,
        rem % 60
    )
}

/// Proleptic Gregorian date of a day count since 1970-01-01.
fn civil_date(days: i64) -> (i64, u32, u32) {
    // Shift to an era starting 0000-03-01 so leap days fall at year end.
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Appends entries to a JSONL file when enabled.
#[derive(Debug, Clone)]
pub struct ErrorCollector {
    path: PathBuf,
    enabled: bool,
}

impl ErrorCollector {
    pub fn new(path: impl AsRef<Path>, enabled: bool) -> Self {
        Self { path: path.as_ref().to_path_buf(), enabled }
    }

    pub fn log(&self, entry: &ErrorEntry) -> std::io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        let json = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        writeln!(writer, "{}", json)?;
        writer.flush()
    }
}

thread_local! {
    static COLLECTOR: RefCell<Option<ErrorCollector>> = const { RefCell::new(None) };
}

/// Install the process-wide collector.
pub fn init_collector(path: impl AsRef<Path>, enabled: bool) {
    COLLECTOR.with(|c| *c.borrow_mut() = Some(ErrorCollector::new(path, enabled)));
}

/// Record an entry with the installed collector, if any.
pub fn log_error(entry: &ErrorEntry) {
    COLLECTOR.with(|c| {
        if let Some(collector) = c.borrow().as_ref() {
            if let Err(e) = collector.log(entry) {
                log::warn!("could not write telemetry: {}", e);
            }
        }
    });
}

/// Record a rejected submission.
pub fn record_failure(command: &str, file: Option<&Path>, failure: &ValidationFailure) {
    let mut entry = ErrorEntry::from_failure(command, failure);
    if let Some(file) = file {
        entry = entry.with_file(file.display().to_string());
    }
    log_error(&entry);
}
