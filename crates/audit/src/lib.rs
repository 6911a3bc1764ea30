//! Append-only audit log.
//!
//! Each entry is one line, `[YYYY-MM-DD HH:MM:SS] message`. Processed files
//! are logged with a trailing `...[O]` (converted) or `...[X]` (rejected)
//! marker. Entries are never rewritten; readers skip lines they cannot parse.

mod range;

pub use range::DateRange;

use chrono::{Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const CONVERTED_MARK: &str = "...[O]";
pub const REJECTED_MARK: &str = "...[X]";

static LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(?<time>.*?)\]\s(?<msg>.*)$").unwrap());

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit log {} unavailable: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub message: String,
}

impl LogEntry {
    pub fn to_line(&self) -> String {
        format!("[{}] {}", self.timestamp.format(TIMESTAMP_FORMAT), self.message)
    }

    /// Parses a log line; `None` when it has no readable leading timestamp.
    pub fn parse_line(line: &str) -> Option<LogEntry> {
        let caps = LINE.captures(line)?;
        let timestamp = NaiveDateTime::parse_from_str(&caps["time"], TIMESTAMP_FORMAT).ok()?;
        Some(LogEntry {
            timestamp,
            message: caps["msg"].to_string(),
        })
    }

    /// File name of a converted-file entry, reduced to its last path
    /// component.
    pub fn converted_file(&self) -> Option<&str> {
        let subject = self.message.trim_end().strip_suffix(CONVERTED_MARK)?.trim();
        Path::new(subject).file_name()?.to_str()
    }
}

/// Message for a file whose pages were blanked.
pub fn converted(file_name: &str) -> String {
    format!("{}{}", file_name, CONVERTED_MARK)
}

/// Message for a file left untouched because a page differed.
pub fn rejected(file_name: &str) -> String {
    format!("{}{}", file_name, REJECTED_MARK)
}

/// Result of a date-range query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Matching lines, newline-terminated, in file order.
    pub text: String,
    /// Distinct converted file names among the matching lines.
    pub converted_files: usize,
}

/// Single-writer audit log. Appends are serialized; every appended entry is
/// also sent to subscribers.
pub struct AuditLog {
    path: PathBuf,
    writer: Mutex<File>,
    subscribers: Mutex<Vec<Sender<LogEntry>>>,
}

impl AuditLog {
    /// Opens the log for appending, creating it and its directory if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let io_error = |source| AuditError::Io {
            path: path.clone(),
            source,
        };

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_error)?;

        Ok(Self {
            path,
            writer: Mutex::new(file),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Receives every entry appended after this call.
    pub fn subscribe(&self) -> Receiver<LogEntry> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    /// Appends `message` stamped with the current local time.
    pub fn append(&self, message: impl Into<String>) -> Result<LogEntry> {
        self.append_at(Local::now().naive_local(), message)
    }

    /// Appends `message` with an explicit timestamp.
    pub fn append_at(
        &self,
        timestamp: NaiveDateTime,
        message: impl Into<String>,
    ) -> Result<LogEntry> {
        let entry = LogEntry {
            timestamp,
            message: message.into(),
        };

        {
            let mut file = self.writer.lock().unwrap_or_else(|e| e.into_inner());
            writeln!(file, "{}", entry.to_line())
                .and_then(|_| file.flush())
                .map_err(|source| AuditError::Io {
                    path: self.path.clone(),
                    source,
                })?;

            let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
            subscribers.retain(|tx| tx.send(entry.clone()).is_ok());
        }

        log::debug!("[Audit] {}", entry.message);
        Ok(entry)
    }

    /// Lines whose timestamp lies in `range` (inclusive), plus the number of
    /// distinct files converted among them. A missing log reads as empty.
    pub fn query(&self, range: &DateRange) -> Result<LogQuery> {
        query_file(&self.path, range)
    }
}

/// [`AuditLog::query`] over any log file.
pub fn query_file(path: &Path, range: &DateRange) -> Result<LogQuery> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(LogQuery::default()),
        Err(source) => {
            return Err(AuditError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut result = LogQuery::default();
    if range.is_empty() {
        return Ok(result);
    }

    let mut converted = HashSet::new();
    for raw in BufReader::new(file).split(b'\n') {
        let raw = raw.map_err(|source| AuditError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // Invalid UTF-8 is replaced, not an error.
        let decoded = String::from_utf8_lossy(&raw);
        let line = decoded.strip_suffix('\r').unwrap_or(&*decoded);
        let Some(entry) = LogEntry::parse_line(line) else {
            continue;
        };
        if !range.contains(entry.timestamp) {
            continue;
        }

        result.text.push_str(line);
        result.text.push('\n');
        if let Some(name) = entry.converted_file() {
            converted.insert(name.to_string());
        }
    }

    result.converted_files = converted.len();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_line_round_trip() {
        let entry = LogEntry {
            timestamp: at(5, 9),
            message: converted("invoice_0001.pdf"),
        };
        assert_eq!(entry.to_line(), "[2024-03-05 09:00:00] invoice_0001.pdf...[O]");
        assert_eq!(LogEntry::parse_line(&entry.to_line()), Some(entry));
    }

    #[test]
    fn test_parse_line_rejects_non_conforming() {
        assert!(LogEntry::parse_line("no timestamp here").is_none());
        assert!(LogEntry::parse_line("[yesterday] something").is_none());
        assert!(LogEntry::parse_line("[2024-03-05 09:00:00]no space").is_none());
    }

    #[test]
    fn test_converted_file_uses_last_component() {
        let entry = LogEntry {
            timestamp: at(1, 0),
            message: "dir/sub/a.pdf...[O]".to_string(),
        };
        assert_eq!(entry.converted_file(), Some("a.pdf"));

        let rejected = LogEntry {
            timestamp: at(1, 0),
            message: rejected("a.pdf"),
        };
        assert_eq!(rejected.converted_file(), None);
    }

    #[test]
    fn test_query_filters_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("logs").join("audit.log")).unwrap();

        log.append_at(at(1, 8), "found 3 files").unwrap();
        log.append_at(at(2, 8), converted("a.pdf")).unwrap();
        log.append_at(at(2, 9), rejected("b.pdf")).unwrap();
        log.append_at(at(3, 8), converted("a.pdf")).unwrap();
        log.append_at(at(3, 9), converted("c.pdf")).unwrap();
        log.append_at(at(9, 9), converted("d.pdf")).unwrap();

        let range = DateRange::new(at(2, 0), at(3, 23));
        let result = log.query(&range).unwrap();
        assert_eq!(result.text.lines().count(), 4);
        assert_eq!(result.converted_files, 2);
        assert!(result.text.starts_with("[2024-03-02 08:00:00] a.pdf...[O]\n"));
    }

    #[test]
    fn test_query_skips_garbage_and_bounds_are_inclusive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        fs::write(
            &path,
            "[2024-03-02 08:00:00] a.pdf...[O]\ngarbage line\n[bad] b.pdf...[O]\n",
        )
        .unwrap();

        let exact = DateRange::new(at(2, 8), at(2, 8));
        let result = query_file(&path, &exact).unwrap();
        assert_eq!(result.text, "[2024-03-02 08:00:00] a.pdf...[O]\n");
        assert_eq!(result.converted_files, 1);
    }

    #[test]
    fn test_non_utf8_line_does_not_fail_query() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let mut raw = b"[2024-03-02 08:00:00] a.pdf...[O]\n".to_vec();
        raw.extend_from_slice(b"\xff\xfe legacy junk\n");
        raw.extend_from_slice(b"[2024-03-02 09:00:00] b.pdf...[O]\r\n");
        fs::write(&path, raw).unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let result = query_file(&path, &DateRange::day(day)).unwrap();
        assert_eq!(result.converted_files, 2);
        assert_eq!(
            result.text,
            "[2024-03-02 08:00:00] a.pdf...[O]\n[2024-03-02 09:00:00] b.pdf...[O]\n"
        );
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("audit.log")).unwrap();
        log.append_at(at(2, 8), converted("a.pdf")).unwrap();

        let result = log.query(&DateRange::new(at(3, 0), at(1, 0))).unwrap();
        assert_eq!(result, LogQuery::default());
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let range = DateRange::new(at(1, 0), at(2, 0));
        let result = query_file(&dir.path().join("nope.log"), &range).unwrap();
        assert_eq!(result, LogQuery::default());
    }

    #[test]
    fn test_subscribers_see_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("audit.log")).unwrap();
        let rx = log.subscribe();

        log.append_at(at(1, 1), "first").unwrap();
        log.append_at(at(1, 2), "second").unwrap();

        let received: Vec<String> = rx.try_iter().map(|e| e.message).collect();
        assert_eq!(received, vec!["first", "second"]);

        drop(rx);
        log.append_at(at(1, 3), "third").unwrap();
        assert!(log.subscribers.lock().unwrap().is_empty());
    }
}
