//! The recording session: at most one dataset file open at a time.
//!
//! While open, the session owns the file, the column schema fixed by the
//! `record` command, and the start time rows are measured from. All three
//! live in [`ActiveSession`], so none of them can be read while closed.
//!
//! File format, one file per session:
//!
//! ```text
//! time x y
//! 0.005 1 2
//! 0.01 3 4
//! ```
//!
//! Every line, header included, ends with a space before the newline.

use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::clock::Timestamp;
use crate::error::SessionError;

/// Name of the dataset file for a session opened at `local`.
pub fn dataset_file_name(local: &DateTime<Local>) -> String {
    format!("Dataset_{}.txt", local.format("%Y_%m_%d_%H_%M_%S"))
}

/// `time c_1 ... c_n ` plus newline.
pub fn header_line(columns: &[String]) -> String {
    let mut line = String::from("time ");
    for column in columns {
        line.push_str(column);
        line.push(' ');
    }
    line.push('\n');
    line
}

/// `<elapsed> v_1 ... v_n ` plus newline.
pub fn row_line(elapsed: f64, values: &[f64]) -> String {
    let mut line = elapsed.to_string();
    line.push(' ');
    for value in values {
        line.push_str(&value.to_string());
        line.push(' ');
    }
    line.push('\n');
    line
}

struct ActiveSession {
    path: PathBuf,
    columns: Vec<String>,
    started: Timestamp,
    // Line buffered: every row is handed to the OS as soon as it is complete.
    writer: LineWriter<File>,
    rows: u64,
}

/// Summary of a session that was just closed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSession {
    pub path: PathBuf,
    pub rows: u64,
}

pub struct RecordingSession {
    output_dir: PathBuf,
    active: Option<ActiveSession>,
}

impl RecordingSession {
    /// A closed session that will create its files in `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            active: None,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.path.as_path())
    }

    pub fn columns(&self) -> Option<&[String]> {
        self.active.as_ref().map(|a| a.columns.as_slice())
    }

    pub fn expected_columns(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.columns.len())
    }

    pub fn rows_written(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.rows)
    }

    /// Start a session: create the dataset file and write its header.
    ///
    /// An existing file with the same name (same second) is truncated.
    pub fn open(&mut self, columns: Vec<String>, start: Timestamp) -> Result<&Path, SessionError> {
        if let Some(active) = &self.active {
            return Err(SessionError::AlreadyOpen {
                path: active.path.clone(),
            });
        }

        let path = self.output_dir.join(dataset_file_name(&start.local));
        let file = File::create(&path).map_err(|e| SessionError::io(&path, e))?;
        let mut writer = LineWriter::new(file);
        writer
            .write_all(header_line(&columns).as_bytes())
            .map_err(|e| SessionError::io(&path, e))?;

        let active = self.active.insert(ActiveSession {
            path,
            columns,
            started: start,
            writer,
            rows: 0,
        });
        Ok(active.path.as_path())
    }

    /// End the session, flushing and releasing the file.
    ///
    /// The session is closed even when the final flush fails.
    pub fn close(&mut self) -> Result<ClosedSession, SessionError> {
        let mut active = self.active.take().ok_or(SessionError::NotOpen)?;
        active
            .writer
            .flush()
            .map_err(|e| SessionError::io(&active.path, e))?;

        Ok(ClosedSession {
            path: active.path,
            rows: active.rows,
        })
    }

    /// Append one row stamped with `now`. Returns the elapsed seconds written.
    pub fn append_row(&mut self, values: &[f64], now: Timestamp) -> Result<f64, SessionError> {
        let active = self.active.as_mut().ok_or(SessionError::NotOpen)?;
        if values.len() != active.columns.len() {
            return Err(SessionError::ColumnMismatch {
                expected: active.columns.len(),
                actual: values.len(),
            });
        }

        let elapsed = now.seconds_since(&active.started);
        active
            .writer
            .write_all(row_line(elapsed, values).as_bytes())
            .map_err(|e| SessionError::io(&active.path, e))?;
        active.rows += 1;

        Ok(elapsed)
    }

    /// Close whatever is open. A closed session is left alone.
    pub fn shutdown(&mut self) {
        if !self.is_open() {
            return;
        }

        match self.close() {
            Ok(closed) => info!(
                "closed {} on shutdown after {} rows",
                closed.path.display(),
                closed.rows
            ),
            Err(e) => error!("failed to finalize dataset on shutdown: {}", e),
        }
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
