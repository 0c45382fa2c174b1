// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Result log of executed commands.
//!
//! The log is append-only. Records are never mutated once appended, and the
//! only way to remove them is to reset the whole log. Callers own the log and
//! pass it by mutable reference into every batch run they want recorded.

use crate::shell::Command;

use chrono::{DateTime, Local};
use serde::Serialize;
use std::{fs, path::Path};
use tracing::{info, instrument};

/// Outcome of one executed command.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct ResultRecord {
    /// Local time the command finished at.
    pub time: DateTime<Local>,

    /// Executable, or connection call name.
    pub call: String,

    /// Positional arguments given to call.
    pub args: Vec<String>,

    /// Rendered command line.
    pub command: String,

    pub success: bool,

    /// Combined standard output and standard error, or error message of
    /// failed connection call.
    pub output: String,
}

impl ResultRecord {
    /// Construct record for command stamped with current local time.
    pub fn new(command: &Command, success: bool, output: impl Into<String>) -> Self {
        Self {
            time: Local::now(),
            call: command.call().into(),
            args: command.arguments().to_vec(),
            command: command.render(),
            success,
            output: output.into(),
        }
    }
}

/// Append-only listing of result records.
#[derive(Default, Debug, Clone)]
pub struct ResultLog {
    records: Vec<ResultRecord>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ResultRecord] {
        self.records.as_slice()
    }

    /// Records appended at or after given position.
    pub fn since(&self, position: usize) -> &[ResultRecord] {
        self.records.get(position..).unwrap_or_default()
    }

    /// Output of the most recent record.
    pub fn last_output(&self) -> Option<&str> {
        self.records.last().map(|record| record.output.as_str())
    }

    /// Count of failed records.
    pub fn failures(&self) -> usize {
        self.records.iter().filter(|record| !record.success).count()
    }

    /// Drop every record.
    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Export log as pretty JSON.
    ///
    /// Parent directories of the path are created when missing.
    ///
    /// # Errors
    ///
    /// - Return [`LogError::Serialize`] if serialization fails.
    /// - Return [`LogError::Io`] if file cannot be written.
    #[instrument(skip(self, path), level = "debug")]
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            mkdirp::mkdirp(parent)?;
        }

        let mut data = serde_json::to_string_pretty(&self.records)?;
        data.push('\n');
        fs::write(path, data)?;
        info!("write {} result record(s) to {:?}", self.len(), path.display());

        Ok(())
    }
}

/// Result log error types.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Records cannot be serialized into JSON.
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    /// File I/O fails.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Friendly result alias :3
pub type Result<T, E = LogError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_copies_command_shape() {
        let command = Command::new("echo").args(["hello", "world"]);
        let record = ResultRecord::new(&command, true, "hello world");
        assert_eq!(record.call, "echo");
        assert_eq!(record.args, vec!["hello", "world"]);
        assert_eq!(record.command, "echo hello world");
        assert!(record.success);
    }

    #[test]
    fn log_appends_and_resets() {
        let mut log = ResultLog::new();
        log.push(ResultRecord::new(&Command::new("true"), true, ""));
        log.push(ResultRecord::new(&Command::new("false"), false, "nope"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.failures(), 1);
        assert_eq!(log.last_output(), Some("nope"));
        assert_eq!(log.since(1).len(), 1);
        assert!(log.since(9).is_empty());

        log.reset();
        assert!(log.is_empty());
        assert_eq!(log.last_output(), None);
    }

    #[test]
    fn write_json_creates_parent_directories() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("results.json");

        let mut log = ResultLog::new();
        log.push(ResultRecord::new(&Command::new("echo").arg("hi"), true, "hi"));
        log.write_json(&path)?;

        let data: serde_json::Value = serde_json::from_str(fs::read_to_string(&path)?.as_str())?;
        assert_eq!(data[0]["command"], "echo hi");
        assert_eq!(data[0]["success"], true);
        assert_eq!(data[0]["args"], serde_json::json!(["hi"]));

        Ok(())
    }
}
