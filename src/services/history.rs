//! Run history
//!
//! Every pipeline run appends one record to `runs.jsonl`. The file is
//! line-delimited JSON: each line is a complete `RunRecord`.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NfeError, NfeResult};
use crate::models::{Money, ReferenceMonth};

use super::pipeline::RunSummary;

/// Final state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Everything succeeded
    Success,
    /// The run finished but some steps failed
    CompletedWithErrors,
    /// The run was aborted
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "SUCCESS"),
            RunStatus::CompletedWithErrors => write!(f, "COMPLETED WITH ERRORS"),
            RunStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// One line of the run history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Reference month as `YYYY-MM`
    pub month: String,
    pub status: RunStatus,
    pub selected: usize,
    pub copied: usize,
    pub rows: usize,
    pub grand_total: Money,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl RunRecord {
    /// Build the record of a finished run
    pub fn from_outcome(
        started_at: DateTime<Utc>,
        month: ReferenceMonth,
        outcome: &NfeResult<RunSummary>,
    ) -> Self {
        let month = format!("{:04}-{:02}", month.year(), month.month());
        let finished_at = Utc::now();

        match outcome {
            Ok(summary) => Self {
                id: Uuid::new_v4(),
                started_at,
                finished_at,
                month,
                status: summary.status(),
                selected: summary.selected,
                copied: summary.copied,
                rows: summary.rows,
                grand_total: summary.grand_total,
                errors: summary.errors.clone(),
            },
            Err(err) => Self {
                id: Uuid::new_v4(),
                started_at,
                finished_at,
                month,
                status: RunStatus::Failed,
                selected: 0,
                copied: 0,
                rows: 0,
                grand_total: Money::zero(),
                errors: vec![err.to_string()],
            },
        }
    }
}

/// Append-only store of run records
pub struct RunHistory {
    log_path: PathBuf,
}

impl RunHistory {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append a record, flushing immediately
    pub fn append(&self, record: &RunRecord) -> NfeResult<()> {
        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| NfeError::Io(format!("Failed to create history directory: {}", e)))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| NfeError::Io(format!("Failed to open run history: {}", e)))?;

        let json = serde_json::to_string(record)
            .map_err(|e| NfeError::Json(format!("Failed to serialize run record: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| NfeError::Io(format!("Failed to write run record: {}", e)))?;

        file.flush()
            .map_err(|e| NfeError::Io(format!("Failed to flush run history: {}", e)))?;

        Ok(())
    }

    /// All records, oldest first
    pub fn read_all(&self) -> NfeResult<Vec<RunRecord>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| NfeError::Io(format!("Failed to open run history: {}", e)))?;

        let mut records = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                NfeError::Io(format!("Failed to read run history line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let record: RunRecord = serde_json::from_str(&line).map_err(|e| {
                NfeError::Json(format!(
                    "Failed to parse run record at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            records.push(record);
        }

        Ok(records)
    }

    /// The most recent `count` records, oldest first
    pub fn read_recent(&self, count: usize) -> NfeResult<Vec<RunRecord>> {
        let all = self.read_all()?;
        let start = all.len().saturating_sub(count);
        Ok(all[start..].to_vec())
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn summary(errors: Vec<String>) -> RunSummary {
        RunSummary {
            selected: 3,
            copied: 3,
            rows: 7,
            invoices: 3,
            grand_total: Money::from_cents(45_000),
            errors,
            ..RunSummary::default()
        }
    }

    fn january() -> ReferenceMonth {
        ReferenceMonth::new(2024, 1).unwrap()
    }

    #[test]
    fn test_record_from_success() {
        let record = RunRecord::from_outcome(Utc::now(), january(), &Ok(summary(Vec::new())));
        assert_eq!(record.status, RunStatus::Success);
        assert_eq!(record.month, "2024-01");
        assert_eq!(record.rows, 7);
        assert_eq!(record.grand_total, Money::from_cents(45_000));
    }

    #[test]
    fn test_record_from_partial_failure() {
        let outcome = Ok(summary(vec!["copy failed".into()]));
        let record = RunRecord::from_outcome(Utc::now(), january(), &outcome);
        assert_eq!(record.status, RunStatus::CompletedWithErrors);
        assert_eq!(record.errors, vec!["copy failed".to_string()]);
    }

    #[test]
    fn test_record_from_error() {
        let outcome = Err(NfeError::Prerequisites(vec!["missing rclone".into()]));
        let record = RunRecord::from_outcome(Utc::now(), january(), &outcome);
        assert_eq!(record.status, RunStatus::Failed);
        assert_eq!(record.selected, 0);
        assert!(record.errors[0].contains("missing rclone"));
    }

    #[test]
    fn test_append_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let history = RunHistory::new(temp_dir.path().join("runs.jsonl"));
        assert!(history.read_all().unwrap().is_empty());

        for _ in 0..3 {
            let record = RunRecord::from_outcome(Utc::now(), january(), &Ok(summary(Vec::new())));
            history.append(&record).unwrap();
        }

        let all = history.read_all().unwrap();
        assert_eq!(all.len(), 3);

        let recent = history.read_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].id, all[2].id);
    }

    #[test]
    fn test_corrupt_line_is_json_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("runs.jsonl");
        std::fs::write(&path, "{not json}\n").unwrap();

        let err = RunHistory::new(path).read_all().unwrap_err();
        assert!(matches!(err, NfeError::Json(_)));
    }
}
