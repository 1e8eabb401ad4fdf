// file: src/models/entry.rs
// description: raw inquiry record and its lifecycle status

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

/// One raw inquiry, partitioned by the batch-job id (`file_id`) it arrived
/// under. Status starts at `pending` and is set exactly once by the flag
/// stage; it is never mutated again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub file_id: String,
    pub raw_input: String,
    pub status: EntryStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Success,
    Fail,
    EdgeCase,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Success => "success",
            EntryStatus::Fail => "fail",
            EntryStatus::EdgeCase => "edge_case",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(EntryStatus::Pending),
            "success" => Some(EntryStatus::Success),
            "fail" => Some(EntryStatus::Fail),
            "edge_case" => Some(EntryStatus::EdgeCase),
            _ => None,
        }
    }

    /// Terminal statuses are the only values the flag stage may assign.
    pub fn is_terminal(self) -> bool {
        self != EntryStatus::Pending
    }
}

/// Row shape for the flag stage commit: the terminal status for one entry
/// and, for edge cases, the classifier's review reason.
#[derive(Debug, Clone)]
pub struct FlagDecision {
    pub entry_id: i64,
    pub status: EntryStatus,
    pub reason: Option<String>,
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for EntryStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for EntryStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|s| EntryStatus::parse(s).ok_or(FromSqlError::InvalidType))
    }
}
