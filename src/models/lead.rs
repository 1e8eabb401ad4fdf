// file: src/models/lead.rs
// description: structured lead record, closed classification enums, stage mutation rows

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

/// Structured classification of one success-flagged entry. Created by the
/// qualify stage with the nine extracted fields; `assigned_priority` is set
/// by the prioritize stage and the three audit fields by the audit stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub file_id: String,
    pub entry_id: i64,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub business_model: Option<BusinessModel>,
    pub budget: Option<String>,
    pub revenue: Option<String>,
    pub growth_goal: Option<String>,
    pub urgency: Option<Priority>,
    pub lead_sentiment: Option<Sentiment>,
    pub additional_notes: Option<String>,
    pub assigned_priority: Option<Priority>,
    pub audit_priority: Option<Priority>,
    pub audit_notes: Option<String>,
    pub audit_accuracy: Option<f64>,
}

/// Row shape for the qualify stage commit: one per success entry, audit and
/// priority columns still unset.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub file_id: String,
    pub entry_id: i64,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub business_model: Option<BusinessModel>,
    pub budget: Option<String>,
    pub revenue: Option<String>,
    pub growth_goal: Option<String>,
    pub urgency: Option<Priority>,
    pub lead_sentiment: Option<Sentiment>,
    pub additional_notes: Option<String>,
}

/// Row shape for the audit stage commit.
#[derive(Debug, Clone)]
pub struct AuditVerdict {
    pub lead_id: i64,
    pub priority: Priority,
    pub notes: Option<String>,
    pub accuracy: f64,
}

/// Ordinal priority label. Semantically Urgent > High > Medium > Low; the
/// ordering used for export is `rank()`, not the label text (a lexicographic
/// sort would place "High" below "Low").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const VALUES: [&'static str; 4] = ["Urgent", "High", "Medium", "Low"];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Urgent" => Some(Priority::Urgent),
            "High" => Some(Priority::High),
            "Medium" => Some(Priority::Medium),
            "Low" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Explicit urgency rank used for descending export order.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Urgent => 3,
            Priority::High => 2,
            Priority::Medium => 1,
            Priority::Low => 0,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interest level extracted by the qualify stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Hot,
    Neutral,
    Cold,
}

impl Sentiment {
    pub const VALUES: [&'static str; 3] = ["Hot", "Neutral", "Cold"];

    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Hot => "Hot",
            Sentiment::Neutral => "Neutral",
            Sentiment::Cold => "Cold",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Hot" => Some(Sentiment::Hot),
            "Neutral" => Some(Sentiment::Neutral),
            "Cold" => Some(Sentiment::Cold),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum BusinessModel {
    B2B,
    B2C,
    DTC,
    Unknown,
}

impl BusinessModel {
    pub const VALUES: [&'static str; 4] = ["B2B", "B2C", "DTC", "Unknown"];

    pub fn as_str(self) -> &'static str {
        match self {
            BusinessModel::B2B => "B2B",
            BusinessModel::B2C => "B2C",
            BusinessModel::DTC => "DTC",
            BusinessModel::Unknown => "Unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "B2B" => Some(BusinessModel::B2B),
            "B2C" => Some(BusinessModel::B2C),
            "DTC" => Some(BusinessModel::DTC),
            "Unknown" => Some(BusinessModel::Unknown),
            _ => None,
        }
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|s| Priority::parse(s).ok_or(FromSqlError::InvalidType))
    }
}

impl ToSql for Sentiment {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Sentiment {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|s| Sentiment::parse(s).ok_or(FromSqlError::InvalidType))
    }
}

impl ToSql for BusinessModel {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for BusinessModel {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|s| BusinessModel::parse(s).ok_or(FromSqlError::InvalidType))
    }
}
