// file: src/database/client.rs
// description: record store connection management and filtered queries
// reference: https://docs.rs/rusqlite

use crate::error::Result;
use crate::models::{EdgeCase, Entry, EntryStatus, Lead};
use crate::pipeline::Stage;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use tracing::info;

pub struct RecordStore {
    pub(super) conn: Connection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub entries: usize,
    pub leads: usize,
    pub edge_cases: usize,
}

impl RecordStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening record store at {}", path.as_ref().display());
        let conn = Connection::open(path)?;
        Self::bootstrap(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(super::schema::SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn file_id_exists(&self, file_id: &str) -> Result<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM entries WHERE file_id = ?1)",
            params![file_id],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    pub fn entries(&self, file_id: &str) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, file_id, raw_input, status FROM entries WHERE file_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![file_id], map_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn entries_with_status(&self, file_id: &str, status: EntryStatus) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, file_id, raw_input, status FROM entries
             WHERE file_id = ?1 AND status = ?2 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![file_id, status], map_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Success entries awaiting qualification. Scoped to one batch-job id
    /// when given; otherwise every success entry without a lead yet.
    pub fn success_entries(&self, file_id: Option<&str>) -> Result<Vec<Entry>> {
        match file_id {
            Some(file_id) => self.entries_with_status(file_id, EntryStatus::Success),
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT e.id, e.file_id, e.raw_input, e.status FROM entries e
                     LEFT JOIN leads l ON l.entry_id = e.id
                     WHERE e.status = 'success' AND l.id IS NULL ORDER BY e.id",
                )?;
                let rows = stmt
                    .query_map([], map_entry)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            }
        }
    }

    pub fn leads(&self, file_id: &str) -> Result<Vec<Lead>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE file_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![file_id], map_lead)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Leads joined with their originating entry's raw text, as submitted to
    /// the auditor.
    pub fn leads_with_raw_input(&self, file_id: &str) -> Result<Vec<(Lead, String)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LEAD_COLUMNS}, e.raw_input FROM leads
             JOIN entries e ON e.id = leads.entry_id
             WHERE leads.file_id = ?1 ORDER BY leads.id"
        ))?;
        let rows = stmt
            .query_map(params![file_id], |row| {
                Ok((map_lead(row)?, row.get::<_, String>(16)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn edge_cases(&self, file_id: &str) -> Result<Vec<EdgeCase>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, entry_id, file_id, raw_input, reason FROM edge_cases
             WHERE file_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![file_id], |row| {
                Ok(EdgeCase {
                    id: row.get(0)?,
                    entry_id: row.get(1)?,
                    file_id: row.get(2)?,
                    raw_input: row.get(3)?,
                    reason: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn completed_stages(&self, file_id: &str) -> Result<Vec<Stage>> {
        let mut stmt = self
            .conn
            .prepare("SELECT stage FROM stage_runs WHERE file_id = ?1")?;
        let names = stmt
            .query_map(params![file_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Stage::ALL
            .into_iter()
            .filter(|stage| names.iter().any(|name| name == stage.as_str()))
            .collect())
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            entries: self.count_rows("entries")?,
            leads: self.count_rows("leads")?,
            edge_cases: self.count_rows("edge_cases")?,
        })
    }

    fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
        Ok(count as usize)
    }

    /// Bulk delete of every record belonging to a batch-job id. Returns the
    /// number of entries removed.
    pub fn purge(&mut self, file_id: &str) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM leads WHERE file_id = ?1", params![file_id])?;
        tx.execute("DELETE FROM edge_cases WHERE file_id = ?1", params![file_id])?;
        let entries = tx.execute("DELETE FROM entries WHERE file_id = ?1", params![file_id])?;
        tx.execute("DELETE FROM stage_runs WHERE file_id = ?1", params![file_id])?;
        tx.commit()?;

        info!("Purged {} entries for batch '{}'", entries, file_id);
        Ok(entries)
    }
}

const LEAD_COLUMNS: &str = "leads.id, leads.file_id, leads.entry_id, leads.company_name, \
    leads.industry, leads.business_model, leads.budget, leads.revenue, leads.growth_goal, \
    leads.urgency, leads.lead_sentiment, leads.additional_notes, leads.assigned_priority, \
    leads.audit_priority, leads.audit_notes, leads.audit_accuracy";

fn map_entry(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        file_id: row.get(1)?,
        raw_input: row.get(2)?,
        status: row.get(3)?,
    })
}

fn map_lead(row: &Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: row.get(0)?,
        file_id: row.get(1)?,
        entry_id: row.get(2)?,
        company_name: row.get(3)?,
        industry: row.get(4)?,
        business_model: row.get(5)?,
        budget: row.get(6)?,
        revenue: row.get(7)?,
        growth_goal: row.get(8)?,
        urgency: row.get(9)?,
        lead_sentiment: row.get(10)?,
        additional_notes: row.get(11)?,
        assigned_priority: row.get(12)?,
        audit_priority: row.get(13)?,
        audit_notes: row.get(14)?,
        audit_accuracy: row.get(15)?,
    })
}
