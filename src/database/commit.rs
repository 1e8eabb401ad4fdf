// file: src/database/commit.rs
// description: one-transaction-per-stage mutations against the record store

use crate::error::Result;
use crate::ingest::IngestRecord;
use crate::models::{AuditVerdict, EntryStatus, FlagDecision, NewLead, Priority};
use crate::pipeline::Stage;
use chrono::Utc;
use rusqlite::{params, Transaction};
use tracing::info;

use super::RecordStore;

/// Each method here is the single storage mutation of one stage: results are
/// accumulated in memory by the caller and flushed in one transaction, so a
/// stage either lands completely or not at all. Stage completion is recorded
/// in the same transaction, which keeps the resumption marker consistent
/// with the data it describes.
impl RecordStore {
    pub fn insert_entries(&mut self, file_id: &str, records: &[IngestRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO entries (file_id, raw_input, status) VALUES (?1, ?2, ?3)",
            )?;
            for record in records {
                stmt.execute(params![file_id, record.text, EntryStatus::Pending])?;
            }
        }
        tx.commit()?;

        info!("Stored {} entries for batch '{}'", records.len(), file_id);
        Ok(records.len())
    }

    pub fn commit_flags(&mut self, file_id: &str, decisions: &[FlagDecision]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut update = tx.prepare("UPDATE entries SET status = ?1 WHERE id = ?2")?;
            // Copies file_id and raw text off the entry row itself.
            let mut review = tx.prepare(
                "INSERT INTO edge_cases (entry_id, file_id, raw_input, reason)
                 SELECT id, file_id, raw_input, ?2 FROM entries WHERE id = ?1",
            )?;

            for decision in decisions {
                update.execute(params![decision.status, decision.entry_id])?;
                if decision.status == EntryStatus::EdgeCase {
                    review.execute(params![decision.entry_id, decision.reason])?;
                }
            }
        }
        mark_stage(&tx, file_id, Stage::Flag)?;
        tx.commit()?;
        Ok(())
    }

    pub fn commit_leads(&mut self, leads: &[NewLead]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO leads (file_id, entry_id, company_name, industry, business_model,
                                    budget, revenue, growth_goal, urgency, lead_sentiment,
                                    additional_notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for lead in leads {
                stmt.execute(params![
                    lead.file_id,
                    lead.entry_id,
                    lead.company_name,
                    lead.industry,
                    lead.business_model,
                    lead.budget,
                    lead.revenue,
                    lead.growth_goal,
                    lead.urgency,
                    lead.lead_sentiment,
                    lead.additional_notes,
                ])?;
            }
        }
        for file_id in distinct_file_ids(leads) {
            mark_stage(&tx, file_id, Stage::Qualify)?;
        }
        tx.commit()?;
        Ok(leads.len())
    }

    pub fn commit_priorities(
        &mut self,
        file_id: &str,
        assignments: &[(i64, Priority)],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE leads SET assigned_priority = ?1 WHERE id = ?2")?;
            for (lead_id, priority) in assignments {
                stmt.execute(params![priority, lead_id])?;
            }
        }
        mark_stage(&tx, file_id, Stage::Prioritize)?;
        tx.commit()?;
        Ok(())
    }

    pub fn commit_audits(&mut self, file_id: &str, verdicts: &[AuditVerdict]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE leads SET audit_priority = ?1, audit_notes = ?2, audit_accuracy = ?3
                 WHERE id = ?4",
            )?;
            for verdict in verdicts {
                stmt.execute(params![
                    verdict.priority,
                    verdict.notes,
                    verdict.accuracy,
                    verdict.lead_id,
                ])?;
            }
        }
        mark_stage(&tx, file_id, Stage::Audit)?;
        tx.commit()?;
        Ok(())
    }
}

fn mark_stage(tx: &Transaction<'_>, file_id: &str, stage: Stage) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO stage_runs (file_id, stage, completed_at) VALUES (?1, ?2, ?3)",
        params![file_id, stage.as_str(), Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn distinct_file_ids(leads: &[NewLead]) -> Vec<&str> {
    let mut ids: Vec<&str> = leads.iter().map(|lead| lead.file_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;
    use pretty_assertions::assert_eq;

    fn store_with_entries(file_id: &str, texts: &[&str]) -> RecordStore {
        let mut store = RecordStore::open_in_memory().unwrap();
        let records: Vec<IngestRecord> = texts.iter().map(|t| IngestRecord::new(*t)).collect();
        store.insert_entries(file_id, &records).unwrap();
        store
    }

    fn new_lead(file_id: &str, entry_id: i64) -> NewLead {
        NewLead {
            file_id: file_id.to_string(),
            entry_id,
            company_name: Some("Acme".to_string()),
            industry: Some("SaaS".to_string()),
            business_model: None,
            budget: Some("$5k".to_string()),
            revenue: None,
            growth_goal: None,
            urgency: Some(Priority::High),
            lead_sentiment: Some(Sentiment::Hot),
            additional_notes: None,
        }
    }

    #[test]
    fn test_commit_flags_updates_status_and_edge_cases() {
        let mut store = store_with_entries("b", &["good", "bad", "call me"]);
        let entries = store.entries("b").unwrap();

        let decisions = vec![
            FlagDecision {
                entry_id: entries[0].id,
                status: EntryStatus::Success,
                reason: None,
            },
            FlagDecision {
                entry_id: entries[1].id,
                status: EntryStatus::Fail,
                reason: None,
            },
            FlagDecision {
                entry_id: entries[2].id,
                status: EntryStatus::EdgeCase,
                reason: Some("Requested a call before details".to_string()),
            },
        ];
        store.commit_flags("b", &decisions).unwrap();

        let entries = store.entries("b").unwrap();
        assert_eq!(entries[0].status, EntryStatus::Success);
        assert_eq!(entries[1].status, EntryStatus::Fail);
        assert_eq!(entries[2].status, EntryStatus::EdgeCase);

        let edge_cases = store.edge_cases("b").unwrap();
        assert_eq!(edge_cases.len(), 1);
        assert_eq!(edge_cases[0].raw_input, "call me");
        assert_eq!(edge_cases[0].reason, "Requested a call before details");

        assert_eq!(store.completed_stages("b").unwrap(), vec![Stage::Flag]);
    }

    #[test]
    fn test_commit_leads_enforces_one_lead_per_entry() {
        let mut store = store_with_entries("b", &["text"]);
        let entry_id = store.entries("b").unwrap()[0].id;

        store.commit_leads(&[new_lead("b", entry_id)]).unwrap();
        let duplicate = store.commit_leads(&[new_lead("b", entry_id)]);
        assert!(duplicate.is_err());

        // the failed transaction must not leave a second lead behind
        assert_eq!(store.leads("b").unwrap().len(), 1);
    }

    #[test]
    fn test_commit_priorities_and_audits() {
        let mut store = store_with_entries("b", &["text"]);
        let entry_id = store.entries("b").unwrap()[0].id;
        store.commit_leads(&[new_lead("b", entry_id)]).unwrap();
        let lead_id = store.leads("b").unwrap()[0].id;

        store
            .commit_priorities("b", &[(lead_id, Priority::High)])
            .unwrap();
        store
            .commit_audits(
                "b",
                &[AuditVerdict {
                    lead_id,
                    priority: Priority::Urgent,
                    notes: Some("Budget signals indicate urgency".to_string()),
                    accuracy: 75.0,
                }],
            )
            .unwrap();

        let lead = &store.leads("b").unwrap()[0];
        assert_eq!(lead.assigned_priority, Some(Priority::High));
        assert_eq!(lead.audit_priority, Some(Priority::Urgent));
        assert_eq!(lead.audit_accuracy, Some(75.0));

        assert_eq!(
            store.completed_stages("b").unwrap(),
            vec![Stage::Qualify, Stage::Prioritize, Stage::Audit]
        );
    }

    #[test]
    fn test_cascade_delete_from_entries() {
        let mut store = store_with_entries("b", &["text"]);
        let entry_id = store.entries("b").unwrap()[0].id;
        store.commit_leads(&[new_lead("b", entry_id)]).unwrap();

        store
            .conn
            .execute("DELETE FROM entries WHERE id = ?1", params![entry_id])
            .unwrap();
        assert!(store.leads("b").unwrap().is_empty());
    }
}
