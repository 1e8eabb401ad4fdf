// file: src/pipeline/stages/audit.rs
// description: stage 4 — independent re-evaluation of assigned priorities with accuracy scoring

use crate::classifier::{schema, Classifier, ClassifyRequest};
use crate::database::RecordStore;
use crate::error::{PipelineError, Result};
use crate::models::{AuditVerdict, Lead, Priority};
use crate::pipeline::{batch, BatchEngine, Stage};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Leads per auditor request.
pub const CHUNK_SIZE: usize = 40;

const TEMPERATURE: f32 = 0.2;

const PROMPT: &str = "You are an independent AI auditor. Your task is to evaluate the accuracy \
of lead priority classifications made by another AI. Each lead consists of the raw inquiry text, \
the structured data extracted from it, and the priority level the other AI assigned.\n\n\
Verify each classification and assign your own corrected priority level from all available \
data:\n\
- 'Urgent': needs immediate action.\n\
- 'High': strong growth potential but not immediate.\n\
- 'Medium': moderate relevance but not urgent.\n\
- 'Low': weak intent or unclear need.\n\n\
Return for each lead:\n\
1. 'id': the lead's id, echoed unchanged.\n\
2. 'priority_level': your own classification.\n\
3. 'notes': if the other AI made a mistake, a brief comparison between your classification and \
theirs; empty when the priority levels match.\n\
4. 'accuracy_score': a number from 1 to 100 expressing how accurate the other AI's \
classification was. 1 is a strong misclassification and 100 an exact match. Score by closeness: \
if the other AI said 'High' and you consider it 'Urgent', 70-90 may fit depending on the data; \
if it said 'Low' and you consider it 'High', 20-50 may fit, and so on.\n\n\
Respond with a JSON object of the form {\"audits\": [{\"id\": ..., \"priority_level\": ..., \
\"notes\": ..., \"accuracy_score\": ...}, ...]} containing exactly one object per input lead.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuditStats {
    pub audited: usize,
    /// Arithmetic mean of the per-lead accuracy scores. Reported, not
    /// persisted.
    pub mean_accuracy: f64,
}

#[derive(Debug, Deserialize)]
struct AuditResponse {
    audits: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AuditRecord {
    id: i64,
    priority_level: Priority,
    #[serde(default)]
    notes: Option<String>,
    #[serde(deserialize_with = "score_from_value")]
    accuracy_score: f64,
}

/// The auditor runs without strict structured outputs, so scores sometimes
/// arrive as strings, occasionally with a percent sign.
fn score_from_value<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("accuracy_score is not a finite number")),
        Value::String(text) => text
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom("accuracy_score string is not numeric")),
        _ => Err(serde::de::Error::custom("accuracy_score has a non-numeric type")),
    }
}

fn output_schema() -> Value {
    schema::object(&[(
        "audits",
        schema::array(schema::object(&[
            ("id", schema::integer()),
            ("priority_level", schema::string_enum(&Priority::VALUES)),
            ("notes", schema::nullable_string()),
            ("accuracy_score", schema::number()),
        ])),
    )])
}

fn build_request(chunk: &[(Lead, String)]) -> ClassifyRequest {
    let records: Vec<Value> = chunk
        .iter()
        .map(|(lead, raw_input)| {
            json!({
                "id": lead.entry_id,
                "raw_inquiry": raw_input,
                "structured_data": {
                    "company_name": lead.company_name,
                    "industry": lead.industry,
                    "business_model": lead.business_model,
                    "budget": lead.budget,
                    "revenue": lead.revenue,
                    "growth_goal": lead.growth_goal,
                    "urgency": lead.urgency,
                    "lead_sentiment": lead.lead_sentiment,
                    "additional_notes": lead.additional_notes,
                },
                "assigned_priority": lead.assigned_priority,
            })
        })
        .collect();
    ClassifyRequest {
        system_prompt: PROMPT.to_string(),
        payload: json!(records),
        schema_name: "priority_audit",
        schema: output_schema(),
        temperature: TEMPERATURE,
    }
}

/// Per-record tolerance: a malformed record (unparseable score, missing
/// field, stray field) is dropped and logged while the rest of the chunk is
/// kept. The response envelope itself failing to parse still aborts the
/// stage, and any drop is caught by the engine's total-count gate.
fn parse_chunk(_chunk: &[(Lead, String)], response: Value) -> Result<Vec<AuditRecord>> {
    let parsed: AuditResponse = serde_json::from_value(response).map_err(|e| {
        PipelineError::SchemaValidation(format!("audit response does not match schema: {e}"))
    })?;

    let mut records = Vec::with_capacity(parsed.audits.len());
    for element in parsed.audits {
        match serde_json::from_value::<AuditRecord>(element.clone()) {
            Ok(record) if (1.0..=100.0).contains(&record.accuracy_score) => records.push(record),
            Ok(record) => {
                warn!(
                    "Dropping audit record {}: accuracy score {} outside [1, 100]",
                    record.id, record.accuracy_score
                );
            }
            Err(e) => {
                warn!("Dropping malformed audit record: {e} ({element})");
            }
        }
    }

    Ok(records)
}

/// Audit every prioritized lead of the batch with the independent
/// classifier, writing the corrected label, note and accuracy score. The
/// stage mutates nothing unless the accumulated results cover every lead.
pub async fn run(
    classifier: &dyn Classifier,
    store: &mut RecordStore,
    file_id: &str,
) -> Result<AuditStats> {
    let inputs = store.leads_with_raw_input(file_id)?;
    if inputs.is_empty() {
        return Err(PipelineError::Ingestion(format!(
            "no leads found for audit in batch '{file_id}'"
        )));
    }

    info!("Auditing {} leads for batch '{}'", inputs.len(), file_id);

    let engine = BatchEngine::new(classifier, Stage::Audit).with_chunk_size(CHUNK_SIZE);
    let records = engine.run(&inputs, build_request, parse_chunk).await?;

    let entry_ids: Vec<i64> = inputs.iter().map(|(lead, _)| lead.entry_id).collect();
    let ordered = batch::correlate_by_id(Stage::Audit, &entry_ids, records, |record| record.id)?;

    let verdicts: Vec<AuditVerdict> = inputs
        .iter()
        .zip(ordered)
        .map(|((lead, _), record)| AuditVerdict {
            lead_id: lead.id,
            priority: record.priority_level,
            notes: record.notes.filter(|notes| !notes.trim().is_empty()),
            accuracy: record.accuracy_score,
        })
        .collect();

    let mean_accuracy =
        verdicts.iter().map(|verdict| verdict.accuracy).sum::<f64>() / verdicts.len() as f64;

    store.commit_audits(file_id, &verdicts)?;

    info!(
        "Audit complete for batch '{}': mean accuracy {:.2}%",
        file_id, mean_accuracy
    );
    Ok(AuditStats {
        audited: verdicts.len(),
        mean_accuracy,
    })
}
