// file: src/pipeline/stages/qualify.rs
// description: stage 2 — extract structured lead fields from success entries

use crate::classifier::{schema, Classifier, ClassifyRequest};
use crate::database::RecordStore;
use crate::error::{PipelineError, Result};
use crate::models::{BusinessModel, Entry, NewLead, Priority, Sentiment};
use crate::pipeline::{batch, BatchEngine, Stage};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

const TEMPERATURE: f32 = 0.2;

const PROMPT: &str = "You are an AI responsible for structuring business inquiries. Extract the \
following details for every entry:\n\
- company_name: if mentioned, otherwise null.\n\
- industry: the industry type (e.g. SaaS, Retail, Marketing), otherwise null.\n\
- business_model: one of ['B2B', 'B2C', 'DTC', 'Unknown'], or null.\n\
- budget: the amount the user is willing to spend (marketing, services, investment), or null.\n\
- revenue: ONLY if the user explicitly states revenue. Do NOT confuse it with budget. Convert \
to a monthly figure.\n\
- growth_goal: the stated growth objective, converted to a monthly figure. Do NOT confuse it \
with budget.\n\
- urgency: ['Urgent', 'High', 'Medium', 'Low'] based on how soon they need help, or null.\n\
- lead_sentiment: ['Hot', 'Neutral', 'Cold'] based on interest level, or null.\n\
- additional_notes: ONLY specific user requests, never the entire inquiry.\n\n\
Every extracted entry must correspond 1:1 with an input entry and echo that entry's id \
unchanged.";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QualifyResponse {
    entries: Vec<QualifiedRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QualifiedRecord {
    id: i64,
    company_name: Option<String>,
    industry: Option<String>,
    business_model: Option<BusinessModel>,
    budget: Option<String>,
    revenue: Option<String>,
    growth_goal: Option<String>,
    urgency: Option<Priority>,
    lead_sentiment: Option<Sentiment>,
    additional_notes: Option<String>,
}

fn output_schema() -> Value {
    schema::object(&[(
        "entries",
        schema::array(schema::object(&[
            ("id", schema::integer()),
            ("company_name", schema::nullable_string()),
            ("industry", schema::nullable_string()),
            ("business_model", schema::nullable_enum(&BusinessModel::VALUES)),
            ("budget", schema::nullable_string()),
            ("revenue", schema::nullable_string()),
            ("growth_goal", schema::nullable_string()),
            ("urgency", schema::nullable_enum(&Priority::VALUES)),
            ("lead_sentiment", schema::nullable_enum(&Sentiment::VALUES)),
            ("additional_notes", schema::nullable_string()),
        ])),
    )])
}

fn build_request(chunk: &[Entry]) -> ClassifyRequest {
    let entries: Vec<Value> = chunk
        .iter()
        .map(|entry| json!({"id": entry.id, "text": entry.raw_input}))
        .collect();
    ClassifyRequest {
        system_prompt: PROMPT.to_string(),
        payload: json!({ "entries": entries }),
        schema_name: "lead_data",
        schema: output_schema(),
        temperature: TEMPERATURE,
    }
}

/// Id-keyed contract: every input entry's id must come back exactly once; a
/// missing id fails the stage naming the offending entry.
fn parse_chunk(chunk: &[Entry], response: Value) -> Result<Vec<QualifiedRecord>> {
    let parsed: QualifyResponse = serde_json::from_value(response).map_err(|e| {
        PipelineError::SchemaValidation(format!("qualify response does not match schema: {e}"))
    })?;

    let input_ids: Vec<i64> = chunk.iter().map(|entry| entry.id).collect();
    batch::correlate_by_id(Stage::Qualify, &input_ids, parsed.entries, |record| record.id)
}

/// Create one lead per success entry, copying the nine extracted fields
/// verbatim. Unit normalization (monthly cadence) is delegated entirely to
/// the classifier's instructions. When `file_id` is `None` the stage
/// qualifies every success entry still awaiting a lead, across batches.
pub async fn run(
    classifier: &dyn Classifier,
    store: &mut RecordStore,
    file_id: Option<&str>,
) -> Result<usize> {
    let entries = store.success_entries(file_id)?;
    if entries.is_empty() {
        return Err(PipelineError::Ingestion(format!(
            "no success entries awaiting qualification for batch '{}'",
            file_id.unwrap_or("ALL")
        )));
    }

    info!(
        "Qualifying {} success entries for batch '{}'",
        entries.len(),
        file_id.unwrap_or("ALL")
    );

    // entire input goes out as a single chunk
    let engine = BatchEngine::new(classifier, Stage::Qualify);
    let records = engine.run(&entries, build_request, parse_chunk).await?;

    let leads: Vec<NewLead> = entries
        .iter()
        .zip(records)
        .map(|(entry, record)| NewLead {
            file_id: entry.file_id.clone(),
            entry_id: entry.id,
            company_name: record.company_name,
            industry: record.industry,
            business_model: record.business_model,
            budget: record.budget,
            revenue: record.revenue,
            growth_goal: record.growth_goal,
            urgency: record.urgency,
            lead_sentiment: record.lead_sentiment,
            additional_notes: record.additional_notes,
        })
        .collect();

    let created = store.commit_leads(&leads)?;
    info!("Created {} leads", created);
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::testing::ScriptedClassifier;
    use crate::ingest::IngestRecord;
    use crate::models::{EntryStatus, FlagDecision};
    use pretty_assertions::assert_eq;

    fn store_with_success(file_id: &str, texts: &[&str]) -> RecordStore {
        let mut store = RecordStore::open_in_memory().unwrap();
        let records: Vec<IngestRecord> = texts.iter().map(|t| IngestRecord::new(*t)).collect();
        store.insert_entries(file_id, &records).unwrap();

        let decisions: Vec<FlagDecision> = store
            .entries(file_id)
            .unwrap()
            .iter()
            .map(|entry| FlagDecision {
                entry_id: entry.id,
                status: EntryStatus::Success,
                reason: None,
            })
            .collect();
        store.commit_flags(file_id, &decisions).unwrap();
        store
    }

    fn qualified(id: i64, company: &str) -> Value {
        json!({
            "id": id,
            "company_name": company,
            "industry": "SaaS",
            "business_model": "B2B",
            "budget": "$10k",
            "revenue": "$50k monthly",
            "growth_goal": null,
            "urgency": "High",
            "lead_sentiment": "Hot",
            "additional_notes": null
        })
    }

    #[tokio::test]
    async fn test_creates_one_lead_per_success_entry() {
        let mut store = store_with_success("acme", &["first", "second"]);
        let ids: Vec<i64> = store.entries("acme").unwrap().iter().map(|e| e.id).collect();

        // response deliberately out of input order: id-keyed pairing must fix it
        let classifier = ScriptedClassifier::replying(
            "primary",
            vec![json!({"entries": [qualified(ids[1], "Beta"), qualified(ids[0], "Alpha")]})],
        );

        let created = run(&classifier, &mut store, Some("acme")).await.unwrap();
        assert_eq!(created, 2);

        let leads = store.leads("acme").unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].entry_id, ids[0]);
        assert_eq!(leads[0].company_name.as_deref(), Some("Alpha"));
        assert_eq!(leads[1].company_name.as_deref(), Some("Beta"));
        assert_eq!(leads[0].business_model, Some(BusinessModel::B2B));
        assert_eq!(leads[0].urgency, Some(Priority::High));
        assert_eq!(leads[0].lead_sentiment, Some(Sentiment::Hot));
        assert!(leads[0].assigned_priority.is_none());
        assert!(leads[0].audit_priority.is_none());
    }

    #[tokio::test]
    async fn test_missing_id_fails_with_zero_leads() {
        let mut store = store_with_success("acme", &["first", "second"]);
        let ids: Vec<i64> = store.entries("acme").unwrap().iter().map(|e| e.id).collect();

        let classifier = ScriptedClassifier::replying(
            "primary",
            vec![json!({"entries": [qualified(ids[0], "Alpha")]})],
        );

        let err = run(&classifier, &mut store, Some("acme")).await.unwrap_err();
        assert!(err
            .to_string()
            .contains(&format!("missing a record for id {}", ids[1])));
        assert!(store.leads("acme").unwrap().is_empty());
        assert!(!store.completed_stages("acme").unwrap().contains(&Stage::Qualify));
    }

    #[tokio::test]
    async fn test_enum_violation_fails_stage() {
        let mut store = store_with_success("acme", &["first"]);
        let id = store.entries("acme").unwrap()[0].id;

        let mut record = qualified(id, "Alpha");
        record["business_model"] = json!("Franchise");
        let classifier =
            ScriptedClassifier::replying("primary", vec![json!({"entries": [record]})]);

        let err = run(&classifier, &mut store, Some("acme")).await.unwrap_err();
        assert!(matches!(err, PipelineError::SchemaValidation(_)));
        assert!(store.leads("acme").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unscoped_run_covers_unqualified_batches() {
        let mut store = store_with_success("one", &["a"]);
        let more = vec![IngestRecord::new("b")];
        store.insert_entries("two", &more).unwrap();
        let two_id = store.entries("two").unwrap()[0].id;
        store
            .commit_flags(
                "two",
                &[FlagDecision {
                    entry_id: two_id,
                    status: EntryStatus::Success,
                    reason: None,
                }],
            )
            .unwrap();

        let one_id = store.entries("one").unwrap()[0].id;
        let classifier = ScriptedClassifier::replying(
            "primary",
            vec![json!({"entries": [qualified(one_id, "One"), qualified(two_id, "Two")]})],
        );

        let created = run(&classifier, &mut store, None).await.unwrap();
        assert_eq!(created, 2);
        assert_eq!(store.leads("one").unwrap().len(), 1);
        assert_eq!(store.leads("two").unwrap().len(), 1);
        assert!(store.completed_stages("one").unwrap().contains(&Stage::Qualify));
        assert!(store.completed_stages("two").unwrap().contains(&Stage::Qualify));
    }

    #[tokio::test]
    async fn test_no_success_entries_fails() {
        let mut store = RecordStore::open_in_memory().unwrap();
        let classifier = ScriptedClassifier::replying("primary", vec![]);

        let err = run(&classifier, &mut store, Some("acme")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Ingestion(_)));
    }
}
