// file: src/pipeline/stages/prioritize.rs
// description: stage 3 — assign an ordinal priority label to each lead via the primary classifier

use crate::classifier::{schema, Classifier, ClassifyRequest};
use crate::database::RecordStore;
use crate::error::{PipelineError, Result};
use crate::models::{Lead, Priority};
use crate::pipeline::{batch, BatchEngine, Stage};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

const TEMPERATURE: f32 = 0.0;

const PROMPT: &str = "You are an AI responsible for determining lead priority levels. Each lead \
has structured data including industry, business model, budget, revenue, growth goals, urgency, \
and lead sentiment. Assign a priority level based on overall lead potential:\n\n\
- 'Urgent': critical business need, high budget, immediate action required.\n\
- 'High': strong growth potential, clear budget, and serious interest.\n\
- 'Medium': business shows interest but lacks strong urgency or budget.\n\
- 'Low': weak interest, unclear goals, or very low budget.\n\n\
Assign exactly one of these four priority levels per lead, in input order: the response must \
contain exactly one item per input lead.";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PriorityResponse {
    priorities: Vec<PriorityRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PriorityRecord {
    priority_level: Priority,
}

fn output_schema() -> Value {
    schema::object(&[(
        "priorities",
        schema::array(schema::object(&[(
            "priority_level",
            schema::string_enum(&Priority::VALUES),
        )])),
    )])
}

fn build_request(chunk: &[Lead]) -> ClassifyRequest {
    let leads: Vec<Value> = chunk
        .iter()
        .map(|lead| {
            json!({
                "industry": lead.industry,
                "business_model": lead.business_model,
                "budget": lead.budget,
                "revenue": lead.revenue,
                "growth_goal": lead.growth_goal,
                "urgency": lead.urgency,
                "lead_sentiment": lead.lead_sentiment,
            })
        })
        .collect();
    ClassifyRequest {
        system_prompt: PROMPT.to_string(),
        payload: json!(leads),
        schema_name: "priority_assignment",
        schema: output_schema(),
        temperature: TEMPERATURE,
    }
}

/// Positional contract: the schema echoes no id, so pairing relies on the
/// classifier preserving input order. The length gate below is the only
/// defense available; the ordering assumption itself is untestable from
/// here and is part of the documented stage contract.
fn parse_chunk(chunk: &[Lead], response: Value) -> Result<Vec<Priority>> {
    let parsed: PriorityResponse = serde_json::from_value(response).map_err(|e| {
        PipelineError::SchemaValidation(format!("prioritize response does not match schema: {e}"))
    })?;

    batch::expect_positional(Stage::Prioritize, chunk.len(), parsed.priorities.len())?;

    Ok(parsed
        .priorities
        .into_iter()
        .map(|record| record.priority_level)
        .collect())
}

/// Set the primary classifier's priority label on every lead of the batch.
pub async fn run(
    classifier: &dyn Classifier,
    store: &mut RecordStore,
    file_id: &str,
) -> Result<usize> {
    let leads = store.leads(file_id)?;
    if leads.is_empty() {
        return Err(PipelineError::Ingestion(format!(
            "no leads found for batch '{file_id}'"
        )));
    }

    info!("Assigning priorities for {} leads in batch '{}'", leads.len(), file_id);

    // entire input goes out as a single chunk
    let engine = BatchEngine::new(classifier, Stage::Prioritize);
    let priorities = engine.run(&leads, build_request, parse_chunk).await?;

    let assignments: Vec<(i64, Priority)> = leads
        .iter()
        .zip(priorities)
        .map(|(lead, priority)| (lead.id, priority))
        .collect();

    store.commit_priorities(file_id, &assignments)?;
    info!("Priorities committed for batch '{}'", file_id);
    Ok(assignments.len())
}
