// file: src/pipeline/stages/flag.rs
// description: stage 1 — classify pending entries into success / fail / edge_case

use crate::classifier::{schema, Classifier, ClassifyRequest};
use crate::database::RecordStore;
use crate::error::{PipelineError, Result};
use crate::models::{Entry, EntryStatus, FlagDecision};
use crate::pipeline::{batch, BatchEngine, Stage};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

/// Entries per classifier request.
pub const CHUNK_SIZE: usize = 20;

const TEMPERATURE: f32 = 0.2;

const PROMPT: &str = "You are an AI that categorizes business inquiries for a company that helps \
digital marketing agencies scale. Classify each inquiry into one of the following categories:\n\n\
'success': a legitimate business request related to scaling, operations, team expansion, \
fulfillment, consulting, or process optimization. It should mention relevant details such as \
business type, revenue, growth goals, challenges, or a direct question about services.\n\n\
'fail': the inquiry is irrelevant, incoherent, or lacks meaningful context. This includes random \
text, gibberish, spam, or messages that provide no actionable business information (e.g. 'hello', \
'I need help', 'can you do marketing?'). Fail inquiries give no specifics about their business, \
problems, or needs.\n\n\
'edge_case': the inquiry needs human review. This covers requests for a direct video call or \
in-person meeting before sharing details, inquiries that are vague but show potential business \
intent, and messages outside a standard business inquiry such as partnerships, job applications, \
or media opportunities. If an inquiry is too vague and lacks business context, it is a fail.\n\n\
For every entry flagged 'edge_case' provide a VERY BRIEF reason (e.g. 'Requested call before \
details'). For 'success' or 'fail' the reason must be null.\n\n\
Return exactly one classification per input, preserving input order: the response must contain \
EXACTLY the same number of items as the input.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagStats {
    pub success: usize,
    pub fail: usize,
    pub edge_cases: usize,
}

impl FlagStats {
    pub fn total(&self) -> usize {
        self.success + self.fail + self.edge_cases
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FlagResponse {
    entries: Vec<FlagRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FlagRecord {
    flag: Flag,
    reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Flag {
    Success,
    Fail,
    EdgeCase,
}

impl Flag {
    fn status(self) -> EntryStatus {
        match self {
            Flag::Success => EntryStatus::Success,
            Flag::Fail => EntryStatus::Fail,
            Flag::EdgeCase => EntryStatus::EdgeCase,
        }
    }
}

fn output_schema() -> Value {
    schema::object(&[(
        "entries",
        schema::array(schema::object(&[
            ("flag", schema::string_enum(&["success", "fail", "edge_case"])),
            ("reason", schema::nullable_string()),
        ])),
    )])
}

fn build_request(chunk: &[Entry]) -> ClassifyRequest {
    let texts: Vec<&str> = chunk.iter().map(|entry| entry.raw_input.as_str()).collect();
    ClassifyRequest {
        system_prompt: PROMPT.to_string(),
        payload: json!(texts),
        schema_name: "entry_flags",
        schema: output_schema(),
        temperature: TEMPERATURE,
    }
}

/// Positional contract: no id is exchanged; results pair with the chunk's
/// entries by index.
fn parse_chunk(chunk: &[Entry], response: Value) -> Result<Vec<FlagDecision>> {
    let parsed: FlagResponse = serde_json::from_value(response).map_err(|e| {
        PipelineError::SchemaValidation(format!("flag response does not match schema: {e}"))
    })?;

    batch::expect_positional(Stage::Flag, chunk.len(), parsed.entries.len())?;

    let mut decisions = Vec::with_capacity(chunk.len());
    for (entry, record) in chunk.iter().zip(parsed.entries) {
        let reason = match (record.flag, record.reason) {
            (Flag::EdgeCase, Some(reason)) if !reason.trim().is_empty() => Some(reason),
            (Flag::EdgeCase, _) => {
                return Err(PipelineError::SchemaValidation(format!(
                    "edge_case flag for entry {} carries no reason",
                    entry.id
                )))
            }
            (_, None) => None,
            (_, Some(_)) => {
                return Err(PipelineError::SchemaValidation(format!(
                    "non-null reason for entry {} with a {} flag",
                    entry.id,
                    record.flag.status()
                )))
            }
        };

        decisions.push(FlagDecision {
            entry_id: entry.id,
            status: record.flag.status(),
            reason,
        });
    }

    Ok(decisions)
}

/// Flag every pending entry of the batch. All chunks are validated and
/// accumulated before the single commit; a failed chunk leaves every entry
/// pending.
pub async fn run(
    classifier: &dyn Classifier,
    store: &mut RecordStore,
    file_id: &str,
) -> Result<FlagStats> {
    let entries = store.entries_with_status(file_id, EntryStatus::Pending)?;
    if entries.is_empty() {
        return Err(PipelineError::Ingestion(format!(
            "no pending entries found for batch '{file_id}'"
        )));
    }

    info!("Flagging {} entries for batch '{}'", entries.len(), file_id);

    let engine = BatchEngine::new(classifier, Stage::Flag).with_chunk_size(CHUNK_SIZE);
    let decisions = engine.run(&entries, build_request, parse_chunk).await?;

    store.commit_flags(file_id, &decisions)?;

    let mut stats = FlagStats::default();
    for decision in &decisions {
        match decision.status {
            EntryStatus::Success => stats.success += 1,
            EntryStatus::Fail => stats.fail += 1,
            EntryStatus::EdgeCase => stats.edge_cases += 1,
            EntryStatus::Pending => {}
        }
    }

    info!(
        "Flagging complete for batch '{}': {} success, {} fail, {} edge cases",
        file_id, stats.success, stats.fail, stats.edge_cases
    );
    Ok(stats)
}
