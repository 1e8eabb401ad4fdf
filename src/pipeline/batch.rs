// file: src/pipeline/batch.rs
// description: generic chunking, submission, validation and accumulation for classifier stages

use crate::classifier::{Classifier, ClassifyRequest};
use crate::error::{PipelineError, Result};
use crate::pipeline::Stage;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Batch orchestration shared by every stage: split the ordered input into
/// fixed-size chunks, submit each chunk under the stage's declared output
/// schema, validate and accumulate the parsed results, and gate on a
/// stage-level total-count check before the caller commits. Any chunk-level
/// failure aborts the whole stage; nothing is committed here.
pub struct BatchEngine<'a> {
    classifier: &'a dyn Classifier,
    stage: Stage,
    chunk_size: Option<usize>,
}

impl<'a> BatchEngine<'a> {
    /// Engine submitting the entire input as one chunk.
    pub fn new(classifier: &'a dyn Classifier, stage: Stage) -> Self {
        Self {
            classifier,
            stage,
            chunk_size: None,
        }
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    /// Run the stage's classifier calls. `build_request` turns one chunk
    /// into a request; `parse_chunk` validates one chunk's response and
    /// returns its accepted records (it may return fewer than the chunk
    /// length only where the stage contract tolerates dropped records —
    /// the final total-count gate still fails the stage on any shortfall).
    pub async fn run<In, Out, B, P>(
        &self,
        inputs: &[In],
        build_request: B,
        parse_chunk: P,
    ) -> Result<Vec<Out>>
    where
        B: Fn(&[In]) -> ClassifyRequest,
        P: Fn(&[In], Value) -> Result<Vec<Out>>,
    {
        let chunk_size = self.chunk_size.unwrap_or(inputs.len()).max(1);
        let mut collected = Vec::with_capacity(inputs.len());

        for (index, chunk) in inputs.chunks(chunk_size).enumerate() {
            debug!(
                stage = %self.stage,
                classifier = self.classifier.name(),
                chunk = index + 1,
                records = chunk.len(),
                "submitting chunk"
            );

            let response = self.classifier.classify(build_request(chunk)).await?;
            let records = parse_chunk(chunk, response)?;
            collected.extend(records);
        }

        if collected.len() != inputs.len() {
            return Err(PipelineError::RecordMismatch {
                stage: self.stage,
                expected: inputs.len(),
                received: collected.len(),
            });
        }

        Ok(collected)
    }
}

/// Positional correlation gate: the response array must have exactly one
/// element per submitted record, paired by index.
pub fn expect_positional(stage: Stage, expected: usize, received: usize) -> Result<()> {
    if expected != received {
        return Err(PipelineError::SchemaValidation(format!(
            "{stage} response length {received} does not match chunk length {expected}"
        )));
    }
    Ok(())
}

/// Id-keyed correlation gate: every input id must match exactly one output
/// record. Duplicate, missing and unmatched ids are all fatal. Returns the
/// outputs reordered to input order.
pub fn correlate_by_id<T, F>(stage: Stage, input_ids: &[i64], outputs: Vec<T>, id_of: F) -> Result<Vec<T>>
where
    F: Fn(&T) -> i64,
{
    let mut by_id: HashMap<i64, T> = HashMap::with_capacity(outputs.len());
    for output in outputs {
        let id = id_of(&output);
        if by_id.insert(id, output).is_some() {
            return Err(PipelineError::SchemaValidation(format!(
                "{stage} response contains id {id} more than once"
            )));
        }
    }

    let mut ordered = Vec::with_capacity(input_ids.len());
    for id in input_ids {
        let output = by_id.remove(id).ok_or_else(|| {
            PipelineError::SchemaValidation(format!(
                "{stage} response is missing a record for id {id}"
            ))
        })?;
        ordered.push(output);
    }

    if !by_id.is_empty() {
        let mut stray: Vec<i64> = by_id.keys().copied().collect();
        stray.sort_unstable();
        return Err(PipelineError::SchemaValidation(format!(
            "{stage} response contains records for unknown ids {stray:?}"
        )));
    }

    Ok(ordered)
}
