// file: src/error.rs
// description: pipeline error taxonomy and result type alias
// reference: https://docs.rs/thiserror

use crate::pipeline::Stage;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Classifier '{classifier}' request failed: {message}")]
    Gateway { classifier: String, message: String },

    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("{stage} stage accumulated {received} records for {expected} inputs")]
    RecordMismatch {
        stage: Stage,
        expected: usize,
        received: usize,
    },

    #[error("Commit failed: {0}")]
    Commit(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{stage} stage failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Attribute an error to the stage it surfaced in. Already-attributed
    /// errors are left untouched so the innermost stage wins.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            err @ PipelineError::StageFailed { .. } => err,
            err => PipelineError::StageFailed {
                stage,
                source: Box::new(err),
            },
        }
    }

    /// The stage this error is attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_stage_wraps_once() {
        let err = PipelineError::SchemaValidation("length mismatch".to_string())
            .in_stage(Stage::Flag)
            .in_stage(Stage::Audit);

        assert_eq!(err.stage(), Some(Stage::Flag));
        assert!(err.to_string().contains("flag stage failed"));
    }

    #[test]
    fn test_record_mismatch_display() {
        let err = PipelineError::RecordMismatch {
            stage: Stage::Audit,
            expected: 10,
            received: 9,
        };
        assert_eq!(
            err.to_string(),
            "audit stage accumulated 9 records for 10 inputs"
        );
    }
}
