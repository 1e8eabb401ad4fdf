// file: src/pipeline/mod.rs
// description: stage identifiers, batch engine and pipeline orchestration

pub mod batch;
pub mod orchestrator;
pub mod stages;

pub use batch::BatchEngine;
pub use orchestrator::{LeadPipeline, PipelineReport};

use serde::{Deserialize, Serialize};

/// The four classifier-backed stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Flag,
    Qualify,
    Prioritize,
    Audit,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Flag, Stage::Qualify, Stage::Prioritize, Stage::Audit];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Flag => "flag",
            Stage::Qualify => "qualify",
            Stage::Prioritize => "prioritize",
            Stage::Audit => "audit",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
