// file: src/models/edge_case.rs
// description: entry flagged for human review, with the classifier's reason

use serde::{Deserialize, Serialize};

/// Created by the flag stage for every entry classified `edge_case`. Carries
/// a copy of the raw text so reviewers do not need to join back to entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeCase {
    pub id: i64,
    pub entry_id: i64,
    pub file_id: String,
    pub raw_input: String,
    pub reason: String,
}
