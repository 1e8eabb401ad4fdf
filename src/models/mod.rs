// file: src/models/mod.rs
// description: persistent record types shared across pipeline stages

pub mod edge_case;
pub mod entry;
pub mod lead;

pub use edge_case::EdgeCase;
pub use entry::{Entry, EntryStatus, FlagDecision};
pub use lead::{AuditVerdict, BusinessModel, Lead, NewLead, Priority, Sentiment};
