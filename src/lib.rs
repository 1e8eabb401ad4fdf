// file: src/lib.rs
// description: library entry point and public api exports
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod classifier;
pub mod config;
pub mod database;
pub mod error;
pub mod exporter;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use classifier::{ChatClassifier, Classifier, ClassifyRequest};
pub use config::{ClassifierConfig, Config, DatabaseConfig, ExportConfig};
pub use database::{RecordStore, StoreCounts};
pub use error::{PipelineError, Result};
pub use exporter::{CsvExporter, ExportedLead, JsonExporter};
pub use ingest::IngestRecord;
pub use models::{
    AuditVerdict, BusinessModel, EdgeCase, Entry, EntryStatus, FlagDecision, Lead, NewLead,
    Priority, Sentiment,
};
pub use pipeline::{BatchEngine, LeadPipeline, PipelineReport, Stage};
