// file: src/database/mod.rs
// description: SQLite-backed record store partitioned by batch-job id

pub mod client;
pub mod commit;
pub mod schema;

pub use client::{RecordStore, StoreCounts};
