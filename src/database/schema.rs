// file: src/database/schema.rs
// description: relational schema for entries, leads, edge cases and stage tracking

/// Leads and edge cases reference their entry with ON DELETE CASCADE, so a
/// purge of entries by file_id would also clear dependents; purge still
/// deletes from every table explicitly to keep the bulk path obvious.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    id         INTEGER PRIMARY KEY,
    file_id    TEXT NOT NULL,
    raw_input  TEXT NOT NULL,
    status     TEXT NOT NULL DEFAULT 'pending'
);
CREATE INDEX IF NOT EXISTS idx_entries_file_id ON entries(file_id);

CREATE TABLE IF NOT EXISTS leads (
    id                INTEGER PRIMARY KEY,
    file_id           TEXT NOT NULL,
    entry_id          INTEGER NOT NULL UNIQUE REFERENCES entries(id) ON DELETE CASCADE,
    company_name      TEXT,
    industry          TEXT,
    business_model    TEXT,
    budget            TEXT,
    revenue           TEXT,
    growth_goal       TEXT,
    urgency           TEXT,
    lead_sentiment    TEXT,
    additional_notes  TEXT,
    assigned_priority TEXT,
    audit_priority    TEXT,
    audit_notes       TEXT,
    audit_accuracy    REAL
);
CREATE INDEX IF NOT EXISTS idx_leads_file_id ON leads(file_id);

CREATE TABLE IF NOT EXISTS edge_cases (
    id         INTEGER PRIMARY KEY,
    entry_id   INTEGER NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
    file_id    TEXT NOT NULL,
    raw_input  TEXT NOT NULL,
    reason     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_edge_cases_file_id ON edge_cases(file_id);

CREATE TABLE IF NOT EXISTS stage_runs (
    file_id      TEXT NOT NULL,
    stage        TEXT NOT NULL,
    completed_at TEXT NOT NULL,
    PRIMARY KEY (file_id, stage)
);
"#;
