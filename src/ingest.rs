// file: src/ingest.rs
// description: input file loading and conversion into the record-list ingestion form

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One raw inquiry as submitted. Plain-line text input is converted 1:1 into
/// this list form before ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRecord {
    pub text: String,
}

impl IngestRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Load a submission file. Accepts `.json` (array of `{"text": ...}`
/// objects) or `.txt` (one inquiry per non-blank line); anything else is
/// rejected. Returns the batch-job id derived from the file stem together
/// with the records.
pub fn load_records(path: &Path) -> Result<(String, Vec<IngestRecord>)> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let file_id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            PipelineError::Ingestion(format!(
                "cannot derive a batch-job id from '{}'",
                path.display()
            ))
        })?
        .to_string();

    let content = std::fs::read_to_string(path).map_err(|e| {
        PipelineError::Ingestion(format!("cannot read '{}': {e}", path.display()))
    })?;

    let records = match extension.as_deref() {
        Some("json") => serde_json::from_str::<Vec<IngestRecord>>(&content).map_err(|e| {
            PipelineError::Ingestion(format!("'{}' is not a record list: {e}", path.display()))
        })?,
        Some("txt") => records_from_lines(&content),
        _ => {
            return Err(PipelineError::Ingestion(format!(
                "invalid file type '{}': only .json and .txt are accepted",
                path.display()
            )))
        }
    };

    if records.is_empty() {
        return Err(PipelineError::Ingestion(format!(
            "'{}' contains no records",
            path.display()
        )));
    }

    Ok((file_id, records))
}

/// One record per non-blank line, trimmed.
pub fn records_from_lines(content: &str) -> Vec<IngestRecord> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(IngestRecord::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_json_records() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "acme.json",
            r#"[{"text": "first inquiry"}, {"text": "second inquiry"}]"#,
        );

        let (file_id, records) = load_records(&path).unwrap();
        assert_eq!(file_id, "acme");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "first inquiry");
    }

    #[test]
    fn test_load_txt_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "acme.txt", "first\n\n  second  \n\n");

        let (file_id, records) = load_records(&path).unwrap();
        assert_eq!(file_id, "acme");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].text, "second");
    }

    #[test]
    fn test_rejects_other_extensions() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "acme.csv", "text\n");
        assert!(matches!(
            load_records(&path),
            Err(PipelineError::Ingestion(_))
        ));
    }

    #[test]
    fn test_rejects_empty_input() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "acme.txt", "\n\n");
        assert!(matches!(
            load_records(&path),
            Err(PipelineError::Ingestion(_))
        ));
    }
}
