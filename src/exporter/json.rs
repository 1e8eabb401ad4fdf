// file: src/exporter/json.rs
// description: structured array-of-objects export per batch-job id

use crate::error::Result;
use crate::exporter::ExportedLead;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Write `<output_dir>/<file_id>.json` and return its path.
    pub fn export(&self, file_id: &str, rows: &[ExportedLead]) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("{file_id}.json"));
        let body = serde_json::to_string_pretty(rows)?;
        fs::write(&path, body)?;

        info!("Exported {} leads to {}", rows.len(), path.display());
        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::{lead_with_audit, ranked_rows};
    use crate::models::Priority;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_export_writes_ordered_array() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path()).unwrap();

        let leads = vec![
            lead_with_audit(1, Some(Priority::Medium)),
            lead_with_audit(2, Some(Priority::Urgent)),
        ];
        let path = exporter.export("acme", &ranked_rows(&leads)).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["Auditor Priority Level"], "Urgent");
        assert_eq!(parsed[1]["Auditor Priority Level"], "Medium");
        assert_eq!(parsed[0]["Company Name"], "Company 2");
    }

    #[test]
    fn test_exporter_creates_output_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("exports/leads");
        let exporter = JsonExporter::new(&nested);
        assert!(exporter.is_ok());
        assert!(nested.is_dir());
    }
}
