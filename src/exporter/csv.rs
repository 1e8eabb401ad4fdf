// file: src/exporter/csv.rs
// description: delimited-text export per batch-job id

use crate::error::Result;
use crate::exporter::ExportedLead;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const HEADER: [&str; 10] = [
    "Company Name",
    "Industry",
    "Business Model",
    "Budget",
    "Revenue",
    "Growth Goal",
    "Urgency",
    "Lead Sentiment",
    "Additional Notes",
    "Auditor Priority Level",
];

#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Write `<output_dir>/<file_id>.csv` and return its path.
    pub fn export(&self, file_id: &str, rows: &[ExportedLead]) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("{file_id}.csv"));

        let mut body = String::new();
        body.push_str(&HEADER.map(escape).join(","));
        body.push('\n');

        for row in rows {
            let fields = [
                field(&row.company_name),
                field(&row.industry),
                field(&row.business_model),
                field(&row.budget),
                field(&row.revenue),
                field(&row.growth_goal),
                field(&row.urgency),
                field(&row.lead_sentiment),
                field(&row.additional_notes),
                field(&row.auditor_priority_level),
            ];
            body.push_str(&fields.map(|f| escape(&f)).join(","));
            body.push('\n');
        }

        fs::write(&path, body)?;
        info!("Exported {} leads to {}", rows.len(), path.display());
        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

fn field(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn escape(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
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
    fn test_export_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();

        let leads = vec![lead_with_audit(1, Some(Priority::High))];
        let path = exporter.export("acme", &ranked_rows(&leads)).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let mut lines = body.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Company Name,Industry,Business Model,Budget,Revenue,Growth Goal,Urgency,\
             Lead Sentiment,Additional Notes,Auditor Priority Level"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Company 1,SaaS,"));
        assert!(row.ends_with(",High"));
    }

    #[test]
    fn test_fields_with_delimiters_are_quoted() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_missing_values_export_as_empty_fields() {
        let dir = tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();

        let leads = vec![lead_with_audit(1, None)];
        let path = exporter.export("acme", &ranked_rows(&leads)).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let row = body.lines().nth(1).unwrap();
        assert!(row.ends_with(','));
    }
}
