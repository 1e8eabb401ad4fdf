// file: src/exporter/mod.rs
// description: ranked export rows shared by the JSON and CSV writers

pub mod csv;
pub mod json;

pub use csv::CsvExporter;
pub use json::JsonExporter;

use crate::models::Lead;
use serde::Serialize;
use std::cmp::Reverse;

/// One exported lead row, with the report's column names.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedLead {
    #[serde(rename = "Company Name")]
    pub company_name: Option<String>,
    #[serde(rename = "Industry")]
    pub industry: Option<String>,
    #[serde(rename = "Business Model")]
    pub business_model: Option<String>,
    #[serde(rename = "Budget")]
    pub budget: Option<String>,
    #[serde(rename = "Revenue")]
    pub revenue: Option<String>,
    #[serde(rename = "Growth Goal")]
    pub growth_goal: Option<String>,
    #[serde(rename = "Urgency")]
    pub urgency: Option<String>,
    #[serde(rename = "Lead Sentiment")]
    pub lead_sentiment: Option<String>,
    #[serde(rename = "Additional Notes")]
    pub additional_notes: Option<String>,
    #[serde(rename = "Auditor Priority Level")]
    pub auditor_priority_level: Option<String>,
}

impl ExportedLead {
    fn from_lead(lead: &Lead) -> Self {
        Self {
            company_name: lead.company_name.clone(),
            industry: lead.industry.clone(),
            business_model: lead.business_model.map(|m| m.as_str().to_string()),
            budget: lead.budget.clone(),
            revenue: lead.revenue.clone(),
            growth_goal: lead.growth_goal.clone(),
            urgency: lead.urgency.map(|u| u.as_str().to_string()),
            lead_sentiment: lead.lead_sentiment.map(|s| s.as_str().to_string()),
            additional_notes: lead.additional_notes.clone(),
            auditor_priority_level: lead.audit_priority.map(|p| p.as_str().to_string()),
        }
    }
}

/// Export rows ordered by the auditor's priority label, most urgent first.
/// The order is the explicit ordinal rank of the label, not the label text:
/// a lexicographic sort would place "High" below "Low" and "Medium". Ties
/// keep lead id order; unaudited leads sort last.
pub fn ranked_rows(leads: &[Lead]) -> Vec<ExportedLead> {
    let mut ordered: Vec<&Lead> = leads.iter().collect();
    ordered.sort_by_key(|lead| (Reverse(audit_rank(lead)), lead.id));
    ordered.into_iter().map(ExportedLead::from_lead).collect()
}

fn audit_rank(lead: &Lead) -> i8 {
    lead.audit_priority
        .map(|priority| priority.rank() as i8)
        .unwrap_or(-1)
}

#[cfg(test)]
pub(crate) use tests::lead_with_audit;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use pretty_assertions::assert_eq;

    pub(crate) fn lead_with_audit(id: i64, priority: Option<Priority>) -> Lead {
        Lead {
            id,
            file_id: "acme".to_string(),
            entry_id: id,
            company_name: Some(format!("Company {id}")),
            industry: Some("SaaS".to_string()),
            business_model: None,
            budget: None,
            revenue: None,
            growth_goal: None,
            urgency: None,
            lead_sentiment: None,
            additional_notes: None,
            assigned_priority: None,
            audit_priority: priority,
            audit_notes: None,
            audit_accuracy: priority.map(|_| 80.0),
        }
    }

    #[test]
    fn test_rows_ordered_by_rank_not_label_text() {
        let leads = vec![
            lead_with_audit(1, Some(Priority::Low)),
            lead_with_audit(2, Some(Priority::Urgent)),
            lead_with_audit(3, Some(Priority::High)),
            lead_with_audit(4, Some(Priority::Medium)),
        ];

        let rows = ranked_rows(&leads);
        let order: Vec<Option<&str>> = rows
            .iter()
            .map(|row| row.auditor_priority_level.as_deref())
            .collect();

        // "High" outranks "Medium" and "Low" despite sorting last alphabetically
        assert_eq!(
            order,
            vec![Some("Urgent"), Some("High"), Some("Medium"), Some("Low")]
        );
    }

    #[test]
    fn test_ties_keep_lead_id_order_and_unaudited_sort_last() {
        let leads = vec![
            lead_with_audit(5, None),
            lead_with_audit(2, Some(Priority::High)),
            lead_with_audit(1, Some(Priority::High)),
        ];

        let rows = ranked_rows(&leads);
        assert_eq!(rows[0].company_name.as_deref(), Some("Company 1"));
        assert_eq!(rows[1].company_name.as_deref(), Some("Company 2"));
        assert_eq!(rows[2].auditor_priority_level, None);
    }
}
