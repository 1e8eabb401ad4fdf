// file: src/pipeline/orchestrator.rs
// description: sequences the four stages for one batch-job id with idempotency and fail-fast abort

use crate::classifier::Classifier;
use crate::database::RecordStore;
use crate::error::{PipelineError, Result};
use crate::ingest::IngestRecord;
use crate::pipeline::stages::{audit, flag, prioritize, qualify, AuditStats, FlagStats};
use crate::pipeline::Stage;
use tracing::{info, warn};

/// Outcome of one pipeline run. Stats are present only for the stages this
/// run actually executed; a resumed run skips already-completed stages.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub file_id: String,
    pub entries_ingested: usize,
    pub stages_run: Vec<Stage>,
    pub flag: Option<FlagStats>,
    pub leads_created: Option<usize>,
    pub prioritized: Option<usize>,
    pub audit: Option<AuditStats>,
}

/// Strictly sequential state machine over the four stages. Each stage
/// commits atomically on success; a stage failure halts the pipeline with
/// the failing stage named and leaves earlier stages' commits in place —
/// there is no compensating rollback. Completed stages are recorded per
/// batch-job id, so an interrupted run can resume at the first incomplete
/// stage instead of repaying the classifier calls already made.
pub struct LeadPipeline<'a> {
    primary: &'a dyn Classifier,
    auditor: &'a dyn Classifier,
}

impl<'a> LeadPipeline<'a> {
    pub fn new(primary: &'a dyn Classifier, auditor: &'a dyn Classifier) -> Self {
        Self { primary, auditor }
    }

    /// Ingest the records under `file_id` and run all four stages. A
    /// batch-job id already present in the store is rejected before any
    /// stage runs; reprocessing requires an explicit purge first.
    pub async fn run(
        &self,
        store: &mut RecordStore,
        file_id: &str,
        records: &[IngestRecord],
    ) -> Result<PipelineReport> {
        if store.file_id_exists(file_id)? {
            return Err(PipelineError::Ingestion(format!(
                "batch '{file_id}' already exists; purge it before resubmitting"
            )));
        }
        if records.is_empty() {
            return Err(PipelineError::Ingestion(format!(
                "batch '{file_id}' contains no records"
            )));
        }

        info!("Processing batch '{}' ({} records)", file_id, records.len());
        let entries_ingested = store.insert_entries(file_id, records)?;

        let mut report = self.advance(store, file_id).await?;
        report.entries_ingested = entries_ingested;
        Ok(report)
    }

    /// Re-enter an interrupted batch at its first incomplete stage.
    pub async fn resume(&self, store: &mut RecordStore, file_id: &str) -> Result<PipelineReport> {
        if !store.file_id_exists(file_id)? {
            return Err(PipelineError::Ingestion(format!(
                "batch '{file_id}' does not exist; nothing to resume"
            )));
        }
        self.advance(store, file_id).await
    }

    async fn advance(&self, store: &mut RecordStore, file_id: &str) -> Result<PipelineReport> {
        let completed = store.completed_stages(file_id)?;
        let mut report = PipelineReport {
            file_id: file_id.to_string(),
            ..PipelineReport::default()
        };

        for stage in Stage::ALL {
            if completed.contains(&stage) {
                info!("Skipping {} stage for batch '{}': already complete", stage, file_id);
                continue;
            }

            match stage {
                Stage::Flag => {
                    let stats = flag::run(self.primary, store, file_id)
                        .await
                        .map_err(|e| e.in_stage(Stage::Flag))?;
                    report.flag = Some(stats);
                }
                Stage::Qualify => {
                    let created = qualify::run(self.primary, store, Some(file_id))
                        .await
                        .map_err(|e| e.in_stage(Stage::Qualify))?;
                    report.leads_created = Some(created);
                }
                Stage::Prioritize => {
                    let assigned = prioritize::run(self.primary, store, file_id)
                        .await
                        .map_err(|e| e.in_stage(Stage::Prioritize))?;
                    report.prioritized = Some(assigned);
                }
                Stage::Audit => {
                    let stats = audit::run(self.auditor, store, file_id)
                        .await
                        .map_err(|e| e.in_stage(Stage::Audit))?;
                    report.audit = Some(stats);
                }
            }
            report.stages_run.push(stage);
        }

        if report.stages_run.is_empty() {
            warn!("Batch '{}' has no incomplete stages", file_id);
        } else {
            info!(
                "Pipeline complete for batch '{}' ({} stages run)",
                file_id,
                report.stages_run.len()
            );
        }
        Ok(report)
    }
}
