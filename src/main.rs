// file: src/main.rs
// description: commandline application entry point with command handling

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use lead_triage::utils::logging::{format_error, format_step, format_success, format_warning};
use lead_triage::{
    exporter, ChatClassifier, Config, CsvExporter, JsonExporter, LeadPipeline, PipelineReport,
    RecordStore, Stage,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "lead_triage")]
#[command(version = "0.1.0")]
#[command(about = "Batch lead-triage pipeline over paired LLM classifiers", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a submission file, run all four stages and export the leads
    Process {
        /// Input file (.json record list or .txt with one inquiry per line)
        file: PathBuf,

        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Re-enter an interrupted batch at its first incomplete stage
    Resume {
        file_id: String,

        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Re-export the current lead set of a batch
    Export {
        file_id: String,

        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Print the stored records of a batch
    Show {
        file_id: String,

        #[arg(long)]
        entries: bool,

        #[arg(long)]
        leads: bool,

        #[arg(long)]
        edge_cases: bool,
    },

    /// Print store-wide record counts
    Stats,

    /// Delete every record of a batch-job id
    Purge {
        file_id: String,

        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    lead_triage::utils::logging::init_logger(cli.color, cli.verbose);

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using built-in defaults",
            cli.config.display()
        );
        Config::default_config()
    };

    match cli.command {
        Commands::Process { file, output } => {
            cmd_process(&config, &file, output).await?;
        }
        Commands::Resume { file_id, output } => {
            cmd_resume(&config, &file_id, output).await?;
        }
        Commands::Export { file_id, output } => {
            cmd_export(&config, &file_id, output)?;
        }
        Commands::Show {
            file_id,
            entries,
            leads,
            edge_cases,
        } => {
            cmd_show(&config, &file_id, entries, leads, edge_cases)?;
        }
        Commands::Stats => {
            cmd_stats(&config)?;
        }
        Commands::Purge { file_id, confirm } => {
            cmd_purge(&config, &file_id, confirm)?;
        }
    }

    Ok(())
}

async fn cmd_process(config: &Config, file: &PathBuf, output: Option<PathBuf>) -> Result<()> {
    let (file_id, records) =
        lead_triage::ingest::load_records(file).context("Failed to load submission file")?;
    info!("Loaded {} records from {} (batch '{}')", records.len(), file.display(), file_id);

    let mut store = RecordStore::open(&config.database.path)?;
    let primary = ChatClassifier::new("primary", config.primary.clone());
    let auditor = ChatClassifier::new("auditor", config.auditor.clone());
    let pipeline = LeadPipeline::new(&primary, &auditor);

    let report = match pipeline.run(&mut store, &file_id, &records).await {
        Ok(report) => report,
        Err(e) => {
            if let Some(stage) = e.stage() {
                eprintln!("{}", format_error(&format!("{stage} stage failed")));
            }
            return Err(e).context(format!("Pipeline failed for batch '{file_id}'"));
        }
    };

    print_report(&report);
    export_batch(config, &store, &file_id, output)?;
    println!("{}", format_success(&format!("Batch '{file_id}' processed")));
    Ok(())
}

async fn cmd_resume(config: &Config, file_id: &str, output: Option<PathBuf>) -> Result<()> {
    let mut store = RecordStore::open(&config.database.path)?;
    let primary = ChatClassifier::new("primary", config.primary.clone());
    let auditor = ChatClassifier::new("auditor", config.auditor.clone());
    let pipeline = LeadPipeline::new(&primary, &auditor);

    let report = pipeline
        .resume(&mut store, file_id)
        .await
        .with_context(|| format!("Resume failed for batch '{file_id}'"))?;

    if report.stages_run.is_empty() {
        println!("{}", format_warning("All stages already complete"));
    } else {
        print_report(&report);
    }
    export_batch(config, &store, file_id, output)?;
    println!("{}", format_success(&format!("Batch '{file_id}' complete")));
    Ok(())
}

fn cmd_export(config: &Config, file_id: &str, output: Option<PathBuf>) -> Result<()> {
    let store = RecordStore::open(&config.database.path)?;
    export_batch(config, &store, file_id, output)
}

fn export_batch(
    config: &Config,
    store: &RecordStore,
    file_id: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let leads = store.leads(file_id)?;
    if leads.is_empty() {
        println!("{}", format_warning(&format!("No leads to export for batch '{file_id}'")));
        return Ok(());
    }

    let output_dir = output.unwrap_or_else(|| config.export.output_dir.clone());
    let rows = exporter::ranked_rows(&leads);

    let json_path = JsonExporter::new(&output_dir)?.export(file_id, &rows)?;
    let csv_path = CsvExporter::new(&output_dir)?.export(file_id, &rows)?;
    println!(
        "{}",
        format_success(&format!(
            "Leads saved to {} and {}",
            json_path.display(),
            csv_path.display()
        ))
    );
    Ok(())
}

fn print_report(report: &PipelineReport) {
    let total = report.stages_run.len();
    for (index, stage) in report.stages_run.iter().enumerate() {
        let summary = match stage {
            Stage::Flag => report
                .flag
                .map(|s| format!("flagged {} success / {} fail / {} edge cases", s.success, s.fail, s.edge_cases)),
            Stage::Qualify => report.leads_created.map(|n| format!("created {n} leads")),
            Stage::Prioritize => report.prioritized.map(|n| format!("prioritized {n} leads")),
            Stage::Audit => report
                .audit
                .map(|s| format!("audited {} leads, mean accuracy {:.2}%", s.audited, s.mean_accuracy)),
        };
        println!(
            "{}",
            format_step(index + 1, total, &summary.unwrap_or_else(|| stage.to_string()))
        );
    }
}

fn cmd_show(
    config: &Config,
    file_id: &str,
    entries: bool,
    leads: bool,
    edge_cases: bool,
) -> Result<()> {
    let store = RecordStore::open(&config.database.path)?;
    let all = !(entries || leads || edge_cases);

    if entries || all {
        let rows = store.entries(file_id)?;
        println!("Entries ({}):", rows.len());
        for entry in rows {
            println!("  [{}] {} | {}", entry.id, entry.status, entry.raw_input);
        }
    }

    if leads || all {
        let rows = store.leads(file_id)?;
        println!("Leads ({}):", rows.len());
        for lead in rows {
            println!(
                "  [{}] {} | assigned: {} | audited: {} ({})",
                lead.id,
                lead.company_name.as_deref().unwrap_or("-"),
                lead.assigned_priority.map(|p| p.as_str()).unwrap_or("-"),
                lead.audit_priority.map(|p| p.as_str()).unwrap_or("-"),
                lead.audit_accuracy
                    .map(|a| format!("{a:.1}"))
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
    }

    if edge_cases || all {
        let rows = store.edge_cases(file_id)?;
        println!("Edge cases ({}):", rows.len());
        for edge_case in rows {
            println!("  [{}] {} | {}", edge_case.id, edge_case.reason, edge_case.raw_input);
        }
    }

    Ok(())
}

fn cmd_stats(config: &Config) -> Result<()> {
    let store = RecordStore::open(&config.database.path)?;
    let counts = store.counts()?;

    println!("Entries:    {}", counts.entries);
    println!("Leads:      {}", counts.leads);
    println!("Edge cases: {}", counts.edge_cases);
    Ok(())
}

fn cmd_purge(config: &Config, file_id: &str, confirm: bool) -> Result<()> {
    if !confirm {
        println!(
            "{}",
            format_warning(&format!(
                "This deletes every record for batch '{file_id}'. Re-run with --confirm to proceed"
            ))
        );
        return Ok(());
    }

    let mut store = RecordStore::open(&config.database.path)?;
    let removed = store.purge(file_id)?;
    println!(
        "{}",
        format_success(&format!("Removed {removed} entries and their dependents"))
    );
    Ok(())
}
