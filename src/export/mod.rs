pub mod filter;
pub mod sink;

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::dataset::Record;
use crate::error::Result;

pub use filter::{filter, Rule};
pub use sink::{read_partitioned, write_document, write_partitioned, SUCCESS_MARKER};

/// One rule and the two destinations its subset is written to.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub rule: Rule,
    pub partition_dir: PathBuf,
    pub document: PathBuf,
}

impl ExportJob {
    /// The two standard jobs under `results_dir`.
    pub fn defaults(results_dir: &Path) -> Vec<ExportJob> {
        vec![
            ExportJob {
                rule: Rule::mongo(),
                partition_dir: results_dir.join("mongo_json_output"),
                document: results_dir.join("dataMongo.json"),
            },
            ExportJob {
                rule: Rule::pgsql(),
                partition_dir: results_dir.join("pgsql_json_output"),
                document: results_dir.join("dataPgsql.json"),
            },
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ExportReport {
    pub rule: String,
    pub rows: usize,
    pub fragments: usize,
    pub partition_dir: PathBuf,
    pub document: PathBuf,
}

/// Filter once, then write both sinks from the same materialized subset.
pub fn export_subset(records: &[Record], job: &ExportJob, partitions: usize) -> Result<ExportReport> {
    let subset = filter(records, &job.rule);

    let fragments = write_partitioned(&job.partition_dir, &subset, partitions)?;
    write_document(&job.document, &subset)?;

    Ok(ExportReport {
        rule: job.rule.name.clone(),
        rows: subset.len(),
        fragments,
        partition_dir: job.partition_dir.clone(),
        document: job.document.clone(),
    })
}

/// Run every job in order. A failing job is logged and reported; later jobs
/// still run.
pub fn run_exports(
    records: &[Record],
    jobs: &[ExportJob],
    partitions: usize,
) -> Vec<(String, Result<ExportReport>)> {
    jobs.iter()
        .map(|job| {
            let outcome = export_subset(records, job, partitions);
            match &outcome {
                Ok(report) => info!(
                    rule = %report.rule,
                    rows = report.rows,
                    fragments = report.fragments,
                    document = %report.document.display(),
                    "export complete"
                ),
                Err(e) => error!(rule = %job.rule.name, "export failed: {}", e),
            }
            (job.rule.name.clone(), outcome)
        })
        .collect()
}
