//! Stats command - per-region coverage statistics.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;
use tracing::info;

use crate::aggregate::stats::{write_statistics, StatsFormat, StatsSettings};
use crate::aggregate::Orchestrator;
use crate::cli::{load_region_file, SourceArgs};
use crate::parsing::regions::RegionCatalog;

/// Output format of the statistics table
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum TableFormat {
    Tsv,
    Json,
}

impl From<TableFormat> for StatsFormat {
    fn from(format: TableFormat) -> Self {
        match format {
            TableFormat::Tsv => StatsFormat::Tsv,
            TableFormat::Json => StatsFormat::Json,
        }
    }
}

/// Arguments for the stats command
#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Region to summarize, e.g. chr17:7571739-7590808
    #[arg(long)]
    pub region: Option<String>,

    /// Region list: one `region` or `name<TAB>region` per line
    #[arg(long)]
    pub region_file: Option<PathBuf>,

    /// Output table
    #[arg(short, long)]
    pub output: PathBuf,

    /// Table format
    #[arg(long, default_value = "tsv")]
    pub format: TableFormat,
}

/// Execute the stats command
///
/// # Errors
///
/// Returns an error for invalid configuration, unreadable inputs, an
/// unwritable output file, or when any coverage source failed.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: StatsArgs) -> anyhow::Result<()> {
    let config = args.sources.to_config()?;

    let mut catalog = RegionCatalog::default();
    if let Some(descriptor) = &args.region {
        catalog
            .push_descriptor(descriptor)
            .with_context(|| format!("Invalid --region '{descriptor}'"))?;
    }
    if let Some(path) = &args.region_file {
        catalog.extend(load_region_file(path)?);
    }
    if catalog.is_empty() {
        bail!("Either --region or --region-file is required");
    }

    let settings = StatsSettings {
        output: args.output.clone(),
        format: args.format.into(),
    };

    let mut orchestrator = Orchestrator::from_sources(&config)?;
    let mut gathered = orchestrator.gather(&catalog.regions);
    let summary = write_statistics(&gathered, &catalog.regions, &settings)?;

    info!(
        rows = summary.rows_written,
        skipped = summary.regions_skipped,
        malformed = catalog.skipped,
        output = %settings.output.display(),
        "Statistics complete"
    );

    gathered.first_failure()?;
    Ok(())
}
