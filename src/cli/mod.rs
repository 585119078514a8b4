//! Command-line interface for depthview.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **plot**: Draw coverage charts for one region or a region list
//! - **stats**: Write per-region coverage statistics
//!
//! ## Usage
//!
//! ```text
//! # Plot one region from two BAM files
//! depthview plot --bam "a.bam;b.bam" --region chr17:7571739-7590808 \
//!     --output-hts-img tp53.png
//!
//! # Plot every region of a list, alignment and optical map in one image
//! depthview plot --bam a.bam --cmap-ref ref.cmap --cmap-query qry.cmap --xmap aln.xmap \
//!     --region-file genes.tsv --single-image --output-dir plots --sample-name NA12878
//!
//! # Statistics table
//! depthview stats --bam a.bam --region-file genes.tsv --output stats.tsv
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};

use crate::aggregate::{OpticalMapFiles, SourceConfig};
use crate::core::types::{ImageFormat, PlotType, SamplingType};
use crate::parsing::regions::{parse_region_file, RegionCatalog};

pub mod plot;
pub mod stats;

#[derive(Parser)]
#[command(name = "depthview")]
#[command(version)]
#[command(about = "Plot and summarize sequencing and optical-map coverage over genomic regions")]
#[command(
    long_about = "depthview reads per-base alignment depth from indexed BAM files and per-label depth from Bionano optical-map alignments (CMAP/XMAP), then:\n- draws downsampled coverage charts per region\n- writes min/quartile/max/mean/stddev tables per region and source"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plot coverage charts
    Plot(plot::PlotArgs),

    /// Compute coverage statistics
    Stats(stats::StatsArgs),
}

/// Coverage inputs shared by all commands
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// BAM file(s); repeat the option or separate paths with ';'.
    /// The .bai index must sit next to each BAM.
    #[arg(short, long = "bam", value_name = "BAM")]
    pub bams: Vec<String>,

    /// Bionano reference CMAP
    #[arg(long, value_name = "CMAP")]
    pub cmap_ref: Option<PathBuf>,

    /// Bionano query CMAP
    #[arg(long, value_name = "CMAP")]
    pub cmap_query: Option<PathBuf>,

    /// Bionano XMAP
    #[arg(long, value_name = "XMAP")]
    pub xmap: Option<PathBuf>,

    /// Threads used to read each BAM region
    #[arg(short, long, default_value = "1")]
    pub threads: usize,

    /// Minimum read mapping quality
    #[arg(long, default_value = "0")]
    pub mapping_quality: u8,
}

impl SourceArgs {
    /// BAM paths from all `--bam` values, split on ';'
    pub fn bam_paths(&self) -> Vec<PathBuf> {
        self.bams
            .iter()
            .flat_map(|value| value.split(';'))
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    /// Translate the arguments into a validated [`SourceConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error for a partial optical-map triple or when no source is given.
    pub fn to_config(&self) -> anyhow::Result<SourceConfig> {
        let optical_map = match (&self.cmap_ref, &self.cmap_query, &self.xmap) {
            (Some(reference_cmap), Some(query_cmap), Some(xmap)) => Some(OpticalMapFiles {
                reference_cmap: reference_cmap.clone(),
                query_cmap: query_cmap.clone(),
                xmap: xmap.clone(),
            }),
            (None, None, None) => None,
            _ => bail!("--cmap-ref, --cmap-query and --xmap must be given together"),
        };

        let config = SourceConfig {
            bams: self.bam_paths(),
            optical_map,
            threads: self.threads.max(1),
            mapping_quality: self.mapping_quality,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Load a region-list file, failing when it yields no regions
pub(crate) fn load_region_file(path: &std::path::Path) -> anyhow::Result<RegionCatalog> {
    let catalog = parse_region_file(path)
        .with_context(|| format!("Failed to read region file {}", path.display()))?;

    if catalog.is_empty() {
        bail!("No valid regions in {}", path.display());
    }
    Ok(catalog)
}

pub(crate) fn sampling_type(s: &str) -> Result<SamplingType, String> {
    Ok(SamplingType::parse(s))
}

pub(crate) fn plot_type(s: &str) -> Result<PlotType, String> {
    Ok(PlotType::parse(s))
}

pub(crate) fn image_format(s: &str) -> Result<ImageFormat, String> {
    Ok(ImageFormat::parse(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_bam_paths_split_and_repeat() {
        let cli = parse(&[
            "depthview", "stats", "--bam", "a.bam;b.bam", "--bam", "c.bam", "--region", "chr1:1-10",
            "--output", "s.tsv",
        ]);
        let Commands::Stats(args) = cli.command else {
            panic!("expected stats");
        };
        assert_eq!(
            args.sources.bam_paths(),
            vec![PathBuf::from("a.bam"), PathBuf::from("b.bam"), PathBuf::from("c.bam")]
        );
    }

    #[test]
    fn test_partial_optical_map_rejected() {
        let cli = parse(&[
            "depthview",
            "stats",
            "--cmap-ref",
            "r.cmap",
            "--xmap",
            "a.xmap",
            "--region",
            "chr1:1-10",
            "--output",
            "s.tsv",
        ]);
        let Commands::Stats(args) = cli.command else {
            panic!("expected stats");
        };
        assert!(args.sources.to_config().is_err());
    }

    #[test]
    fn test_no_source_rejected() {
        let cli = parse(&["depthview", "stats", "--region", "chr1:1-10", "--output", "s.tsv"]);
        let Commands::Stats(args) = cli.command else {
            panic!("expected stats");
        };
        assert!(args.sources.to_config().is_err());
    }

    #[test]
    fn test_plot_defaults_and_lenient_enums() {
        let cli = parse(&[
            "depthview", "-v", "plot", "--bam", "a.bam", "--region-file", "r.tsv",
            "--sampling-type", "MEDIAN", "--plot-type", "bogus", "--output-format", "jpeg",
        ]);
        assert!(cli.verbose);
        let Commands::Plot(args) = cli.command else {
            panic!("expected plot");
        };
        assert_eq!(args.sampling_type, SamplingType::Median);
        assert_eq!(args.plot_type, PlotType::Histogram);
        assert_eq!(args.output_format, ImageFormat::Jpg);
        assert_eq!(args.hts_sampling_step, 100);
        assert_eq!(args.om_sampling_step, 10);
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.sources.threads, 1);
        assert_eq!(args.sources.mapping_quality, 0);
    }
}
