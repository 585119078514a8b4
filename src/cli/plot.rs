//! Plot command - draw coverage charts.
//!
//! With `--region` the charts of that one region go to the explicit
//! `--output-*-img` paths. With `--region-file` every listed region gets its
//! own image set in `--output-dir`. Both can be combined in one run; the
//! providers are then read once for all regions.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;
use tracing::info;

use crate::aggregate::plot::{plot_regions, plot_single_region, ExplicitOutputs, PlotSettings};
use crate::aggregate::Orchestrator;
use crate::cli::{image_format, load_region_file, plot_type, sampling_type, SourceArgs};
use crate::core::region::ChromosomeRegion;
use crate::core::types::{ImageFormat, PlotType, SamplingType};
use crate::plot::render::ChartRenderer;

/// Arguments for the plot command
#[derive(Args, Debug)]
pub struct PlotArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Single region to plot, e.g. chr17:7571739-7590808
    #[arg(long)]
    pub region: Option<String>,

    /// Region list: one `region` or `name<TAB>region` per line
    #[arg(long)]
    pub region_file: Option<PathBuf>,

    /// Chart title for --region
    #[arg(long, default_value = "")]
    pub title: String,

    /// Downsampling: random, mean, median or none (unknown values mean random)
    #[arg(long, default_value = "random", value_parser = sampling_type)]
    pub sampling_type: SamplingType,

    /// Chart style: histogram, line or spline (unknown values mean histogram)
    #[arg(long, default_value = "histogram", value_parser = plot_type)]
    pub plot_type: PlotType,

    /// Draw alignment and optical-map coverage into one image
    #[arg(long)]
    pub single_image: bool,

    /// Bases per sampling bucket for BAM coverage (below 3 disables sampling)
    #[arg(long, default_value = "100")]
    pub hts_sampling_step: usize,

    /// Labels per sampling bucket for optical-map coverage (below 3 disables sampling)
    #[arg(long, default_value = "10")]
    pub om_sampling_step: usize,

    /// Maximum y-axis value for BAM coverage (0 = automatic)
    #[arg(long, default_value = "0")]
    pub coverage_limit_hts: u32,

    /// Maximum y-axis value for optical-map coverage (0 = automatic)
    #[arg(long, default_value = "0")]
    pub coverage_limit_om: u32,

    /// BAM coverage image for --region
    #[arg(long)]
    pub output_hts_img: Option<PathBuf>,

    /// Optical-map coverage image for --region
    #[arg(long)]
    pub output_om_img: Option<PathBuf>,

    /// Combined image for --region with --single-image
    #[arg(long)]
    pub output_img: Option<PathBuf>,

    /// Directory for --region-file images
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Sample name used in --region-file image names and titles
    #[arg(long, default_value = "")]
    pub sample_name: String,

    /// Image format: png, jpg, svg or pdf (unknown values mean png)
    #[arg(long, default_value = "png", value_parser = image_format)]
    pub output_format: ImageFormat,
}

impl PlotArgs {
    pub fn settings(&self) -> PlotSettings {
        PlotSettings {
            sampling: self.sampling_type,
            plot_type: self.plot_type,
            format: self.output_format,
            single_image: self.single_image,
            hts_sampling_step: self.hts_sampling_step,
            om_sampling_step: self.om_sampling_step,
            coverage_limit_hts: self.coverage_limit_hts,
            coverage_limit_om: self.coverage_limit_om,
            sample_name: self.sample_name.clone(),
            output_dir: self.output_dir.clone(),
        }
    }

    pub fn explicit_outputs(&self) -> ExplicitOutputs {
        ExplicitOutputs {
            hts: self.output_hts_img.clone(),
            om: self.output_om_img.clone(),
            combined: self.output_img.clone(),
            title: self.title.clone(),
        }
    }
}

/// Execute the plot command
///
/// # Errors
///
/// Returns an error for invalid configuration, unreadable inputs, failed
/// rendering, or when any coverage source failed.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: PlotArgs) -> anyhow::Result<()> {
    let config = args.sources.to_config()?;
    let settings = args.settings();

    if args.region.is_none() && args.region_file.is_none() {
        bail!("Either --region or --region-file is required");
    }

    let single = match &args.region {
        Some(descriptor) => {
            let region: ChromosomeRegion = descriptor
                .parse()
                .with_context(|| format!("Invalid --region '{descriptor}'"))?;
            let outputs = args.explicit_outputs();
            outputs.validate(
                settings.single_image,
                !config.bams.is_empty(),
                config.optical_map.is_some(),
            )?;
            Some((region, outputs))
        }
        None => None,
    };

    let batch = args
        .region_file
        .as_deref()
        .map(load_region_file)
        .transpose()?;

    let mut regions: Vec<ChromosomeRegion> = Vec::new();
    if let Some((region, _)) = &single {
        regions.push(region.clone());
    }
    if let Some(catalog) = &batch {
        regions.extend(catalog.regions.iter().cloned());
    }

    let mut orchestrator = Orchestrator::from_sources(&config)?;
    let mut gathered = orchestrator.gather(&regions);
    let renderer = ChartRenderer;

    if let Some((region, outputs)) = &single {
        let summary = plot_single_region(&gathered, region, &settings, outputs, &renderer)?;
        info!(images = summary.images_written, region = %region, "Plotted region");
    }

    if let Some(catalog) = &batch {
        let summary = plot_regions(&gathered, &catalog.regions, &settings, &renderer)?;
        info!(
            images = summary.images_written,
            skipped = summary.regions_skipped,
            malformed = catalog.skipped,
            dir = %settings.output_dir.display(),
            "Plotted region list"
        );
    }

    gathered.first_failure()?;
    Ok(())
}
