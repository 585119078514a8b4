//! Chart output for gathered coverage.
//!
//! Batch mode writes one image set per region into an output directory, named
//! by [`naming::image_path`]. Single-region mode writes to explicit paths.
//! Either way, every alignment track gets the alignment sampling size, ceiling
//! and color, and the optical-map track gets its own.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::aggregate::{naming, AggregateError, Gathered};
use crate::core::coverage::{CoverageInfo, CoverageTrack, Rgb};
use crate::core::region::ChromosomeRegion;
use crate::core::types::{ImageFormat, PlotType, SamplingType, SourceKind};
use crate::plot::{PlotRequest, Renderer};

pub const DEFAULT_HTS_SAMPLING_STEP: usize = 100;
pub const DEFAULT_OM_SAMPLING_STEP: usize = 10;

/// Chart options shared by every image of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotSettings {
    pub sampling: SamplingType,
    pub plot_type: PlotType,
    pub format: ImageFormat,
    /// Draw alignment and optical-map tracks into one image
    pub single_image: bool,
    pub hts_sampling_step: usize,
    pub om_sampling_step: usize,
    /// Value-axis limits, 0 for automatic
    pub coverage_limit_hts: u32,
    pub coverage_limit_om: u32,
    pub sample_name: String,
    pub output_dir: PathBuf,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            sampling: SamplingType::default(),
            plot_type: PlotType::default(),
            format: ImageFormat::default(),
            single_image: false,
            hts_sampling_step: DEFAULT_HTS_SAMPLING_STEP,
            om_sampling_step: DEFAULT_OM_SAMPLING_STEP,
            coverage_limit_hts: 0,
            coverage_limit_om: 0,
            sample_name: String::new(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl PlotSettings {
    fn request(&self, title: &str) -> PlotRequest {
        PlotRequest::new(title)
            .with_sampling(self.sampling)
            .with_plot_type(self.plot_type)
            .with_format(self.format)
    }

    fn alignment_track<'a>(&self, info: &'a CoverageInfo) -> CoverageTrack<'a> {
        CoverageTrack::new(info)
            .with_sampling_size(self.hts_sampling_step)
            .with_ceiling(self.coverage_limit_hts)
            .with_color(Rgb::RED)
    }

    fn optical_map_track<'a>(&self, info: &'a CoverageInfo) -> CoverageTrack<'a> {
        CoverageTrack::new(info)
            .with_sampling_size(self.om_sampling_step)
            .with_ceiling(self.coverage_limit_om)
            .with_color(Rgb::BLUE)
    }
}

/// Output paths and title for single-region mode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitOutputs {
    pub hts: Option<PathBuf>,
    pub om: Option<PathBuf>,
    pub combined: Option<PathBuf>,
    pub title: String,
}

impl ExplicitOutputs {
    /// Check that every image the run will produce has a path.
    ///
    /// # Errors
    ///
    /// Returns `AggregateError::Configuration` naming the missing option.
    pub fn validate(
        &self,
        single_image: bool,
        has_alignment: bool,
        has_optical_map: bool,
    ) -> Result<(), AggregateError> {
        let missing = |option: &str| {
            Err(AggregateError::Configuration(format!(
                "{option} is required when plotting a single region"
            )))
        };

        if single_image {
            if self.combined.is_none() {
                return missing("--output-img");
            }
        } else {
            if has_alignment && self.hts.is_none() {
                return missing("--output-hts-img");
            }
            if has_optical_map && self.om.is_none() {
                return missing("--output-om-img");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlotSummary {
    pub images_written: usize,
    pub regions_skipped: usize,
}

struct Targets<'p> {
    hts: Option<&'p Path>,
    om: Option<&'p Path>,
    combined: Option<&'p Path>,
}

/// Plot every region into `settings.output_dir`.
///
/// Regions without coverage from any source are logged and skipped.
///
/// # Errors
///
/// Returns an error if the output directory cannot be created or an image
/// cannot be rendered.
pub fn plot_regions(
    gathered: &Gathered,
    regions: &[ChromosomeRegion],
    settings: &PlotSettings,
    renderer: &dyn Renderer,
) -> Result<PlotSummary, AggregateError> {
    fs::create_dir_all(&settings.output_dir).map_err(|source| AggregateError::Output {
        path: settings.output_dir.clone(),
        source,
    })?;

    let mut summary = PlotSummary::default();

    for (i, region) in regions.iter().enumerate() {
        if !gathered.has_data(region) {
            info!(region = %region, "No coverage for region, skipping");
            summary.regions_skipped += 1;
            continue;
        }

        info!(
            name = region.display_name(),
            region = %region,
            "Plotting coverage {}/{}",
            i + 1,
            regions.len()
        );

        let path_for = |kind| {
            naming::image_path(
                &settings.output_dir,
                &settings.sample_name,
                region,
                kind,
                settings.format,
            )
        };
        let hts = path_for(Some(SourceKind::Alignment));
        let om = path_for(Some(SourceKind::OpticalMap));
        let combined = path_for(None);

        let title = naming::plot_title(&settings.sample_name, region);
        let targets = Targets {
            hts: Some(&hts),
            om: Some(&om),
            combined: Some(&combined),
        };

        summary.images_written +=
            plot_region(gathered, region, settings, &title, &targets, renderer)?;
    }

    Ok(summary)
}

/// Plot one region to explicit output paths.
///
/// # Errors
///
/// Returns an error if an output directory cannot be created or an image
/// cannot be rendered.
pub fn plot_single_region(
    gathered: &Gathered,
    region: &ChromosomeRegion,
    settings: &PlotSettings,
    outputs: &ExplicitOutputs,
    renderer: &dyn Renderer,
) -> Result<PlotSummary, AggregateError> {
    if !gathered.has_data(region) {
        warn!(region = %region, "No coverage for region, nothing to plot");
        return Ok(PlotSummary {
            images_written: 0,
            regions_skipped: 1,
        });
    }

    let targets = Targets {
        hts: outputs.hts.as_deref(),
        om: outputs.om.as_deref(),
        combined: outputs.combined.as_deref(),
    };
    for path in [targets.hts, targets.om, targets.combined].into_iter().flatten() {
        create_parent(path)?;
    }

    let images_written =
        plot_region(gathered, region, settings, &outputs.title, &targets, renderer)?;
    Ok(PlotSummary {
        images_written,
        regions_skipped: 0,
    })
}

fn create_parent(path: &Path) -> Result<(), AggregateError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| AggregateError::Output {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Render the images of one region, returning how many were written
fn plot_region(
    gathered: &Gathered,
    region: &ChromosomeRegion,
    settings: &PlotSettings,
    title: &str,
    targets: &Targets<'_>,
    renderer: &dyn Renderer,
) -> Result<usize, AggregateError> {
    let request = settings.request(title);

    let hts_tracks: Vec<CoverageTrack<'_>> = gathered
        .alignment_for(region)
        .into_iter()
        .map(|info| settings.alignment_track(info))
        .collect();
    let om_track = gathered
        .optical_map_for(region)
        .map(|info| settings.optical_map_track(info));

    if settings.single_image {
        let mut tracks = hts_tracks;
        tracks.extend(om_track);
        return match targets.combined {
            Some(path) => renderer.render(&request, &tracks, path).map(|()| 1).map_err(Into::into),
            None => Ok(0),
        };
    }

    let mut written = 0;

    if let Some(path) = targets.hts.filter(|_| !hts_tracks.is_empty()) {
        renderer.render(&request, &hts_tracks, path)?;
        written += 1;
    }

    if let (Some(track), Some(path)) = (om_track, targets.om) {
        renderer.render(&request, &[track], path)?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Orchestrator;
    use crate::coverage::testing::MemoryProvider;
    use crate::plot::RenderError;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        path: PathBuf,
        title: String,
        labels: Vec<String>,
        sampling_sizes: Vec<usize>,
        ceilings: Vec<u32>,
        colors: Vec<Option<Rgb>>,
    }

    #[derive(Default)]
    struct RecordingRenderer {
        calls: RefCell<Vec<Call>>,
    }

    impl Renderer for RecordingRenderer {
        fn render(
            &self,
            request: &PlotRequest,
            tracks: &[CoverageTrack<'_>],
            path: &Path,
        ) -> Result<(), RenderError> {
            self.calls.borrow_mut().push(Call {
                path: path.to_path_buf(),
                title: request.title.clone(),
                labels: tracks.iter().map(|t| t.label().to_string()).collect(),
                sampling_sizes: tracks.iter().map(|t| t.sampling_size).collect(),
                ceilings: tracks.iter().map(|t| t.ceiling).collect(),
                colors: tracks.iter().map(|t| t.color).collect(),
            });
            Ok(())
        }
    }

    fn regions() -> Vec<ChromosomeRegion> {
        vec![
            "chr1:1-10".parse::<ChromosomeRegion>().unwrap().with_name("GENE1"),
            "chr2:1-10".parse().unwrap(),
            "chr9:1-10".parse().unwrap(),
        ]
    }

    fn gathered() -> Gathered {
        let a = MemoryProvider::new("hts_a", SourceKind::Alignment)
            .with_chromosome("chr1", vec![5; 10])
            .with_chromosome("chr2", vec![1; 10]);
        let b = MemoryProvider::new("hts_b", SourceKind::Alignment)
            .with_chromosome("chr1", vec![7; 10]);
        let om = MemoryProvider::new("OM", SourceKind::OpticalMap)
            .with_chromosome("chr1", vec![2, 3, 4]);

        let mut orchestrator =
            Orchestrator::new(vec![Box::new(a), Box::new(b)], Some(Box::new(om)));
        orchestrator.gather(&regions())
    }

    fn settings(dir: &Path) -> PlotSettings {
        PlotSettings {
            sample_name: "S1".to_string(),
            output_dir: dir.to_path_buf(),
            coverage_limit_hts: 40,
            ..PlotSettings::default()
        }
    }

    #[test]
    fn test_separate_images_per_source_kind() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plots");
        let renderer = RecordingRenderer::default();

        let summary = plot_regions(&gathered(), &regions(), &settings(&out), &renderer).unwrap();
        assert_eq!(summary.images_written, 3);
        assert_eq!(summary.regions_skipped, 1);
        assert!(out.is_dir());

        let calls = renderer.calls.borrow();
        assert_eq!(calls[0].path, out.join("S1_GENE1_hts_chr1_1-10.png"));
        assert_eq!(calls[0].title, "S1 GENE1 chr1:1-10");
        assert_eq!(calls[0].labels, vec!["hts_a", "hts_b"]);
        assert_eq!(calls[0].sampling_sizes, vec![100, 100]);
        assert_eq!(calls[0].ceilings, vec![40, 40]);
        assert_eq!(calls[0].colors, vec![Some(Rgb::RED), Some(Rgb::RED)]);

        assert_eq!(calls[1].path, out.join("S1_GENE1_om_chr1_1-10.png"));
        assert_eq!(calls[1].labels, vec!["OM"]);
        assert_eq!(calls[1].sampling_sizes, vec![10]);
        assert_eq!(calls[1].ceilings, vec![0]);
        assert_eq!(calls[1].colors, vec![Some(Rgb::BLUE)]);

        // chr2 has alignment data only
        assert_eq!(calls[2].path, out.join("S1_hts_chr2_1-10.png"));
        assert_eq!(calls[2].labels, vec!["hts_a"]);
    }

    #[test]
    fn test_single_image_merges_sources() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let settings = PlotSettings {
            single_image: true,
            format: ImageFormat::Svg,
            ..settings(dir.path())
        };

        let summary = plot_regions(&gathered(), &regions(), &settings, &renderer).unwrap();
        assert_eq!(summary.images_written, 2);

        let calls = renderer.calls.borrow();
        assert_eq!(calls[0].path, dir.path().join("S1_GENE1_chr1_1-10.svg"));
        assert_eq!(calls[0].labels, vec!["hts_a", "hts_b", "OM"]);
        assert_eq!(calls[0].ceilings, vec![40, 40, 0]);
        assert_eq!(calls[1].labels, vec!["hts_a"]);
    }

    #[test]
    fn test_single_region_explicit_paths() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let outputs = ExplicitOutputs {
            hts: Some(dir.path().join("nested/hts.png")),
            om: Some(dir.path().join("om.png")),
            combined: None,
            title: "My plot".to_string(),
        };
        let regions = regions();

        let summary =
            plot_single_region(&gathered(), &regions[0], &settings(dir.path()), &outputs, &renderer)
                .unwrap();
        assert_eq!(summary.images_written, 2);
        assert!(dir.path().join("nested").is_dir());

        let calls = renderer.calls.borrow();
        assert_eq!(calls[0].path, dir.path().join("nested/hts.png"));
        assert_eq!(calls[0].title, "My plot");
        assert_eq!(calls[1].path, dir.path().join("om.png"));
    }

    #[test]
    fn test_single_region_without_data() {
        let renderer = RecordingRenderer::default();
        let region: ChromosomeRegion = "chr9:1-10".parse().unwrap();
        let summary = plot_single_region(
            &gathered(),
            &region,
            &PlotSettings::default(),
            &ExplicitOutputs::default(),
            &renderer,
        )
        .unwrap();
        assert_eq!(summary.images_written, 0);
        assert!(renderer.calls.borrow().is_empty());
    }

    #[test]
    fn test_explicit_outputs_validation() {
        let outputs = ExplicitOutputs {
            hts: Some(PathBuf::from("hts.png")),
            ..ExplicitOutputs::default()
        };
        assert!(outputs.validate(false, true, false).is_ok());
        assert!(matches!(
            outputs.validate(false, true, true),
            Err(AggregateError::Configuration(msg)) if msg.contains("--output-om-img")
        ));
        assert!(matches!(
            outputs.validate(true, true, true),
            Err(AggregateError::Configuration(msg)) if msg.contains("--output-img")
        ));
    }
}
