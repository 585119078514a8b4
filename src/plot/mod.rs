//! Chart rendering of coverage tracks.
//!
//! A [`Renderer`] receives the tracks of one image together with a
//! [`PlotRequest`]. Rendering runs in two steps:
//!
//! 1. [`prepare`] reduces every track with the sampler and reconciles the axes
//!    (shared position domain, value ceiling, colors) into a [`PreparedPlot`];
//! 2. the backend draws the prepared series ([`render::ChartRenderer`] uses
//!    `plotters`).
//!
//! Keeping the first step pure lets the orchestration be tested without
//! producing image files.

use std::path::PathBuf;

use rand::Rng;
use thiserror::Error;

use crate::core::coverage::{CoverageTrack, Rgb};
use crate::core::types::{ImageFormat, PlotType, SamplingType};
use crate::sampling::{reduce_all, Series};

pub mod axis;
pub mod render;

pub const DEFAULT_WIDTH: u32 = 1600;
pub const DEFAULT_HEIGHT: u32 = 1200;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No coverage to draw for {0}")]
    NoData(String),

    #[error("Failed to draw {path}: {message}")]
    Drawing { path: PathBuf, message: String },
}

/// Everything about one image except the data
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub sampling: SamplingType,
    pub plot_type: PlotType,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl PlotRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: "Position".to_string(),
            y_label: "Coverage".to_string(),
            sampling: SamplingType::default(),
            plot_type: PlotType::default(),
            format: ImageFormat::default(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }

    #[must_use]
    pub fn with_sampling(mut self, sampling: SamplingType) -> Self {
        self.sampling = sampling;
        self
    }

    #[must_use]
    pub fn with_plot_type(mut self, plot_type: PlotType) -> Self {
        self.plot_type = plot_type;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }
}

/// Draws one image from a list of tracks
pub trait Renderer {
    /// Write one image to `path`.
    ///
    /// # Errors
    ///
    /// Returns a `RenderError` if the format is unsupported, there is nothing
    /// to draw, or the backend fails.
    fn render(
        &self,
        request: &PlotRequest,
        tracks: &[CoverageTrack<'_>],
        path: &std::path::Path,
    ) -> Result<(), RenderError>;
}

/// Reduced series with reconciled axes, ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPlot {
    pub series: Vec<Series>,
    /// Inclusive position range shared by all series
    pub domain: (u64, u64),
    /// Top of the value axis
    pub y_max: u32,
    /// One color per series, or `None` to use the default palette
    pub colors: Option<Vec<Rgb>>,
}

/// Sample every track and reconcile the axes.
///
/// Returns `None` when there are no tracks. Without a configured ceiling the
/// value axis leaves 10% headroom above the largest sampled value.
pub fn prepare<R: Rng + ?Sized>(
    request: &PlotRequest,
    tracks: &[CoverageTrack<'_>],
    rng: &mut R,
) -> Option<PreparedPlot> {
    let domain = axis::domain_range(tracks)?;
    let series = reduce_all(tracks, request.sampling, rng);

    let y_max = match axis::ceiling(tracks) {
        Some(limit) => limit,
        None => {
            let max = series.iter().map(Series::max_value).max().unwrap_or(0);
            (max + max / 10).max(1)
        }
    };

    Some(PreparedPlot {
        series,
        domain,
        y_max,
        colors: axis::uniform_colors(tracks),
    })
}
