use serde::{Deserialize, Serialize};

use crate::core::types::SourceKind;

/// Sampling sizes below this value disable reduction
pub const MIN_SAMPLING_SIZE: usize = 3;

/// Opaque RGB display color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const BLUE: Rgb = Rgb(0, 0, 255);
}

/// Raw coverage of one source over one region, as produced by a provider.
///
/// For alignment sources `coverage[i]` is the depth at `start + i`. For
/// optical-map sources the array is indexed by reference label, one value per
/// site in the region, and `site_count` carries the number of sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageInfo {
    /// Source label, e.g. `hts_sample1` or `OM`
    pub source: String,
    pub kind: SourceKind,
    pub start: u64,
    pub end: u64,
    pub coverage: Vec<u32>,
    pub site_count: Option<u64>,
}

impl CoverageInfo {
    pub fn new(
        source: impl Into<String>,
        kind: SourceKind,
        start: u64,
        end: u64,
        coverage: Vec<u32>,
    ) -> Self {
        Self {
            source: source.into(),
            kind,
            start,
            end,
            coverage,
            site_count: None,
        }
    }

    #[must_use]
    pub fn with_site_count(mut self, site_count: u64) -> Self {
        self.site_count = Some(site_count);
        self
    }
}

/// Display annotations attached to a [`CoverageInfo`] for one plot.
///
/// The provider record stays untouched; the orchestrator derives one track per
/// plot with the sampling size, ceiling and color of the source kind.
#[derive(Debug, Clone, Copy)]
pub struct CoverageTrack<'a> {
    pub info: &'a CoverageInfo,
    /// Sampling size; values below [`MIN_SAMPLING_SIZE`] force no reduction
    pub sampling_size: usize,
    /// Maximum value-axis value, 0 for automatic
    pub ceiling: u32,
    pub color: Option<Rgb>,
}

impl<'a> CoverageTrack<'a> {
    pub fn new(info: &'a CoverageInfo) -> Self {
        Self {
            info,
            sampling_size: 0,
            ceiling: 0,
            color: None,
        }
    }

    #[must_use]
    pub fn with_sampling_size(mut self, sampling_size: usize) -> Self {
        self.sampling_size = sampling_size;
        self
    }

    #[must_use]
    pub fn with_ceiling(mut self, ceiling: u32) -> Self {
        self.ceiling = ceiling;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn label(&self) -> &str {
        &self.info.source
    }
}
