//! Shared axes for a combined plot.
//!
//! All series drawn into one image share a position domain and a value
//! ceiling. Per-series colors are only honoured when every track has one.

use crate::core::coverage::{CoverageTrack, Rgb};

/// `(min start, max end)` over the tracks, or `None` without tracks
pub fn domain_range(tracks: &[CoverageTrack<'_>]) -> Option<(u64, u64)> {
    let start = tracks.iter().map(|t| t.info.start).min()?;
    let end = tracks.iter().map(|t| t.info.end).max()?;
    Some((start, end))
}

/// Largest configured ceiling. Zero means automatic and is ignored, so a
/// result of `None` leaves the value axis to the data.
pub fn ceiling(tracks: &[CoverageTrack<'_>]) -> Option<u32> {
    tracks.iter().map(|t| t.ceiling).filter(|&c| c > 0).max()
}

/// Track colors in order, or `None` if any track lacks one
pub fn uniform_colors(tracks: &[CoverageTrack<'_>]) -> Option<Vec<Rgb>> {
    if tracks.is_empty() {
        return None;
    }
    tracks.iter().map(|t| t.color).collect()
}
