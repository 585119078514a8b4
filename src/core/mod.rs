//! Core data types shared by providers, sampling, statistics and plotting.
//!
//! - [`ChromosomeRegion`](region::ChromosomeRegion): a 1-based inclusive interval with
//!   an optional display name
//! - [`CoverageInfo`](coverage::CoverageInfo): raw depth of one source over one region
//! - [`CoverageTrack`](coverage::CoverageTrack): a coverage record annotated for one plot
//! - [`SamplingType`](types::SamplingType), [`PlotType`](types::PlotType),
//!   [`ImageFormat`](types::ImageFormat), [`SourceKind`](types::SourceKind)
//!
//! ## Coordinates
//!
//! Regions use the samtools convention `chromosome:start-end` with both ends
//! included, so `chr1:1-100` covers 100 bases.

pub mod coverage;
pub mod region;
pub mod types;
