//! # depthview
//!
//! A library for reducing genomic coverage over many regions and sources into
//! plot-ready series and summary statistics.
//!
//! Coverage comes from two kinds of sources:
//!
//! - **Alignment depth**: per-base depth of reads in indexed BAM files
//! - **Optical-map depth**: per-label depth of Bionano optical-map alignments
//!   (reference CMAP, query CMAP and XMAP)
//!
//! For each region in a region list, every source is queried once. The raw
//! depth arrays are then either downsampled (random, mean, median or none) and
//! drawn as charts, or summarized as min/quartiles/max/mean/stddev rows.
//!
//! ## Example
//!
//! ```rust
//! use depthview::core::coverage::{CoverageInfo, CoverageTrack};
//! use depthview::core::types::{SamplingType, SourceKind};
//! use depthview::sampling::reduce;
//! use depthview::stats::CoverageStatistics;
//!
//! let depth: Vec<u32> = (1..=10).collect();
//! let info = CoverageInfo::new("hts_sample", SourceKind::Alignment, 100, 109, depth);
//!
//! // Mean of every 4 bases (sampling size 5)
//! let track = CoverageTrack::new(&info).with_sampling_size(5);
//! let series = reduce(&track, SamplingType::Mean, &mut rand::thread_rng());
//! assert_eq!(series.points, vec![(101, 2), (105, 6), (108, 9)]);
//!
//! let stats = CoverageStatistics::compute(&info.coverage).unwrap();
//! assert_eq!(stats.max, 10);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Regions, coverage records and option enums
//! - [`parsing`]: Region descriptor and region-list parsing
//! - [`coverage`]: Coverage providers for BAM and Bionano inputs
//! - [`sampling`]: Downsampling strategies
//! - [`stats`]: Order statistics
//! - [`plot`]: Axis reconciliation and chart rendering
//! - [`aggregate`]: Batch orchestration, plot naming and statistics tables
//! - [`cli`]: Command-line interface implementation

pub mod aggregate;
pub mod cli;
pub mod core;
pub mod coverage;
pub mod parsing;
pub mod plot;
pub mod sampling;
pub mod stats;
pub mod utils;

pub use crate::core::coverage::{CoverageInfo, CoverageTrack};
pub use crate::core::region::ChromosomeRegion;
pub use crate::coverage::CoverageProvider;
pub use crate::stats::CoverageStatistics;
