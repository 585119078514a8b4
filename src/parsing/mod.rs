//! Parsers for region descriptors and region-list files.
//!
//! A region list is tab-separated text with one region per line, either
//!
//! ```text
//! chr17:7571739-7590808
//! ```
//!
//! or, with a display name used in plot titles and file names,
//!
//! ```text
//! TP53	chr17:7571739-7590808
//! ```
//!
//! Malformed lines are logged and skipped; the rest of the file still loads.
//!
//! ## Example
//!
//! ```rust
//! use depthview::parsing::regions::parse_region_text;
//!
//! let catalog = parse_region_text("TP53\tchr17:7571739-7590808\nbroken\n");
//! assert_eq!(catalog.regions.len(), 1);
//! assert_eq!(catalog.skipped, 1);
//! ```

pub mod regions;
