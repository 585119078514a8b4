//! Batch orchestration over regions and coverage sources.
//!
//! The [`Orchestrator`] owns the configured providers. [`Orchestrator::gather`]
//! opens each provider once, queries every region in list order and closes the
//! provider through a scoped guard, producing a [`Gathered`] table of
//! `(source, region) -> CoverageInfo`. Plotting ([`plot`]) and statistics
//! ([`stats`]) both read from that table.
//!
//! A provider error stops that source only. It is logged and recorded, the
//! other sources still run, and [`Gathered::first_failure`] reports it once
//! all output has been written.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::core::coverage::CoverageInfo;
use crate::core::region::ChromosomeRegion;
use crate::core::types::SourceKind;
use crate::coverage::bionano::BionanoCoverageProvider;
use crate::coverage::{alignment_provider, open_scoped, CoverageProvider, ProviderError};
use crate::plot::RenderError;

pub mod naming;
pub mod plot;
pub mod stats;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Coverage source {name} failed: {error}")]
    Provider {
        name: String,
        #[source]
        error: ProviderError,
    },

    #[error("Cannot write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Failed to serialize statistics: {0}")]
    Json(#[from] serde_json::Error),
}

/// The three files of an optical-map data set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpticalMapFiles {
    pub reference_cmap: PathBuf,
    pub query_cmap: PathBuf,
    pub xmap: PathBuf,
}

/// Input files and provider options for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceConfig {
    pub bams: Vec<PathBuf>,
    pub optical_map: Option<OpticalMapFiles>,
    pub threads: usize,
    pub mapping_quality: u8,
}

impl SourceConfig {
    /// Check that at least one coverage source is configured.
    ///
    /// # Errors
    ///
    /// Returns `AggregateError::Configuration` when there are neither BAM files
    /// nor a complete optical-map triple.
    pub fn validate(&self) -> Result<(), AggregateError> {
        if self.bams.is_empty() && self.optical_map.is_none() {
            return Err(AggregateError::Configuration(
                "no coverage source: provide --bam or all of --cmap-ref, --cmap-query and --xmap"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Coverage of one source, keyed by region
#[derive(Debug, Clone)]
pub struct SourceCoverage {
    pub label: String,
    pub kind: SourceKind,
    pub coverage: HashMap<ChromosomeRegion, CoverageInfo>,
}

impl SourceCoverage {
    fn new(label: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            label: label.into(),
            kind,
            coverage: HashMap::new(),
        }
    }

    pub fn get(&self, region: &ChromosomeRegion) -> Option<&CoverageInfo> {
        self.coverage.get(region)
    }
}

/// Result of querying every source over every region
#[derive(Debug, Default)]
pub struct Gathered {
    /// Alignment sources in input order
    pub alignment: Vec<SourceCoverage>,
    pub optical_map: Option<SourceCoverage>,
    /// Sources that failed, with their errors, in the order they failed
    pub failures: Vec<(String, ProviderError)>,
}

impl Gathered {
    /// Alignment coverage of a region, in source order, skipping absent sources
    pub fn alignment_for(&self, region: &ChromosomeRegion) -> Vec<&CoverageInfo> {
        self.alignment.iter().filter_map(|s| s.get(region)).collect()
    }

    pub fn optical_map_for(&self, region: &ChromosomeRegion) -> Option<&CoverageInfo> {
        self.optical_map.as_ref().and_then(|s| s.get(region))
    }

    /// Whether any source produced coverage for the region
    pub fn has_data(&self, region: &ChromosomeRegion) -> bool {
        self.optical_map_for(region).is_some() || !self.alignment_for(region).is_empty()
    }

    /// Consume the recorded failures and return the first one as an error
    ///
    /// # Errors
    ///
    /// Returns `AggregateError::Provider` if any source failed.
    pub fn first_failure(&mut self) -> Result<(), AggregateError> {
        if self.failures.is_empty() {
            return Ok(());
        }
        let (name, error) = self.failures.remove(0);
        Err(AggregateError::Provider { name, error })
    }
}

/// Drives the configured providers over a region list
pub struct Orchestrator {
    alignment: Vec<Box<dyn CoverageProvider>>,
    optical_map: Option<Box<dyn CoverageProvider>>,
}

impl Orchestrator {
    pub fn new(
        alignment: Vec<Box<dyn CoverageProvider>>,
        optical_map: Option<Box<dyn CoverageProvider>>,
    ) -> Self {
        Self {
            alignment,
            optical_map,
        }
    }

    /// Build providers for the configured files.
    ///
    /// # Errors
    ///
    /// Returns `AggregateError::Configuration` if no source is configured.
    pub fn from_sources(config: &SourceConfig) -> Result<Self, AggregateError> {
        config.validate()?;

        let alignment = config
            .bams
            .iter()
            .map(|bam| alignment_provider(bam, config.threads, config.mapping_quality))
            .collect();

        let optical_map = config.optical_map.as_ref().map(|files| {
            Box::new(BionanoCoverageProvider::new(
                &files.reference_cmap,
                &files.query_cmap,
                &files.xmap,
            )) as Box<dyn CoverageProvider>
        });

        Ok(Self::new(alignment, optical_map))
    }

    /// Alignment source labels in input order
    pub fn alignment_labels(&self) -> Vec<String> {
        self.alignment
            .iter()
            .map(|p| p.source_name().to_string())
            .collect()
    }

    pub fn has_optical_map(&self) -> bool {
        self.optical_map.is_some()
    }

    /// Query every source over every region.
    ///
    /// Sources run in input order (alignment first, then the optical map),
    /// regions in list order. Failures are recorded in the result, not returned.
    pub fn gather(&mut self, regions: &[ChromosomeRegion]) -> Gathered {
        let mut gathered = Gathered::default();

        for provider in &mut self.alignment {
            let (coverage, failure) = gather_source(provider.as_mut(), regions);
            if let Some(error) = failure {
                gathered.failures.push((coverage.label.clone(), error));
            }
            gathered.alignment.push(coverage);
        }

        if let Some(provider) = &mut self.optical_map {
            let (coverage, failure) = gather_source(provider.as_mut(), regions);
            if let Some(error) = failure {
                gathered.failures.push((coverage.label.clone(), error));
            }
            gathered.optical_map = Some(coverage);
        }

        gathered
    }
}

fn gather_source(
    provider: &mut (dyn CoverageProvider + 'static),
    regions: &[ChromosomeRegion],
) -> (SourceCoverage, Option<ProviderError>) {
    let mut source = SourceCoverage::new(provider.source_name(), provider.kind());

    let mut guard = match open_scoped(provider) {
        Ok(guard) => guard,
        Err(e) => {
            error!(source = %source.label, error = %e, "Failed to open coverage source");
            return (source, Some(e));
        }
    };

    for (i, region) in regions.iter().enumerate() {
        info!(
            source = %source.label,
            region = %region,
            "Loading coverage {}/{}",
            i + 1,
            regions.len()
        );

        match guard.interval_coverage(region) {
            Ok(Some(info)) => {
                source.coverage.insert(region.clone(), info);
            }
            Ok(None) => {
                debug!(source = %source.label, region = %region, "No coverage for region");
            }
            Err(e) => {
                error!(
                    source = %source.label,
                    region = %region,
                    error = %e,
                    "Coverage source failed, skipping its remaining regions"
                );
                return (source, Some(e));
            }
        }
    }

    (source, None)
}
