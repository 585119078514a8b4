//! Coverage providers: sources of raw per-region depth arrays.
//!
//! Two families implement [`CoverageProvider`]:
//!
//! - **Alignment depth** from an indexed BAM file, read either on the calling
//!   thread ([`bam::BamCoverageProvider`]) or split across a thread pool
//!   ([`threaded::ThreadedBamCoverageProvider`]). [`alignment_provider`] picks
//!   the variant from the thread count.
//! - **Optical-map depth** from a Bionano reference CMAP, query CMAP and XMAP
//!   ([`bionano::BionanoCoverageProvider`]).
//!
//! Providers are opened once per run and closed once. [`open_scoped`] returns
//! a guard that closes the provider when dropped, so early returns and errors
//! still release file handles.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::coverage::CoverageInfo;
use crate::core::region::ChromosomeRegion;
use crate::core::types::SourceKind;

pub mod bam;
pub mod bionano;
pub mod threaded;

#[cfg(test)]
pub(crate) mod fixtures;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid {format} file {path}, line {line}: {message}")]
    InvalidFormat {
        format: &'static str,
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Provider for {0} used before open()")]
    NotOpen(String),

    #[error("Failed to start thread pool: {0}")]
    ThreadPool(String),
}

impl ProviderError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A source of raw coverage for chromosomal regions
pub trait CoverageProvider {
    /// Label used for series names and statistics columns
    fn source_name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Acquire file handles and read headers/indexes.
    ///
    /// # Errors
    ///
    /// Returns a `ProviderError` if the underlying files cannot be opened or parsed.
    fn open(&mut self) -> Result<(), ProviderError>;

    /// Raw coverage over `region`, or `Ok(None)` if this source has no data
    /// for the region's chromosome.
    ///
    /// # Errors
    ///
    /// Returns a `ProviderError` if reading fails or the provider is not open.
    fn interval_coverage(
        &mut self,
        region: &ChromosomeRegion,
    ) -> Result<Option<CoverageInfo>, ProviderError>;

    /// Release resources. Called exactly once per successful `open()` by [`ProviderGuard`].
    fn close(&mut self);
}

/// An open provider that is closed when the guard is dropped
pub struct ProviderGuard<'a> {
    provider: &'a mut (dyn CoverageProvider + 'static),
}

impl Deref for ProviderGuard<'_> {
    type Target = dyn CoverageProvider + 'static;

    fn deref(&self) -> &Self::Target {
        &*self.provider
    }
}

impl DerefMut for ProviderGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.provider
    }
}

impl Drop for ProviderGuard<'_> {
    fn drop(&mut self) {
        debug!(source = %self.provider.source_name(), "Closing coverage provider");
        self.provider.close();
    }
}

/// Open a provider and tie its `close()` to the returned guard.
///
/// # Errors
///
/// Returns the provider's open error; nothing is closed in that case.
pub fn open_scoped<'a>(
    provider: &'a mut (dyn CoverageProvider + 'static),
) -> Result<ProviderGuard<'a>, ProviderError> {
    provider.open()?;
    Ok(ProviderGuard { provider })
}

/// Series label for an alignment file: `hts_<file stem>`
pub fn alignment_source_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("hts_{stem}")
}

/// Build an alignment-depth provider, multi-threaded when `threads > 1`
pub fn alignment_provider(
    path: &Path,
    threads: usize,
    mapping_quality: u8,
) -> Box<dyn CoverageProvider> {
    if threads > 1 {
        Box::new(threaded::ThreadedBamCoverageProvider::new(
            path,
            threads,
            mapping_quality,
        ))
    } else {
        Box::new(bam::BamCoverageProvider::new(path, mapping_quality))
    }
}
