//! Multi-threaded BAM depth provider.
//!
//! Each region is split into one contiguous chunk per thread. `open()` reads
//! the header and the `.bai` index once and opens one file handle per thread;
//! every chunk is read through its own handle inside a `rayon` pool and the
//! chunk depths are concatenated in order, so the result is identical to
//! [`BamCoverageProvider`](super::bam::BamCoverageProvider).

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use noodles::bam::{self, bai};
use noodles::{bgzf, sam};
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::debug;

use crate::core::coverage::CoverageInfo;
use crate::core::region::ChromosomeRegion;
use crate::core::types::SourceKind;
use crate::coverage::bam::{accumulate_depth, query_region, window_len};
use crate::coverage::{alignment_source_name, CoverageProvider, ProviderError};

type BamReader = bam::io::Reader<bgzf::Reader<File>>;

/// Handles held between `open()` and `close()`
struct OpenBam {
    header: sam::Header,
    index: bai::Index,
    readers: Vec<Mutex<BamReader>>,
    pool: ThreadPool,
}

pub struct ThreadedBamCoverageProvider {
    path: PathBuf,
    name: String,
    threads: usize,
    mapping_quality: u8,
    contigs: HashSet<String>,
    open: Option<OpenBam>,
}

impl ThreadedBamCoverageProvider {
    pub fn new(path: &Path, threads: usize, mapping_quality: u8) -> Self {
        Self {
            path: path.to_path_buf(),
            name: alignment_source_name(path),
            threads: threads.max(1),
            mapping_quality,
            contigs: HashSet::new(),
            open: None,
        }
    }
}

/// `sample.bam` -> `sample.bam.bai`
pub(crate) fn index_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bai");
    PathBuf::from(name)
}

impl CoverageProvider for ThreadedBamCoverageProvider {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Alignment
    }

    fn open(&mut self) -> Result<(), ProviderError> {
        let index_path = index_path(&self.path);
        let index = bai::read(&index_path).map_err(|e| ProviderError::io(&index_path, e))?;

        let open_reader = || {
            bam::io::reader::Builder
                .build_from_path(&self.path)
                .map_err(|e| ProviderError::io(&self.path, e))
        };

        let mut first = open_reader()?;
        let header = first
            .read_header()
            .map_err(|e| ProviderError::io(&self.path, e))?;

        let mut readers = Vec::with_capacity(self.threads);
        readers.push(Mutex::new(first));
        for _ in 1..self.threads {
            readers.push(Mutex::new(open_reader()?));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| ProviderError::ThreadPool(e.to_string()))?;

        self.contigs = header
            .reference_sequences()
            .keys()
            .map(ToString::to_string)
            .collect();

        debug!(
            path = %self.path.display(),
            threads = self.threads,
            contigs = self.contigs.len(),
            "Opened BAM file"
        );

        self.open = Some(OpenBam {
            header,
            index,
            readers,
            pool,
        });

        Ok(())
    }

    fn interval_coverage(
        &mut self,
        region: &ChromosomeRegion,
    ) -> Result<Option<CoverageInfo>, ProviderError> {
        let open = self
            .open
            .as_ref()
            .ok_or_else(|| ProviderError::NotOpen(self.name.clone()))?;

        if !self.contigs.contains(&region.chromosome) {
            debug!(source = %self.name, region = %region, "Chromosome not in BAM header");
            return Ok(None);
        }

        // At most one chunk per reader, so no chunk waits on a lock
        let chunks = split_interval(region.start, region.end, open.readers.len());
        let min_mapq = self.mapping_quality;

        let parts: io::Result<Vec<Vec<u32>>> = open.pool.install(|| {
            chunks
                .par_iter()
                .zip(open.readers.par_iter())
                .map(|(&(start, end), reader)| {
                    let chunk = ChromosomeRegion::new(region.chromosome.as_str(), start, end)
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
                    let mut reader = reader
                        .lock()
                        .map_err(|_| io::Error::other("BAM reader lock poisoned"))?;
                    chunk_depth(&mut reader, open, &chunk, min_mapq)
                })
                .collect()
        });
        let parts = parts.map_err(|e| ProviderError::io(&self.path, e))?;

        let mut depth = Vec::with_capacity(window_len(region));
        for part in parts {
            depth.extend(part);
        }

        Ok(Some(CoverageInfo::new(
            self.name.clone(),
            SourceKind::Alignment,
            region.start,
            region.end,
            depth,
        )))
    }

    fn close(&mut self) {
        self.open = None;
        self.contigs.clear();
    }
}

fn chunk_depth(
    reader: &mut BamReader,
    open: &OpenBam,
    chunk: &ChromosomeRegion,
    min_mapq: u8,
) -> io::Result<Vec<u32>> {
    let query = query_region(chunk)?;
    let mut depth = vec![0u32; window_len(chunk)];
    let records = reader.query(&open.header, &open.index, &query)?;
    accumulate_depth(records, chunk.start, &mut depth, min_mapq)?;

    Ok(depth)
}

/// Split `start..=end` into at most `parts` contiguous, non-empty chunks
pub(crate) fn split_interval(start: u64, end: u64, parts: usize) -> Vec<(u64, u64)> {
    let len = end - start + 1;
    let parts = (parts.max(1) as u64).min(len);
    let size = len.div_ceil(parts);

    let mut chunks = Vec::with_capacity(parts as usize);
    let mut chunk_start = start;
    while chunk_start <= end {
        let chunk_end = (chunk_start + size - 1).min(end);
        chunks.push((chunk_start, chunk_end));
        chunk_start = chunk_end + 1;
    }

    chunks
}
