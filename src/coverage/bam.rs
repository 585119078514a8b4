//! Per-base alignment depth from an indexed BAM file.
//!
//! The `.bai` index must sit next to the BAM (`sample.bam.bai`). Depth counts
//! alignment blocks (`M`, `=`, `X`); deletions and reference skips advance the
//! reference position without adding depth. Unmapped, secondary, QC-failed and
//! duplicate records are skipped, as are records below the mapping-quality
//! threshold.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use noodles::bam;
use noodles::core::{Position, Region};
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use tracing::debug;

use crate::core::coverage::CoverageInfo;
use crate::core::region::ChromosomeRegion;
use crate::core::types::SourceKind;
use crate::coverage::{alignment_source_name, CoverageProvider, ProviderError};

type RegionReader = Box<dyn FnMut(&Region, &mut [u32], u64) -> io::Result<()>>;

/// Single-threaded BAM depth provider
pub struct BamCoverageProvider {
    path: PathBuf,
    name: String,
    mapping_quality: u8,
    contigs: HashSet<String>,
    reader: Option<RegionReader>,
}

impl BamCoverageProvider {
    pub fn new(path: &Path, mapping_quality: u8) -> Self {
        Self {
            path: path.to_path_buf(),
            name: alignment_source_name(path),
            mapping_quality,
            contigs: HashSet::new(),
            reader: None,
        }
    }
}

impl CoverageProvider for BamCoverageProvider {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Alignment
    }

    fn open(&mut self) -> Result<(), ProviderError> {
        let mut reader = bam::io::indexed_reader::Builder::default()
            .build_from_path(&self.path)
            .map_err(|e| ProviderError::io(&self.path, e))?;

        let header = reader
            .read_header()
            .map_err(|e| ProviderError::io(&self.path, e))?;

        self.contigs = header
            .reference_sequences()
            .keys()
            .map(ToString::to_string)
            .collect();

        debug!(
            path = %self.path.display(),
            contigs = self.contigs.len(),
            "Opened BAM file"
        );

        let min_mapq = self.mapping_quality;
        self.reader = Some(Box::new(
            move |region: &Region, depth: &mut [u32], window_start: u64| {
                let records = reader.query(&header, region)?;
                accumulate_depth(records, window_start, depth, min_mapq)
            },
        ));

        Ok(())
    }

    fn interval_coverage(
        &mut self,
        region: &ChromosomeRegion,
    ) -> Result<Option<CoverageInfo>, ProviderError> {
        let read = self
            .reader
            .as_mut()
            .ok_or_else(|| ProviderError::NotOpen(self.name.clone()))?;

        if !self.contigs.contains(&region.chromosome) {
            debug!(source = %self.name, region = %region, "Chromosome not in BAM header");
            return Ok(None);
        }

        let query = query_region(region).map_err(|e| ProviderError::io(&self.path, e))?;
        let mut depth = vec![0u32; window_len(region)];

        read(&query, &mut depth, region.start).map_err(|e| ProviderError::io(&self.path, e))?;

        Ok(Some(CoverageInfo::new(
            self.name.clone(),
            SourceKind::Alignment,
            region.start,
            region.end,
            depth,
        )))
    }

    fn close(&mut self) {
        self.reader = None;
        self.contigs.clear();
    }
}

#[allow(clippy::cast_possible_truncation)] // Region lengths fit in memory-addressable sizes
pub(crate) fn window_len(region: &ChromosomeRegion) -> usize {
    region.len() as usize
}

/// Build a noodles query region for a 1-based inclusive interval
pub(crate) fn query_region(region: &ChromosomeRegion) -> io::Result<Region> {
    let position = |value: u64| {
        usize::try_from(value)
            .ok()
            .and_then(Position::new)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid position {value} in region {region}"),
                )
            })
    };

    let start = position(region.start)?;
    let end = position(region.end)?;

    Ok(Region::new(region.chromosome.as_str(), start..=end))
}

/// Whether a record contributes to depth
pub(crate) fn passes_filters(
    flags: Flags,
    mapping_quality: Option<MappingQuality>,
    min: u8,
) -> bool {
    if flags.is_unmapped() || flags.is_secondary() || flags.is_qc_fail() || flags.is_duplicate() {
        return false;
    }

    if min == 0 {
        return true;
    }

    // A missing MAPQ (255) fails any positive threshold
    mapping_quality.is_some_and(|mq| mq.get() >= min)
}

/// Add one aligned block to a depth window starting at `window_start`.
/// Parts of the block outside the window are ignored.
pub(crate) fn add_block(depth: &mut [u32], window_start: u64, block_start: u64, block_len: u64) {
    let window_end = window_start + depth.len() as u64;
    let from = block_start.max(window_start);
    let to = (block_start + block_len).min(window_end);

    for pos in from..to {
        #[allow(clippy::cast_possible_truncation)] // pos - window_start < depth.len()
        let i = (pos - window_start) as usize;
        depth[i] = depth[i].saturating_add(1);
    }
}

/// Accumulate depth over the window from a stream of BAM records
pub(crate) fn accumulate_depth<I>(
    records: I,
    window_start: u64,
    depth: &mut [u32],
    min_mapq: u8,
) -> io::Result<()>
where
    I: Iterator<Item = io::Result<bam::Record>>,
{
    for result in records {
        let record = result?;

        if !passes_filters(record.flags(), record.mapping_quality(), min_mapq) {
            continue;
        }

        let Some(alignment_start) = record.alignment_start().transpose()? else {
            continue;
        };

        let mut ref_pos = usize::from(alignment_start) as u64;

        for op in record.cigar().iter() {
            let op = op?;
            let len = op.len() as u64;

            match op.kind() {
                Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                    add_block(depth, window_start, ref_pos, len);
                    ref_pos += len;
                }
                Kind::Deletion | Kind::Skip => ref_pos += len,
                _ => {}
            }
        }
    }

    Ok(())
}
