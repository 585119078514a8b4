//! Optical-map depth from Bionano CMAP/XMAP files.
//!
//! Inputs are a reference CMAP (label positions of the in-silico digested
//! reference), a query CMAP (assembled optical maps) and an XMAP (alignments of
//! query maps to reference maps). All three are tab-separated with `#` header
//! lines and may be gzip-compressed.
//!
//! Depth is reported per reference label: for every label whose position lies
//! in the region, the number of XMAP alignments on that reference map spanning
//! the label. Alignments of query maps that are missing from the query CMAP
//! are ignored.
//!
//! Reference maps are numbered; `chr1`..`chr22` map to 1..22, `chrX` to 23 and
//! `chrY` to 24.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::coverage::CoverageInfo;
use crate::core::region::ChromosomeRegion;
use crate::core::types::SourceKind;
use crate::coverage::{CoverageProvider, ProviderError};
use crate::utils::io::open_text;

/// Series label of optical-map coverage
pub const OPTICAL_MAP_SOURCE: &str = "OM";

// CMAP columns
const CMAP_ID: usize = 0;
const CMAP_LABEL_CHANNEL: usize = 4;
const CMAP_POSITION: usize = 5;

// XMAP columns
const XMAP_QRY_ID: usize = 1;
const XMAP_REF_ID: usize = 2;
const XMAP_REF_START: usize = 5;
const XMAP_REF_END: usize = 6;

/// Reference map id for a chromosome name, if it has one
pub fn cmap_id(chromosome: &str) -> Option<u32> {
    let name = chromosome.trim();
    let name = match name.get(..3) {
        Some(prefix) if name.len() > 3 && prefix.eq_ignore_ascii_case("chr") => &name[3..],
        _ => name,
    };

    match name {
        "X" | "x" => Some(23),
        "Y" | "y" => Some(24),
        _ => name.parse().ok(),
    }
}

/// Sorted start and end coordinates of the alignments on one reference map
#[derive(Debug, Default)]
struct AlignmentSpans {
    starts: Vec<f64>,
    ends: Vec<f64>,
}

impl AlignmentSpans {
    fn push(&mut self, a: f64, b: f64) {
        self.starts.push(a.min(b));
        self.ends.push(a.max(b));
    }

    fn sort(&mut self) {
        self.starts.sort_by(f64::total_cmp);
        self.ends.sort_by(f64::total_cmp);
    }

    /// Number of spans containing `position`
    #[allow(clippy::cast_possible_truncation)] // Alignment counts are far below u32::MAX
    fn depth_at(&self, position: f64) -> u32 {
        let started = self.starts.partition_point(|&s| s <= position);
        let ended = self.ends.partition_point(|&e| e < position);
        (started - ended) as u32
    }
}

/// Parsed label positions and alignment spans, keyed by reference map id
#[derive(Debug, Default)]
pub struct OpticalMapIndex {
    sites: HashMap<u32, Vec<f64>>,
    spans: HashMap<u32, AlignmentSpans>,
}

impl OpticalMapIndex {
    /// Build the index from reference CMAP, query CMAP and XMAP readers.
    /// `paths` are only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::InvalidFormat` on malformed data lines.
    pub fn load(
        reference: impl BufRead,
        query: impl BufRead,
        xmap: impl BufRead,
        paths: [&Path; 3],
    ) -> Result<Self, ProviderError> {
        let mut sites = parse_cmap_sites(reference, paths[0])?;
        for positions in sites.values_mut() {
            positions.sort_by(f64::total_cmp);
        }

        let query_ids: HashSet<u32> = parse_cmap_sites(query, paths[1])?.into_keys().collect();

        let mut spans: HashMap<u32, AlignmentSpans> = HashMap::new();
        let mut ignored = 0usize;
        for_each_record(xmap, paths[2], "XMAP", XMAP_REF_END + 1, |fields, line| {
            let query_id: u32 = parse_field(fields, XMAP_QRY_ID, paths[2], "XMAP", line)?;
            if !query_ids.contains(&query_id) {
                ignored += 1;
                return Ok(());
            }

            let ref_id: u32 = parse_field(fields, XMAP_REF_ID, paths[2], "XMAP", line)?;
            let start: f64 = parse_field(fields, XMAP_REF_START, paths[2], "XMAP", line)?;
            let end: f64 = parse_field(fields, XMAP_REF_END, paths[2], "XMAP", line)?;
            spans.entry(ref_id).or_default().push(start, end);
            Ok(())
        })?;

        if ignored > 0 {
            warn!(
                alignments = ignored,
                "Ignoring XMAP alignments whose query map is missing from the query CMAP"
            );
        }

        for s in spans.values_mut() {
            s.sort();
        }

        Ok(Self { sites, spans })
    }

    /// Per-label depth over a region, or `None` for a chromosome without a
    /// reference map
    pub fn coverage(&self, region: &ChromosomeRegion) -> Option<CoverageInfo> {
        let id = cmap_id(&region.chromosome)?;
        let positions = self.sites.get(&id)?;

        #[allow(clippy::cast_precision_loss)] // Genomic coordinates are far below 2^52
        let (lo, hi) = (region.start as f64, region.end as f64);
        let first = positions.partition_point(|&p| p < lo);
        let last = positions.partition_point(|&p| p <= hi);
        let in_region = &positions[first..last];

        let coverage: Vec<u32> = match self.spans.get(&id) {
            Some(spans) => in_region.iter().map(|&p| spans.depth_at(p)).collect(),
            None => vec![0; in_region.len()],
        };

        let site_count = coverage.len() as u64;
        Some(
            CoverageInfo::new(
                OPTICAL_MAP_SOURCE,
                SourceKind::OpticalMap,
                region.start,
                region.end,
                coverage,
            )
            .with_site_count(site_count),
        )
    }
}

/// Label positions per map id, skipping the contig-end rows (label channel 0)
fn parse_cmap_sites(
    reader: impl BufRead,
    path: &Path,
) -> Result<HashMap<u32, Vec<f64>>, ProviderError> {
    let mut sites: HashMap<u32, Vec<f64>> = HashMap::new();

    for_each_record(reader, path, "CMAP", CMAP_POSITION + 1, |fields, line| {
        let id: u32 = parse_field(fields, CMAP_ID, path, "CMAP", line)?;
        let entry = sites.entry(id).or_default();

        if fields[CMAP_LABEL_CHANNEL].trim() != "0" {
            let position: f64 = parse_field(fields, CMAP_POSITION, path, "CMAP", line)?;
            entry.push(position);
        }
        Ok(())
    })?;

    Ok(sites)
}

/// Call `f` with the fields of every data line, checking the column count
fn for_each_record<F>(
    reader: impl BufRead,
    path: &Path,
    format: &'static str,
    min_fields: usize,
    mut f: F,
) -> Result<(), ProviderError>
where
    F: FnMut(&[&str], usize) -> Result<(), ProviderError>,
{
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ProviderError::io(path, e))?;
        let line_num = i + 1;

        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < min_fields {
            return Err(ProviderError::InvalidFormat {
                format,
                path: path.to_path_buf(),
                line: line_num,
                message: format!("expected at least {min_fields} columns, found {}", fields.len()),
            });
        }

        f(&fields, line_num)?;
    }

    Ok(())
}

fn parse_field<T: std::str::FromStr>(
    fields: &[&str],
    index: usize,
    path: &Path,
    format: &'static str,
    line: usize,
) -> Result<T, ProviderError> {
    let raw = fields[index].trim();
    raw.parse().map_err(|_| ProviderError::InvalidFormat {
        format,
        path: path.to_path_buf(),
        line,
        message: format!("invalid value '{raw}' in column {}", index + 1),
    })
}

/// Optical-map provider over a reference CMAP, query CMAP and XMAP
pub struct BionanoCoverageProvider {
    reference_cmap: PathBuf,
    query_cmap: PathBuf,
    xmap: PathBuf,
    index: Option<OpticalMapIndex>,
}

impl BionanoCoverageProvider {
    pub fn new(reference_cmap: &Path, query_cmap: &Path, xmap: &Path) -> Self {
        Self {
            reference_cmap: reference_cmap.to_path_buf(),
            query_cmap: query_cmap.to_path_buf(),
            xmap: xmap.to_path_buf(),
            index: None,
        }
    }
}

impl CoverageProvider for BionanoCoverageProvider {
    fn source_name(&self) -> &str {
        OPTICAL_MAP_SOURCE
    }

    fn kind(&self) -> SourceKind {
        SourceKind::OpticalMap
    }

    fn open(&mut self) -> Result<(), ProviderError> {
        let open = |path: &Path| open_text(path).map_err(|e| ProviderError::io(path, e));

        let index = OpticalMapIndex::load(
            open(&self.reference_cmap)?,
            open(&self.query_cmap)?,
            open(&self.xmap)?,
            [&self.reference_cmap, &self.query_cmap, &self.xmap],
        )?;

        debug!(
            reference_maps = index.sites.len(),
            aligned_maps = index.spans.len(),
            "Loaded optical map alignments"
        );

        self.index = Some(index);
        Ok(())
    }

    fn interval_coverage(
        &mut self,
        region: &ChromosomeRegion,
    ) -> Result<Option<CoverageInfo>, ProviderError> {
        let index = self
            .index
            .as_ref()
            .ok_or_else(|| ProviderError::NotOpen(OPTICAL_MAP_SOURCE.to_string()))?;

        let info = index.coverage(region);
        if info.is_none() {
            debug!(region = %region, "No reference map for chromosome");
        }
        Ok(info)
    }

    fn close(&mut self) {
        self.index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const REF_CMAP: &str = "\
# CMAP File Version:\t0.1
#h CMapId\tContigLength\tNumSites\tSiteID\tLabelChannel\tPosition\tStdDev\tCoverage\tOccurrence
#f int\tfloat\tint\tint\tint\tfloat\tfloat\tint\tint
1\t5000.0\t4\t1\t1\t1000.0\t0.0\t1\t1
1\t5000.0\t4\t2\t1\t2000.0\t0.0\t1\t1
1\t5000.0\t4\t3\t1\t3000.0\t0.0\t1\t1
1\t5000.0\t4\t4\t1\t4000.0\t0.0\t1\t1
1\t5000.0\t4\t5\t0\t5000.0\t0.0\t1\t0
23\t900.0\t1\t1\t1\t500.0\t0.0\t1\t1
23\t900.0\t1\t2\t0\t900.0\t0.0\t1\t0
";

    const QRY_CMAP: &str = "\
#h CMapId\tContigLength\tNumSites\tSiteID\tLabelChannel\tPosition\tStdDev\tCoverage\tOccurrence
100\t3000.0\t1\t1\t1\t10.0\t0.0\t1\t1
101\t3000.0\t1\t1\t1\t10.0\t0.0\t1\t1
102\t3000.0\t1\t1\t1\t10.0\t0.0\t1\t1
";

    const XMAP: &str = "\
#h XmapEntryID\tQryContigID\tRefContigID\tQryStartPos\tQryEndPos\tRefStartPos\tRefEndPos\tOrientation\tConfidence
1\t100\t1\t1.0\t2500.0\t900.0\t3100.0\t+\t20.0
2\t101\t1\t1.0\t2500.0\t2500.0\t1500.0\t-\t15.0
3\t102\t1\t1.0\t2500.0\t2000.0\t4000.0\t+\t30.0
4\t999\t1\t1.0\t2500.0\t0.0\t5000.0\t+\t30.0
";

    fn index() -> OpticalMapIndex {
        OpticalMapIndex::load(
            Cursor::new(REF_CMAP),
            Cursor::new(QRY_CMAP),
            Cursor::new(XMAP),
            [Path::new("ref.cmap"), Path::new("qry.cmap"), Path::new("a.xmap")],
        )
        .unwrap()
    }

    #[test]
    fn test_cmap_id() {
        assert_eq!(cmap_id("chr1"), Some(1));
        assert_eq!(cmap_id("17"), Some(17));
        assert_eq!(cmap_id("chrX"), Some(23));
        assert_eq!(cmap_id("ChrY"), Some(24));
        assert_eq!(cmap_id("chrUn_gl000220"), None);
        assert_eq!(cmap_id("chr"), None);
    }

    #[test]
    fn test_cmap_id_non_ascii() {
        // The third byte falls inside a multi-byte character
        assert_eq!(cmap_id("abé1"), None);
        assert_eq!(cmap_id("chré"), None);
        assert_eq!(cmap_id("é"), None);
    }

    #[test]
    fn test_per_site_depth() {
        let region: ChromosomeRegion = "chr1:1-5000".parse().unwrap();
        let info = index().coverage(&region).unwrap();

        // Sites at 1000, 2000, 3000, 4000; entry 4 has an unknown query map
        // 1000: entry 1
        // 2000: entries 1, 2 (reverse span 1500-2500) and 3
        // 3000: entries 1 and 3
        // 4000: entry 3 (end inclusive)
        assert_eq!(info.coverage, vec![1, 3, 2, 1]);
        assert_eq!(info.site_count, Some(4));
        assert_eq!(info.source, "OM");
        assert_eq!(info.kind, SourceKind::OpticalMap);
        assert_eq!((info.start, info.end), (1, 5000));
    }

    #[test]
    fn test_region_selects_sites() {
        let region: ChromosomeRegion = "chr1:1500-3000".parse().unwrap();
        let info = index().coverage(&region).unwrap();
        assert_eq!(info.coverage, vec![3, 2]);
        assert_eq!(info.site_count, Some(2));
    }

    #[test]
    fn test_map_without_alignments() {
        let region: ChromosomeRegion = "chrX:1-900".parse().unwrap();
        let info = index().coverage(&region).unwrap();
        assert_eq!(info.coverage, vec![0]);
        assert_eq!(info.site_count, Some(1));
    }

    #[test]
    fn test_region_without_sites() {
        let region: ChromosomeRegion = "chr1:4100-4900".parse().unwrap();
        let info = index().coverage(&region).unwrap();
        assert!(info.coverage.is_empty());
        assert_eq!(info.site_count, Some(0));
    }

    #[test]
    fn test_unknown_chromosome() {
        let region: ChromosomeRegion = "chr2:1-100".parse().unwrap();
        assert!(index().coverage(&region).is_none());
        let region: ChromosomeRegion = "scaffold_7:1-100".parse().unwrap();
        assert!(index().coverage(&region).is_none());
    }

    #[test]
    fn test_malformed_xmap() {
        let result = OpticalMapIndex::load(
            Cursor::new(REF_CMAP),
            Cursor::new(QRY_CMAP),
            Cursor::new("1\t100\t1\n"),
            [Path::new("ref.cmap"), Path::new("qry.cmap"), Path::new("bad.xmap")],
        );
        assert!(matches!(
            result,
            Err(ProviderError::InvalidFormat { format: "XMAP", line: 1, .. })
        ));
    }

    #[test]
    fn test_provider_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let ref_path = dir.path().join("ref.cmap");
        let qry_path = dir.path().join("qry.cmap");
        let xmap_path = dir.path().join("aln.xmap");
        std::fs::write(&ref_path, REF_CMAP).unwrap();
        std::fs::write(&qry_path, QRY_CMAP).unwrap();
        std::fs::write(&xmap_path, XMAP).unwrap();

        let mut provider = BionanoCoverageProvider::new(&ref_path, &qry_path, &xmap_path);
        let region: ChromosomeRegion = "chr1:1-5000".parse().unwrap();
        assert!(provider.interval_coverage(&region).is_err());

        provider.open().unwrap();
        let info = provider.interval_coverage(&region).unwrap().unwrap();
        assert_eq!(info.coverage, vec![1, 3, 2, 1]);

        provider.close();
        assert!(provider.interval_coverage(&region).is_err());
    }
}
