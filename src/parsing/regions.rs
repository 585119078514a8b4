use std::io::BufRead;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::region::ChromosomeRegion;
use crate::utils::io::open_text;

#[derive(Error, Debug)]
pub enum RegionParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid region '{0}', expected chromosome:start-end")]
    InvalidFormat(String),

    #[error("Invalid coordinate '{0}'")]
    InvalidCoordinate(String),

    #[error("Invalid interval {start}-{end}: start must be >= 1 and end >= start")]
    InvalidInterval { start: u64, end: u64 },

    #[error("Missing chromosome name")]
    MissingChromosome,
}

/// Regions read from a region descriptor or region-list file, in input order
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    pub regions: Vec<ChromosomeRegion>,
    /// Number of malformed lines that were logged and skipped
    pub skipped: usize,
}

impl RegionCatalog {
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Append a single region descriptor such as `chr1:100-200`.
    ///
    /// # Errors
    ///
    /// Returns a `RegionParseError` if the descriptor is malformed. Unlike
    /// region-list lines, a malformed explicit region is not skipped.
    pub fn push_descriptor(&mut self, descriptor: &str) -> Result<(), RegionParseError> {
        self.regions.push(descriptor.parse()?);
        Ok(())
    }

    /// Append every region of another catalog, keeping order
    pub fn extend(&mut self, other: RegionCatalog) {
        self.regions.extend(other.regions);
        self.skipped += other.skipped;
    }
}

/// Parse a region-list file (optionally gzip-compressed).
///
/// # Errors
///
/// Returns `RegionParseError::Io` if the file cannot be read. Malformed lines
/// are not errors: they are logged and counted in [`RegionCatalog::skipped`].
pub fn parse_region_file(path: &Path) -> Result<RegionCatalog, RegionParseError> {
    let reader = open_text(path)?;
    let mut catalog = RegionCatalog::default();

    for (i, line) in reader.split(b'\n').enumerate() {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        match String::from_utf8(line) {
            Ok(line) => push_line(&mut catalog, &line, i + 1),
            Err(e) => {
                let text = String::from_utf8_lossy(e.as_bytes());
                warn!(line = i + 1, text = %text, error = %e, "Skipping invalid region line");
                catalog.skipped += 1;
            }
        }
    }

    debug!(
        path = %path.display(),
        regions = catalog.regions.len(),
        skipped = catalog.skipped,
        "Loaded region file"
    );

    Ok(catalog)
}

/// Parse region-list text with one region per line
pub fn parse_region_text(text: &str) -> RegionCatalog {
    let mut catalog = RegionCatalog::default();
    for (i, line) in text.lines().enumerate() {
        push_line(&mut catalog, line, i + 1);
    }
    catalog
}

fn push_line(catalog: &mut RegionCatalog, line: &str, line_num: usize) {
    match parse_line(line) {
        Ok(Some(region)) => catalog.regions.push(region),
        Ok(None) => {}
        Err(e) => {
            warn!(line = line_num, text = %line, error = %e, "Skipping invalid region line");
            catalog.skipped += 1;
        }
    }
}

/// Parse one region-list line.
///
/// Accepted forms are `chromosome:start-end` and
/// `display_name<TAB>chromosome:start-end`. Blank lines and `#` comments yield
/// `Ok(None)`.
///
/// # Errors
///
/// Returns a `RegionParseError` if the region column is malformed.
pub fn parse_line(line: &str) -> Result<Option<ChromosomeRegion>, RegionParseError> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.trim().is_empty() || trimmed.trim_start().starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = trimmed.split('\t').collect();

    let region = if fields.len() == 1 {
        fields[0].parse::<ChromosomeRegion>()?
    } else {
        fields[1].parse::<ChromosomeRegion>()?.with_name(fields[0])
    };

    Ok(Some(region))
}
