use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::Serialize;

use crate::parsing::regions::RegionParseError;

/// A chromosomal interval with 1-based inclusive coordinates.
///
/// Identity is `(chromosome, start, end)`. The display name is not part of
/// equality or hashing, so a region parsed from a list file still matches the
/// same interval looked up without a name.
#[derive(Debug, Clone, Serialize)]
pub struct ChromosomeRegion {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChromosomeRegion {
    /// Create a region, rejecting zero starts and inverted intervals.
    ///
    /// # Errors
    ///
    /// Returns `RegionParseError::InvalidInterval` if `start` is 0 or `end < start`.
    pub fn new(
        chromosome: impl Into<String>,
        start: u64,
        end: u64,
    ) -> Result<Self, RegionParseError> {
        let chromosome = chromosome.into();
        if chromosome.is_empty() {
            return Err(RegionParseError::MissingChromosome);
        }
        if start == 0 || end < start {
            return Err(RegionParseError::InvalidInterval { start, end });
        }

        Ok(Self {
            chromosome,
            start,
            end,
            name: None,
        })
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.trim().is_empty() {
            None
        } else {
            Some(name.trim().to_string())
        };
        self
    }

    /// Number of bases covered, both ends included
    #[must_use]
    #[allow(clippy::len_without_is_empty)] // A region always covers at least one base
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Display name, or an empty string when none was given
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Region string with `:` replaced, safe for use in file names
    #[must_use]
    pub fn file_token(&self) -> String {
        self.to_string().replace(':', "_")
    }
}

impl PartialEq for ChromosomeRegion {
    fn eq(&self, other: &Self) -> bool {
        self.chromosome == other.chromosome && self.start == other.start && self.end == other.end
    }
}

impl Eq for ChromosomeRegion {}

impl Hash for ChromosomeRegion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chromosome.hash(state);
        self.start.hash(state);
        self.end.hash(state);
    }
}

impl fmt::Display for ChromosomeRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chromosome, self.start, self.end)
    }
}

impl FromStr for ChromosomeRegion {
    type Err = RegionParseError;

    /// Parse `chromosome:start-end`. Thousands separators in the coordinates
    /// are accepted (`chr1:1,000-2,000`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        // Split on the last ':' so contig names containing ':' still parse
        let (chromosome, interval) = s
            .rsplit_once(':')
            .ok_or_else(|| RegionParseError::InvalidFormat(s.to_string()))?;

        let (start, end) = interval
            .split_once('-')
            .ok_or_else(|| RegionParseError::InvalidFormat(s.to_string()))?;

        let start = parse_coordinate(start)?;
        let end = parse_coordinate(end)?;

        Self::new(chromosome.trim(), start, end)
    }
}

fn parse_coordinate(value: &str) -> Result<u64, RegionParseError> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse()
        .map_err(|_| RegionParseError::InvalidCoordinate(value.trim().to_string()))
}
