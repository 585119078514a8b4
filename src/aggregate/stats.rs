//! Per-region statistics tables.
//!
//! Columns: `contig_name`, `region`, `length`; then, when an optical map is
//! configured, `om_min .. om_stddev` and `om_site_count`; then for every
//! alignment source in input order `<label>_min .. <label>_stddev`. The layout
//! is fixed for a run. A source without data for a region leaves its fields
//! empty, and a region without data from any source gets no row.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::{AggregateError, Gathered, SourceCoverage};
use crate::core::region::ChromosomeRegion;
use crate::stats::CoverageStatistics;

const STAT_COLUMNS: [&str; 7] = ["min", "q1", "median", "q3", "max", "mean", "stddev"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsFormat {
    #[default]
    Tsv,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSettings {
    pub output: PathBuf,
    pub format: StatsFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceStatistics {
    pub source: String,
    /// `None` when the source has no coverage for the region
    pub statistics: Option<CoverageStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_count: Option<u64>,
}

impl SourceStatistics {
    fn tsv_fields(&self) -> String {
        self.statistics
            .map_or_else(|| "\t".repeat(STAT_COLUMNS.len()), |s| s.tsv_fields())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsRow {
    pub contig_name: String,
    pub region: String,
    pub length: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optical_map: Option<SourceStatistics>,
    pub alignment: Vec<SourceStatistics>,
}

impl StatisticsRow {
    pub fn to_tsv(&self) -> String {
        let mut line = format!("{}\t{}\t{}", self.contig_name, self.region, self.length);

        if let Some(om) = &self.optical_map {
            line.push_str(&om.tsv_fields());
            line.push('\t');
            if let Some(count) = om.site_count {
                line.push_str(&count.to_string());
            }
        }

        for source in &self.alignment {
            line.push_str(&source.tsv_fields());
        }

        line
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSummary {
    pub rows_written: usize,
    pub regions_skipped: usize,
}

/// Header line for the given sources
pub fn header(alignment_labels: &[&str], has_optical_map: bool) -> String {
    let mut columns = vec!["contig_name".to_string(), "region".to_string(), "length".to_string()];

    if has_optical_map {
        columns.extend(STAT_COLUMNS.iter().map(|c| format!("om_{c}")));
        columns.push("om_site_count".to_string());
    }

    for label in alignment_labels {
        columns.extend(STAT_COLUMNS.iter().map(|c| format!("{label}_{c}")));
    }

    columns.join("\t")
}

fn source_statistics(source: &SourceCoverage, region: &ChromosomeRegion) -> SourceStatistics {
    let info = source.get(region);
    SourceStatistics {
        source: source.label.clone(),
        statistics: info.and_then(|i| CoverageStatistics::compute(&i.coverage)),
        site_count: info.and_then(|i| i.site_count),
    }
}

/// One row per region with data, in region order, plus the number of
/// regions skipped for lack of data
pub fn build_rows(
    gathered: &Gathered,
    regions: &[ChromosomeRegion],
) -> (Vec<StatisticsRow>, usize) {
    let mut rows = Vec::with_capacity(regions.len());
    let mut skipped = 0;

    for (i, region) in regions.iter().enumerate() {
        if !gathered.has_data(region) {
            info!(region = %region, "No coverage for region, skipping statistics");
            skipped += 1;
            continue;
        }

        info!(
            name = region.display_name(),
            region = %region,
            "Calculating statistics {}/{}",
            i + 1,
            regions.len()
        );

        rows.push(StatisticsRow {
            contig_name: region.display_name().to_string(),
            region: region.to_string(),
            length: region.len(),
            optical_map: gathered
                .optical_map
                .as_ref()
                .map(|om| source_statistics(om, region)),
            alignment: gathered
                .alignment
                .iter()
                .map(|source| source_statistics(source, region))
                .collect(),
        });
    }

    (rows, skipped)
}

/// Write the statistics table for all regions.
///
/// # Errors
///
/// Returns `AggregateError::Output` if the file cannot be created or written.
pub fn write_statistics(
    gathered: &Gathered,
    regions: &[ChromosomeRegion],
    settings: &StatsSettings,
) -> Result<StatsSummary, AggregateError> {
    let (rows, regions_skipped) = build_rows(gathered, regions);
    let output_error = |source| AggregateError::Output {
        path: settings.output.clone(),
        source,
    };

    let file = File::create(&settings.output).map_err(output_error)?;
    let mut writer = BufWriter::new(file);

    match settings.format {
        StatsFormat::Tsv => {
            let labels: Vec<&str> = gathered.alignment.iter().map(|s| s.label.as_str()).collect();
            let has_optical_map = gathered.optical_map.is_some();
            writeln!(writer, "{}", header(&labels, has_optical_map)).map_err(output_error)?;
            for row in &rows {
                writeln!(writer, "{}", row.to_tsv()).map_err(output_error)?;
            }
        }
        StatsFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &rows)?;
            writeln!(writer).map_err(output_error)?;
        }
    }

    writer.flush().map_err(output_error)?;
    info!(path = %settings.output.display(), rows = rows.len(), "Wrote statistics");

    Ok(StatsSummary {
        rows_written: rows.len(),
        regions_skipped,
    })
}
