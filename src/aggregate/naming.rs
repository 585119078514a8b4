//! Output file names and chart titles for batch plots.

use std::path::{Path, PathBuf};

use crate::core::region::ChromosomeRegion;
use crate::core::types::{ImageFormat, SourceKind};

/// `<sample>_<region name>`, or just the sample name for unnamed regions.
/// Empty parts are left out.
pub fn file_prefix(sample_name: &str, region: &ChromosomeRegion) -> String {
    [sample_name, region.display_name()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Path of one batch image.
///
/// `kind` selects the per-source name (`<prefix>_hts_<region>`); `None`
/// names the combined image (`<prefix>_<region>`).
pub fn image_path(
    output_dir: &Path,
    sample_name: &str,
    region: &ChromosomeRegion,
    kind: Option<SourceKind>,
    format: ImageFormat,
) -> PathBuf {
    let mut stem = file_prefix(sample_name, region);
    if let Some(kind) = kind {
        push_part(&mut stem, kind.file_token());
    }
    push_part(&mut stem, &region.file_token());

    output_dir.join(format!("{stem}.{}", format.extension()))
}

fn push_part(stem: &mut String, part: &str) {
    if !stem.is_empty() {
        stem.push('_');
    }
    stem.push_str(part);
}

/// Sample name, region name and region joined by spaces, skipping empty parts
pub fn plot_title(sample_name: &str, region: &ChromosomeRegion) -> String {
    let region_text = region.to_string();
    [sample_name, region.display_name(), region_text.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
