use serde::{Deserialize, Serialize};

/// How a raw coverage array is reduced to a plot series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingType {
    /// One randomly chosen value per bucket
    #[default]
    Random,
    /// Integer mean of each bucket
    Mean,
    /// Lower median of each bucket
    Median,
    /// Every value, no reduction
    None,
}

impl SamplingType {
    /// Parse a sampling type, case-insensitive.
    ///
    /// Unrecognized input falls back to [`SamplingType::Random`] instead of failing.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "mean" => SamplingType::Mean,
            "median" => SamplingType::Median,
            "none" => SamplingType::None,
            _ => SamplingType::Random,
        }
    }
}

impl std::fmt::Display for SamplingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Mean => write!(f, "mean"),
            Self::Median => write!(f, "median"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Chart style used by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotType {
    #[default]
    Histogram,
    /// Step line
    Line,
    /// Smoothed line
    Spline,
}

impl PlotType {
    /// Parse a plot type, case-insensitive, defaulting to [`PlotType::Histogram`]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "line" => PlotType::Line,
            "spline" => PlotType::Spline,
            _ => PlotType::Histogram,
        }
    }
}

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Jpg,
    #[default]
    Png,
    Pdf,
    Svg,
}

impl ImageFormat {
    /// Parse a format token, case-insensitive, defaulting to [`ImageFormat::Png`].
    /// `jpeg` is accepted as an alias of `jpg`.
    pub fn parse(s: &str) -> Self {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpg,
            "pdf" => ImageFormat::Pdf,
            "svg" => ImageFormat::Svg,
            _ => ImageFormat::Png,
        }
    }

    /// File extension, without the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Svg => "svg",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Family of a coverage source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Per-base depth from aligned sequencing reads
    Alignment,
    /// Per-label depth from optical map alignments
    OpticalMap,
}

impl SourceKind {
    /// Token used in output file names
    pub fn file_token(self) -> &'static str {
        match self {
            Self::Alignment => "hts",
            Self::OpticalMap => "om",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_type_parse() {
        assert_eq!(SamplingType::parse("MEAN"), SamplingType::Mean);
        assert_eq!(SamplingType::parse(" median "), SamplingType::Median);
        assert_eq!(SamplingType::parse("none"), SamplingType::None);
        assert_eq!(SamplingType::parse("random"), SamplingType::Random);
        // Typos fall back to the default
        assert_eq!(SamplingType::parse("meen"), SamplingType::Random);
        assert_eq!(SamplingType::parse(""), SamplingType::Random);
    }

    #[test]
    fn test_plot_type_parse() {
        assert_eq!(PlotType::parse("Line"), PlotType::Line);
        assert_eq!(PlotType::parse("spline"), PlotType::Spline);
        assert_eq!(PlotType::parse("bars"), PlotType::Histogram);
    }

    #[test]
    fn test_image_format_parse() {
        assert_eq!(ImageFormat::parse("SVG"), ImageFormat::Svg);
        assert_eq!(ImageFormat::parse("jpeg"), ImageFormat::Jpg);
        assert_eq!(ImageFormat::parse(".pdf"), ImageFormat::Pdf);
        assert_eq!(ImageFormat::parse("tiff"), ImageFormat::Png);
        assert_eq!(ImageFormat::Jpg.extension(), "jpg");
    }
}
