//! `plotters` backend for [`Renderer`].
//!
//! SVG output goes through `SVGBackend`, PNG and JPG through `BitMapBackend`
//! (the encoder is chosen from the file extension). PDF is drawn as SVG in
//! memory and converted with `svg2pdf`. Histograms are drawn as
//! filled bars from each sampled point to the next, lines as a step line and
//! splines as a Catmull-Rom curve through the sampled points.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use svg2pdf::usvg;
use svg2pdf::{ConversionOptions, PageOptions};
use tracing::debug;

use crate::core::coverage::CoverageTrack;
use crate::core::types::{ImageFormat, PlotType};
use crate::plot::{prepare, PlotRequest, PreparedPlot, RenderError, Renderer};

const SERIES_ALPHA: f64 = 0.85;
const SPLINE_STEPS: usize = 8;

/// Renders coverage charts to image files with `plotters`
#[derive(Debug, Default, Clone, Copy)]
pub struct ChartRenderer;

impl Renderer for ChartRenderer {
    fn render(
        &self,
        request: &PlotRequest,
        tracks: &[CoverageTrack<'_>],
        path: &Path,
    ) -> Result<(), RenderError> {
        let plot = prepare(request, tracks, &mut rand::thread_rng())
            .ok_or_else(|| RenderError::NoData(request.title.clone()))?;

        let size = (request.width, request.height);
        let result = match request.format {
            ImageFormat::Svg => {
                draw(SVGBackend::new(path, size).into_drawing_area(), request, &plot)
            }
            ImageFormat::Pdf => draw_pdf(path, size, request, &plot),
            ImageFormat::Png | ImageFormat::Jpg => {
                draw(BitMapBackend::new(path, size).into_drawing_area(), request, &plot)
            }
        };

        result.map_err(|message| RenderError::Drawing {
            path: path.to_path_buf(),
            message,
        })?;

        debug!(
            path = %path.display(),
            series = plot.series.len(),
            "Wrote chart"
        );
        Ok(())
    }
}

fn message<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> String {
    err.to_string()
}

fn draw_pdf(
    path: &Path,
    size: (u32, u32),
    request: &PlotRequest,
    plot: &PreparedPlot,
) -> Result<(), String> {
    let mut svg = String::new();
    draw(SVGBackend::with_string(&mut svg, size).into_drawing_area(), request, plot)?;

    let pdf = svg_to_pdf(&svg)?;
    std::fs::write(path, pdf).map_err(|e| e.to_string())
}

/// Convert an SVG document to a single-page PDF. Text is laid out with the
/// system fonts.
pub(crate) fn svg_to_pdf(svg: &str) -> Result<Vec<u8>, String> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &options).map_err(|e| e.to_string())?;
    svg2pdf::to_pdf(&tree, ConversionOptions::default(), PageOptions::default())
        .map_err(|e| format!("PDF conversion failed: {e:?}"))
}

#[allow(clippy::cast_precision_loss)] // Genomic coordinates are far below 2^52
fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    request: &PlotRequest,
    plot: &PreparedPlot,
) -> Result<(), String> {
    root.fill(&WHITE).map_err(message)?;

    let (first, last) = plot.domain;
    let x_end = last + 1;
    let y_max = f64::from(plot.y_max);

    let mut chart = ChartBuilder::on(&root)
        .caption(&request.title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(first as f64..x_end as f64, 0f64..y_max)
        .map_err(message)?;

    chart
        .configure_mesh()
        .x_desc(request.x_label.as_str())
        .y_desc(request.y_label.as_str())
        .x_label_formatter(&|x| format!("{x:.0}"))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()
        .map_err(message)?;

    for (i, series) in plot.series.iter().enumerate() {
        let color = match &plot.colors {
            Some(colors) => {
                let c = colors[i];
                RGBColor(c.0, c.1, c.2).mix(SERIES_ALPHA)
            }
            None => Palette99::pick(i).mix(SERIES_ALPHA),
        };

        let annotation = match request.plot_type {
            PlotType::Histogram => chart.draw_series(
                bar_spans(&series.points, x_end, plot.y_max)
                    .into_iter()
                    .map(|(left, right, value)| {
                        Rectangle::new([(left, 0.0), (right, value)], color.filled())
                    }),
            ),
            PlotType::Line => chart.draw_series(LineSeries::new(
                step_points(&series.points, x_end, plot.y_max),
                color.stroke_width(2),
            )),
            PlotType::Spline => {
                let knots: Vec<(f64, f64)> = series
                    .points
                    .iter()
                    .map(|&(x, v)| (x as f64, f64::from(v)))
                    .collect();
                let curve = catmull_rom(&knots, SPLINE_STEPS)
                    .into_iter()
                    .map(|(x, y)| (x, y.clamp(0.0, y_max)));
                chart.draw_series(LineSeries::new(curve, color.stroke_width(2)))
            }
        }
        .map_err(message)?;

        annotation
            .label(series.label.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(message)?;

    root.present().map_err(message)?;
    Ok(())
}

/// Bars as `(left, right, height)`: each point extends to the next point's
/// position, the last one to `x_end`. Heights are capped at `y_max`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn bar_spans(points: &[(u64, u32)], x_end: u64, y_max: u32) -> Vec<(f64, f64, f64)> {
    points
        .iter()
        .enumerate()
        .map(|(i, &(x, v))| {
            let right = points.get(i + 1).map_or(x_end, |&(next, _)| next);
            (x as f64, right as f64, f64::from(v.min(y_max)))
        })
        .collect()
}

/// Vertices of a step line through the points, ending at `x_end`
#[allow(clippy::cast_precision_loss)]
pub(crate) fn step_points(points: &[(u64, u32)], x_end: u64, y_max: u32) -> Vec<(f64, f64)> {
    bar_spans(points, x_end, y_max)
        .into_iter()
        .flat_map(|(left, right, value)| [(left, value), (right, value)])
        .collect()
}

/// Uniform Catmull-Rom spline through `knots`, `steps` vertices per segment.
/// End segments reuse the end knots as their outer control points.
pub(crate) fn catmull_rom(knots: &[(f64, f64)], steps: usize) -> Vec<(f64, f64)> {
    if knots.len() < 3 || steps == 0 {
        return knots.to_vec();
    }

    let n = knots.len();
    let mut curve = Vec::with_capacity((n - 1) * steps + 1);

    for i in 0..n - 1 {
        let p0 = knots[i.saturating_sub(1)];
        let p1 = knots[i];
        let p2 = knots[i + 1];
        let p3 = knots[(i + 2).min(n - 1)];

        for step in 0..steps {
            #[allow(clippy::cast_precision_loss)]
            let t = step as f64 / steps as f64;
            curve.push((
                catmull_rom_1d(p0.0, p1.0, p2.0, p3.0, t),
                catmull_rom_1d(p0.1, p1.1, p2.1, p3.1, t),
            ));
        }
    }

    curve.push(knots[n - 1]);
    curve
}

fn catmull_rom_1d(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}
