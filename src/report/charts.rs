//! Static SVG charts for the agreement report.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::agreement::{AgreementSummary, PairwiseMatrix};
use crate::scores::{ScoreTable, sample_std_dev};
use crate::util::{ensure_directory, write_text_file};

pub const SCORE_DISTRIBUTION_FILE: &str = "score_distribution.svg";
pub const STD_DISTRIBUTION_FILE: &str = "std_distribution.svg";
pub const SPEARMAN_HEATMAP_FILE: &str = "heatmap_spearman.svg";
pub const CCC_HEATMAP_FILE: &str = "heatmap_ccc.svg";

pub const STD_HISTOGRAM_BINS: usize = 20;
const KDE_GRID_POINTS: usize = 201;

const WIDTH: f64 = 720.0;
const HEIGHT: f64 = 400.0;
const MARGIN: f64 = 50.0;
const PALETTE: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#17becf",
];
const UNDEFINED_FILL: &str = "#cccccc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFile {
    pub title: &'static str,
    pub path: PathBuf,
}

pub fn write_charts(
    dir: &Path,
    table: &ScoreTable,
    summary: &AgreementSummary,
) -> Result<Vec<ChartFile>> {
    ensure_directory(dir)?;

    let charts = [
        (
            "Score distribution by rater",
            SCORE_DISTRIBUTION_FILE,
            render_score_distribution(table),
        ),
        (
            "Cross-rater standard deviation per item",
            STD_DISTRIBUTION_FILE,
            render_std_distribution(&table.std_dev_column()),
        ),
        (
            "Spearman correlation between raters",
            SPEARMAN_HEATMAP_FILE,
            render_heatmap(&summary.spearman, "Spearman (scores)", -1.0, 1.0),
        ),
        (
            "Lin's CCC between raters",
            CCC_HEATMAP_FILE,
            render_heatmap(&summary.ccc, "Lin's CCC", 0.0, 1.0),
        ),
    ];

    let mut written = Vec::with_capacity(charts.len());
    for (title, file_name, svg) in charts {
        let path = dir.join(file_name);
        write_text_file(&path, &svg)?;
        info!(path = %path.display(), "wrote chart");
        written.push(ChartFile { title, path });
    }

    Ok(written)
}

/// Gaussian kernel density of each rater's scores over 0..100 with Scott's
/// bandwidth. Raters whose scores have no spread are listed but not drawn.
pub fn render_score_distribution(table: &ScoreTable) -> String {
    let grid = (0..KDE_GRID_POINTS)
        .map(|step| step as f64 * 100.0 / (KDE_GRID_POINTS - 1) as f64)
        .collect::<Vec<f64>>();

    let curves = table
        .raters()
        .iter()
        .map(|rater| {
            let column = table.column(rater);
            let density = gaussian_kde(&column, &grid);
            (rater.as_str(), density)
        })
        .collect::<Vec<_>>();

    let peak = curves
        .iter()
        .filter_map(|(_, density)| density.as_ref())
        .flatten()
        .copied()
        .fold(0.0_f64, f64::max);
    let y_max = if peak > 0.0 { peak * 1.1 } else { 1.0 };

    let mut svg = String::new();
    open_svg(&mut svg, "Score distribution by rater");
    draw_axes(&mut svg, "Score (0-100)", "Density");
    axis_ticks(&mut svg, 0.0, 100.0);

    for (position, (rater, density)) in curves.iter().enumerate() {
        let color = PALETTE[position % PALETTE.len()];
        if let Some(density) = density {
            let points = grid
                .iter()
                .zip(density)
                .map(|(x, y)| {
                    format!(
                        "{:.2},{:.2}",
                        plot_x(*x / 100.0),
                        plot_y(*y / y_max)
                    )
                })
                .collect::<Vec<String>>()
                .join(" ");
            let _ = writeln!(
                svg,
                r#"<polyline fill="none" stroke="{color}" stroke-width="2" points="{points}"/>"#
            );
        }
        let legend_y = MARGIN + 14.0 + position as f64 * 16.0;
        let _ = writeln!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="10" height="10" fill="{color}"/><text x="{:.1}" y="{:.1}" font-size="11">{}</text>"#,
            WIDTH - MARGIN - 110.0,
            legend_y - 9.0,
            WIDTH - MARGIN - 95.0,
            legend_y,
            escape(rater)
        );
    }

    close_svg(&mut svg);
    svg
}

/// Histogram of per-item standard deviations in [`STD_HISTOGRAM_BINS`] bins.
pub fn render_std_distribution(std_devs: &[f64]) -> String {
    let counts = histogram(std_devs, STD_HISTOGRAM_BINS);
    let upper = histogram_upper(std_devs);
    let tallest = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    let bar_width = (WIDTH - 2.0 * MARGIN) / STD_HISTOGRAM_BINS as f64;

    let mut svg = String::new();
    open_svg(&mut svg, "Cross-rater standard deviation per item");
    draw_axes(&mut svg, "Standard deviation", "Items");
    axis_ticks(&mut svg, 0.0, upper);

    for (bin, count) in counts.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        let top = plot_y(*count as f64 / tallest);
        let _ = writeln!(
            svg,
            r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="#87ceeb" stroke="#4682b4"><title>{count}</title></rect>"##,
            MARGIN + bin as f64 * bar_width,
            top,
            bar_width,
            HEIGHT - MARGIN - top
        );
    }

    close_svg(&mut svg);
    svg
}

/// Annotated rater x rater heatmap. Undefined cells are grey and read `n/a`.
pub fn render_heatmap(matrix: &PairwiseMatrix, title: &str, low: f64, high: f64) -> String {
    let size = matrix.raters.len().max(1);
    let cell = ((HEIGHT - 2.0 * MARGIN) / size as f64).min(80.0);
    let left = MARGIN + 80.0;

    let mut svg = String::new();
    open_svg(&mut svg, title);

    for (row, row_rater) in matrix.raters.iter().enumerate() {
        let y = MARGIN + row as f64 * cell;
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end">{}</text>"#,
            left - 6.0,
            y + cell / 2.0 + 4.0,
            escape(row_rater)
        );
        for col in 0..matrix.raters.len() {
            let x = left + col as f64 * cell;
            let value = matrix.get(row, col);
            let (fill, label) = match value {
                Some(value) => (heat_color(value, low, high), format!("{value:.2}")),
                None => (UNDEFINED_FILL.to_string(), "n/a".to_string()),
            };
            let _ = writeln!(
                svg,
                r##"<rect x="{x:.1}" y="{y:.1}" width="{cell:.1}" height="{cell:.1}" fill="{fill}" stroke="#ffffff"/><text x="{:.1}" y="{:.1}" font-size="11" text-anchor="middle">{label}</text>"##,
                x + cell / 2.0,
                y + cell / 2.0 + 4.0
            );
        }
    }

    for (col, rater) in matrix.raters.iter().enumerate() {
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="middle">{}</text>"#,
            left + col as f64 * cell + cell / 2.0,
            MARGIN + matrix.raters.len() as f64 * cell + 16.0,
            escape(rater)
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-size="10">scale {low:.0} .. {high:.0}</text>"#,
        left,
        HEIGHT - 10.0
    );

    close_svg(&mut svg);
    svg
}

/// Density estimate on `grid`; `None` below two values or without spread.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
    let sigma = sample_std_dev(values)?;
    if !(sigma > 0.0) {
        return None;
    }
    let n = values.len() as f64;
    let bandwidth = sigma * n.powf(-0.2);
    let norm = n * bandwidth * (2.0 * std::f64::consts::PI).sqrt();

    Some(
        grid.iter()
            .map(|x| {
                values
                    .iter()
                    .map(|value| (-0.5 * ((x - value) / bandwidth).powi(2)).exp())
                    .sum::<f64>()
                    / norm
            })
            .collect(),
    )
}

/// Equal-width bins over `0..=max`; the maximum lands in the last bin.
pub fn histogram(values: &[f64], bins: usize) -> Vec<usize> {
    let mut counts = vec![0; bins];
    if bins == 0 {
        return counts;
    }
    let upper = histogram_upper(values);
    for value in values.iter().filter(|value| value.is_finite()) {
        let position = ((value.max(0.0) / upper) * bins as f64) as usize;
        counts[position.min(bins - 1)] += 1;
    }
    counts
}

fn histogram_upper(values: &[f64]) -> f64 {
    let max = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(0.0_f64, f64::max);
    if max > 0.0 { max } else { 1.0 }
}

/// Blue for `low`, white at the midpoint, red for `high`.
fn heat_color(value: f64, low: f64, high: f64) -> String {
    let t = ((value - low) / (high - low)).clamp(0.0, 1.0);
    let (r, g, b) = if t < 0.5 {
        let s = t / 0.5;
        (lerp(59.0, 247.0, s), lerp(76.0, 247.0, s), lerp(192.0, 247.0, s))
    } else {
        let s = (t - 0.5) / 0.5;
        (lerp(247.0, 180.0, s), lerp(247.0, 4.0, s), lerp(247.0, 38.0, s))
    };
    format!("#{:02x}{:02x}{:02x}", r as u8, g as u8, b as u8)
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    (from + (to - from) * t).round()
}

fn plot_x(fraction: f64) -> f64 {
    MARGIN + fraction * (WIDTH - 2.0 * MARGIN)
}

fn plot_y(fraction: f64) -> f64 {
    HEIGHT - MARGIN - fraction * (HEIGHT - 2.0 * MARGIN)
}

fn open_svg(svg: &mut String, title: &str) {
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    let _ = writeln!(svg, "<title>{}</title>", escape(title));
    let _ = writeln!(svg, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##);
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="24" font-size="16" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        escape(title)
    );
}

fn close_svg(svg: &mut String) {
    svg.push_str("</svg>\n");
}

fn draw_axes(svg: &mut String, x_label: &str, y_label: &str) {
    let bottom = HEIGHT - MARGIN;
    let _ = writeln!(
        svg,
        r##"<line x1="{MARGIN}" y1="{bottom}" x2="{:.1}" y2="{bottom}" stroke="#333333"/><line x1="{MARGIN}" y1="{MARGIN}" x2="{MARGIN}" y2="{bottom}" stroke="#333333"/>"##,
        WIDTH - MARGIN
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        HEIGHT - 12.0,
        escape(x_label)
    );
    let _ = writeln!(
        svg,
        r#"<text x="14" y="{:.1}" font-size="12" text-anchor="middle" transform="rotate(-90 14 {:.1})">{}</text>"#,
        HEIGHT / 2.0,
        HEIGHT / 2.0,
        escape(y_label)
    );
}

fn axis_ticks(svg: &mut String, from: f64, to: f64) {
    for step in 0..=4 {
        let fraction = step as f64 / 4.0;
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="10" text-anchor="middle">{:.1}</text>"#,
            plot_x(fraction),
            HEIGHT - MARGIN + 14.0,
            from + fraction * (to - from)
        );
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
