use crate::rows::{read_rows_from_path, TimingRow};
use itertools::Itertools;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("cannot create output directory {}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to draw {}: {message}", path.display())]
    Draw { path: PathBuf, message: String },
}

/// Chart file name for one thread count.
pub fn chart_file_name(threads: u32) -> String {
    format!("perf_threads_{threads}_intx.svg")
}

const SERIES: [(&str, RGBColor); 3] = [
    ("avg_cbs_ms", BLUE),
    ("avg_lut_ms", RED),
    ("avg_total_ms", GREEN),
];

fn series_value(row: &TimingRow, idx: usize) -> f64 {
    match idx {
        0 => row.avg_cbs_ms,
        1 => row.avg_lut_ms,
        _ => row.avg_total_ms,
    }
}

/// One SVG per distinct `threads` value, x = `n_bits`, one line per timing column.
///
/// Returns the written paths in ascending thread order.
pub fn plot_by_threads(rows: &[TimingRow], out_dir: &Path) -> Result<Vec<PathBuf>, PlotError> {
    std::fs::create_dir_all(out_dir).map_err(|source| PlotError::OutputDir {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let groups = rows.iter().into_group_map_by(|r| r.threads);
    let mut written = Vec::with_capacity(groups.len());
    for (threads, mut group) in groups.into_iter().sorted_by_key(|(t, _)| *t) {
        group.sort_by_key(|r| r.n_bits);
        let path = out_dir.join(chart_file_name(threads));
        draw_chart(&path, threads, &group).map_err(|e| PlotError::Draw {
            path: path.clone(),
            message: e.to_string(),
        })?;
        tracing::debug!("saved {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn draw_chart(
    path: &Path,
    threads: u32,
    rows: &[&TimingRow],
) -> Result<(), Box<dyn std::error::Error>> {
    let x_min = rows.iter().map(|r| r.n_bits).min().unwrap_or(0);
    let x_max = rows.iter().map(|r| r.n_bits).max().unwrap_or(0);
    let y_max = rows
        .iter()
        .flat_map(|r| (0..SERIES.len()).map(|i| series_value(r, i)))
        .fold(0.0_f64, f64::max);

    let root = SVGBackend::new(path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Threads = {threads}"), ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            x_min.saturating_sub(1)..x_max + 1,
            0.0..(y_max * 1.1).max(1.0),
        )?;
    chart
        .configure_mesh()
        .x_desc("n_bits")
        .y_desc("Time (ms)")
        .x_labels(rows.len() + 2)
        .draw()?;

    for (idx, (label, color)) in SERIES.iter().enumerate() {
        let points = rows
            .iter()
            .map(|r| (r.n_bits, series_value(r, idx)))
            .collect::<Vec<_>>();
        let color = *color;
        chart
            .draw_series(LineSeries::new(points.iter().copied(), &color))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], &color));
        chart.draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, 3, color.filled())),
        )?;
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Read the CSV at `input` and plot it into `out_dir`.
pub fn plot_file(input: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, PlotError> {
    let rows = read_rows_from_path(input)?;
    plot_by_threads(&rows, out_dir)
}
