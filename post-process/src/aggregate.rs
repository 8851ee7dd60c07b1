use crate::rows::{read_rows_from_path, TimingRow};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("group n_bits={n_bits} threads={threads} has zero iterations in total")]
    ZeroIterations { n_bits: u32, threads: u32 },
}

/// Iteration-weighted means of one `(n_bits, threads)` group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRow {
    pub n_bits: u32,
    pub threads: u32,
    pub avg_cbs_ms: f64,
    pub avg_lut_ms: f64,
    pub avg_total_ms: f64,
    pub iters_total: u64,
}

#[derive(Default)]
struct Sums {
    cbs: f64,
    lut: f64,
    total: f64,
    iters: u64,
}

/// Group by `(n_bits, threads)`, ascending, weighting every row's means by its `iters`.
pub fn aggregate(rows: &[TimingRow]) -> Result<Vec<AggregatedRow>, AggregateError> {
    let mut groups: BTreeMap<(u32, u32), Sums> = BTreeMap::new();
    for row in rows {
        let sums = groups.entry((row.n_bits, row.threads)).or_default();
        let weight = row.iters as f64;
        sums.cbs += row.avg_cbs_ms * weight;
        sums.lut += row.avg_lut_ms * weight;
        sums.total += row.avg_total_ms * weight;
        sums.iters += row.iters;
    }
    groups
        .into_iter()
        .map(|((n_bits, threads), sums)| {
            if sums.iters == 0 {
                return Err(AggregateError::ZeroIterations { n_bits, threads });
            }
            let iters = sums.iters as f64;
            Ok(AggregatedRow {
                n_bits,
                threads,
                avg_cbs_ms: sums.cbs / iters,
                avg_lut_ms: sums.lut / iters,
                avg_total_ms: sums.total / iters,
                iters_total: sums.iters,
            })
        })
        .collect()
}

/// Aggregate the CSV at `input` into a new CSV at `output`, returning the number of groups.
pub fn aggregate_file(input: &Path, output: &Path) -> Result<usize, AggregateError> {
    let rows = read_rows_from_path(input)?;
    let aggregated = aggregate(&rows)?;
    let mut writer = csv::Writer::from_path(output)?;
    for row in &aggregated {
        writer.serialize(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    tracing::info!(
        rows = rows.len(),
        groups = aggregated.len(),
        "aggregated {} into {}",
        input.display(),
        output.display()
    );
    Ok(aggregated.len())
}
