use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// One line of a timing CSV: a benchmark configuration and its mean timings over `iters`
/// iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingRow {
    pub n_bits: u32,
    pub threads: u32,
    pub avg_cbs_ms: f64,
    pub avg_lut_ms: f64,
    pub avg_total_ms: f64,
    pub iters: u64,
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<TimingRow>, csv::Error> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .collect()
}

pub fn read_rows_from_path(path: &Path) -> Result<Vec<TimingRow>, csv::Error> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?
        .deserialize()
        .collect()
}
