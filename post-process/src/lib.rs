//! Glue for the timing CSVs written by the circuit benchmarks: weighted aggregation of
//! repeated runs and one chart per thread count.

pub mod aggregate;
pub mod plot;
pub mod rows;

pub use aggregate::{aggregate, aggregate_file, AggregateError, AggregatedRow};
pub use plot::{plot_by_threads, plot_file, PlotError};
pub use rows::{read_rows, read_rows_from_path, TimingRow};
