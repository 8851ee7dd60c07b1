//! Benchmark harness for small fixed-shape kernels compiled to homomorphic circuits.
//!
//! The pieces, leaf first: [`kernels`] holds the branch-free programs, [`inputset`] generates
//! the sample inputs a circuit is compiled against, [`circuit`] is the compiler boundary and
//! its backends, [`isolation`] pins timed calls to one thread and core, and [`driver`] ties
//! them into a run.

pub mod circuit;
pub mod conf;
pub mod driver;
pub mod inputset;
pub mod isolation;
pub mod kernels;

pub use circuit::{BackendKind, CircuitCompiler, CircuitError, CompiledCircuit};
pub use conf::{BenchConfig, TimingMode};
pub use driver::{BenchReport, BenchmarkDriver, DriverError};
pub use inputset::{CoverageConfig, CoverageProfile, InputSet, InputShape, InputVector};
pub use kernels::{Kernel, Oblivious};
