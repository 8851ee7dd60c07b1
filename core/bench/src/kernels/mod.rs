//! Fixed-shape, branch-free numeric kernels.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

pub mod oblivious;
pub mod programs;

pub use oblivious::{swap_sorted, Oblivious};
pub use programs::{max5, mean5, sort5, sumsq5, LANES, SORT5_NETWORK};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("kernels take exactly {expected} lanes, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

/// Copy a slice into the fixed lane array every kernel consumes.
pub fn lanes(values: &[u64]) -> Result<[u64; LANES], KernelError> {
    values
        .try_into()
        .map_err(|_| KernelError::ShapeMismatch {
            expected: LANES,
            actual: values.len(),
        })
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum Kernel {
    #[strum(serialize = "sort5")]
    #[serde(rename = "sort5")]
    Sort5,
    #[strum(serialize = "max5")]
    #[serde(rename = "max5")]
    Max5,
    #[strum(serialize = "mean5")]
    #[serde(rename = "mean5")]
    Mean5,
    #[strum(serialize = "sumsq5")]
    #[serde(rename = "sumsq5")]
    SumSq5,
}

impl Kernel {
    /// Number of values the kernel returns.
    pub fn output_arity(&self) -> usize {
        match self {
            Kernel::Sort5 => LANES,
            Kernel::Max5 | Kernel::Mean5 | Kernel::SumSq5 => 1,
        }
    }

    /// Run the kernel over any oblivious value domain.
    pub fn evaluate<T: Oblivious>(&self, input: &[T; LANES]) -> Vec<T> {
        match self {
            Kernel::Sort5 => sort5(input).into(),
            Kernel::Max5 => vec![max5(input)],
            Kernel::Mean5 => vec![mean5(input)],
            Kernel::SumSq5 => vec![sumsq5(input)],
        }
    }

    /// Plaintext result computed without the oblivious network, used to check circuits.
    pub fn reference(&self, input: &[u64; LANES]) -> Vec<u64> {
        match self {
            Kernel::Sort5 => {
                let mut sorted = input.to_vec();
                sorted.sort_unstable();
                sorted
            }
            Kernel::Max5 => vec![input.iter().copied().max().unwrap_or_default()],
            Kernel::Mean5 => vec![input.iter().sum::<u64>() / LANES as u64],
            Kernel::SumSq5 => vec![input.iter().map(|x| x * x).sum()],
        }
    }
}
