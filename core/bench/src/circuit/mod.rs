//! Boundary between the benchmark and the homomorphic compiler/runtime.
//!
//! A [`CircuitCompiler`] turns a kernel and the input set it must support into a
//! [`CompiledCircuit`]. The driver only ever talks to these two traits, so backends are
//! interchangeable and the driver is tested against mocks.

use crate::inputset::{InputSet, InputVector};
use crate::kernels::{Kernel, KernelError};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

pub mod calibrated;
pub mod calibration;
#[cfg(feature = "tfhe")]
pub mod tfhe_backend;

pub use calibrated::{CalibratedCircuit, CalibratedCompiler};
pub use calibration::Calibration;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircuitError {
    #[error("cannot compile against an empty input set")]
    EmptyInputSet,
    #[error(transparent)]
    Shape(#[from] KernelError),
    #[error("input value {value} does not fit the calibrated width of {width} bits")]
    InputOutOfRange { value: u64, width: u32 },
    #[error("{kernel} executed {actual} operations where {expected} were traced")]
    TraceDrift {
        kernel: Kernel,
        expected: usize,
        actual: usize,
    },
    #[error("backend error: {0}")]
    Backend(String),
}

/// A kernel compiled against one input set. Evaluated many times, never persisted.
#[cfg_attr(test, mockall::automock)]
pub trait CompiledCircuit {
    fn kernel(&self) -> Kernel;

    /// Full round trip: encrypt the input, run the circuit, decrypt the outputs.
    fn encrypt_run_decrypt(&self, input: &InputVector) -> Result<Vec<u64>, CircuitError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait CircuitCompiler {
    fn name(&self) -> &'static str;

    fn compile(
        &self,
        kernel: Kernel,
        inputs: &InputSet,
    ) -> Result<Box<dyn CompiledCircuit>, CircuitError>;
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    clap::ValueEnum,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Plaintext model of a circuit whose integer widths were inferred from the input set.
    #[default]
    Calibrated,
    /// TFHE ciphertexts, needs the `tfhe` cargo feature.
    Tfhe,
}

impl BackendKind {
    pub fn compiler(&self) -> Result<Box<dyn CircuitCompiler>, CircuitError> {
        match self {
            BackendKind::Calibrated => Ok(Box::new(CalibratedCompiler)),
            #[cfg(feature = "tfhe")]
            BackendKind::Tfhe => Ok(Box::new(tfhe_backend::TfheCompiler::new())),
            #[cfg(not(feature = "tfhe"))]
            BackendKind::Tfhe => Err(CircuitError::Backend(
                "this binary was built without the tfhe feature".to_string(),
            )),
        }
    }
}
