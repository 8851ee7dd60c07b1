use super::{Calibration, CircuitCompiler, CircuitError, CompiledCircuit};
use crate::inputset::{InputSet, InputVector};
use crate::kernels::Kernel;

/// Plaintext backend: the circuit is the kernel with every intermediate value held in the
/// number of bits calibration found for it. Values outside the traced ranges wrap, the way
/// an undersized ciphertext would.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalibratedCompiler;

impl CircuitCompiler for CalibratedCompiler {
    fn name(&self) -> &'static str {
        "calibrated"
    }

    fn compile(
        &self,
        kernel: Kernel,
        inputs: &InputSet,
    ) -> Result<Box<dyn CompiledCircuit>, CircuitError> {
        let calibration = Calibration::record(kernel, inputs)?;
        Ok(Box::new(CalibratedCircuit { calibration }))
    }
}

#[derive(Debug, Clone)]
pub struct CalibratedCircuit {
    calibration: Calibration,
}

impl CalibratedCircuit {
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }
}

impl CompiledCircuit for CalibratedCircuit {
    fn kernel(&self) -> Kernel {
        self.calibration.kernel()
    }

    fn encrypt_run_decrypt(&self, input: &InputVector) -> Result<Vec<u64>, CircuitError> {
        self.calibration.replay(input)
    }
}
