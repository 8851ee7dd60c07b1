//! Kernels evaluated on TFHE ciphertexts.
//!
//! Calibration picks the ciphertext precision: the smallest `FheUint` type holding the widest
//! value traced on the input set. Kernels then run unchanged over the encrypted lanes since
//! ciphertexts implement [`Oblivious`].

use super::{Calibration, CircuitCompiler, CircuitError, CompiledCircuit};
use crate::inputset::{InputSet, InputVector};
use crate::kernels::{Kernel, Oblivious};
use std::marker::PhantomData;
use std::sync::Arc;
use tfhe::prelude::*;
use tfhe::{
    generate_keys, set_server_key, ClientKey, ConfigBuilder, FheUint16, FheUint32, FheUint64,
    FheUint8, ServerKey,
};
use tracing::info;

macro_rules! impl_oblivious {
    ($($fhe:ty => $clear:ty),* $(,)?) => {
        $(
            impl Oblivious for $fhe {
                fn min(&self, other: &Self) -> Self {
                    FheMin::min(self, other)
                }

                fn max(&self, other: &Self) -> Self {
                    FheMax::max(self, other)
                }

                fn add(&self, other: &Self) -> Self {
                    self + other
                }

                fn mul(&self, other: &Self) -> Self {
                    self * other
                }

                fn div_clear(&self, divisor: u64) -> Self {
                    self / (divisor as $clear)
                }
            }
        )*
    };
}

impl_oblivious!(
    FheUint8 => u8,
    FheUint16 => u16,
    FheUint32 => u32,
    FheUint64 => u64,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    U8,
    U16,
    U32,
    U64,
}

impl Precision {
    /// Smallest ciphertext type holding `width` bits.
    pub fn for_width(width: u32) -> Self {
        match width {
            0..=8 => Precision::U8,
            9..=16 => Precision::U16,
            17..=32 => Precision::U32,
            _ => Precision::U64,
        }
    }
}

pub struct TfheCompiler {
    client_key: Arc<ClientKey>,
    server_key: ServerKey,
}

impl TfheCompiler {
    /// Generates a fresh key pair with the default parameters.
    pub fn new() -> Self {
        let config = ConfigBuilder::default().build();
        let (client_key, server_key) = generate_keys(config);
        Self {
            client_key: Arc::new(client_key),
            server_key,
        }
    }
}

impl Default for TfheCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitCompiler for TfheCompiler {
    fn name(&self) -> &'static str {
        "tfhe"
    }

    fn compile(
        &self,
        kernel: Kernel,
        inputs: &InputSet,
    ) -> Result<Box<dyn CompiledCircuit>, CircuitError> {
        let calibration = Calibration::record(kernel, inputs)?;
        let precision = Precision::for_width(calibration.max_width());
        info!(%kernel, ?precision, "compiled tfhe circuit");
        // the key is thread-local, evaluation happens on the compiling thread
        set_server_key(self.server_key.clone());
        let client_key = Arc::clone(&self.client_key);
        Ok(match precision {
            Precision::U8 => Box::new(TfheCircuit::<FheUint8>::new(calibration, client_key)),
            Precision::U16 => Box::new(TfheCircuit::<FheUint16>::new(calibration, client_key)),
            Precision::U32 => Box::new(TfheCircuit::<FheUint32>::new(calibration, client_key)),
            Precision::U64 => Box::new(TfheCircuit::<FheUint64>::new(calibration, client_key)),
        })
    }
}

pub struct TfheCircuit<F> {
    calibration: Calibration,
    client_key: Arc<ClientKey>,
    _ciphertext: PhantomData<F>,
}

impl<F> TfheCircuit<F> {
    fn new(calibration: Calibration, client_key: Arc<ClientKey>) -> Self {
        Self {
            calibration,
            client_key,
            _ciphertext: PhantomData,
        }
    }
}

impl<F> CompiledCircuit for TfheCircuit<F>
where
    F: Oblivious + FheEncrypt<u64, ClientKey> + FheDecrypt<u64>,
{
    fn kernel(&self) -> Kernel {
        self.calibration.kernel()
    }

    fn encrypt_run_decrypt(&self, input: &InputVector) -> Result<Vec<u64>, CircuitError> {
        let values = self.calibration.check_input(input)?;
        let encrypted = values.map(|v| F::encrypt(v, self.client_key.as_ref()));
        Ok(self
            .kernel()
            .evaluate(&encrypted)
            .iter()
            .map(|ct| ct.decrypt(self.client_key.as_ref()))
            .collect())
    }
}
