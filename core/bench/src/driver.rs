//! The benchmark run: input set, compilation, isolated timing, spot-checks, report.

use crate::circuit::{CircuitCompiler, CircuitError, CompiledCircuit};
use crate::conf::BenchConfig;
use crate::inputset::{InputSet, InputSetError, InputVector, LayerCounts};
use crate::isolation::{time_multi_core, time_single_core_best_effort, ExecutionMode};
use crate::kernels::{lanes, Kernel, KernelError};
use aes_prng::AesRng;
use itertools::Itertools;
use rand::SeedableRng;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum DriverError {
    #[error(transparent)]
    InputSet(#[from] InputSetError),
    #[error("invalid sample vector")]
    Sample(#[from] KernelError),
    #[error("failed to compile {kernel}")]
    Compile {
        kernel: Kernel,
        #[source]
        source: CircuitError,
    },
    #[error("timed evaluation of {kernel} failed")]
    Evaluate {
        kernel: Kernel,
        #[source]
        source: CircuitError,
    },
    #[error("failed to write report to {}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingSummary {
    pub mode: ExecutionMode,
    pub iterations: usize,
    pub mean_ms: f64,
}

impl TimingSummary {
    fn new(mode: ExecutionMode, samples: &[Duration]) -> Self {
        let total: Duration = samples.iter().sum();
        Self {
            mode,
            iterations: samples.len(),
            mean_ms: total.as_secs_f64() * 1e3 / samples.len().max(1) as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KernelReport {
    pub kernel: Kernel,
    pub compile_ms: f64,
    pub output: Vec<u64>,
    pub expected: Vec<u64>,
    pub single_core: Option<TimingSummary>,
    pub multi_core: Option<TimingSummary>,
}

impl KernelReport {
    pub fn sample_correct(&self) -> bool {
        self.output == self.expected
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckFailure {
    Mismatch {
        kernel: Kernel,
        round: usize,
        input: InputVector,
        expected: Vec<u64>,
        actual: Vec<u64>,
    },
    Error {
        kernel: Kernel,
        round: usize,
        input: InputVector,
        message: String,
    },
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckFailure::Mismatch {
                kernel,
                round,
                input,
                expected,
                actual,
            } => write!(
                f,
                "round {round}: {kernel}({:?}) = {actual:?}, expected {expected:?}",
                input.values()
            ),
            CheckFailure::Error {
                kernel,
                round,
                input,
                message,
            } => write!(
                f,
                "round {round}: {kernel}({:?}) failed: {message}",
                input.values()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchReport {
    pub backend: String,
    pub profile: String,
    pub seed: u64,
    pub bit_width: u32,
    pub input_set_len: usize,
    pub layers: LayerCounts,
    pub fingerprint: String,
    pub kernels: Vec<KernelReport>,
    pub checks_run: usize,
    pub failures: Vec<CheckFailure>,
}

impl BenchReport {
    /// Every sample output and every spot-check matched the plaintext reference.
    pub fn passed(&self) -> bool {
        self.failures.is_empty() && self.kernels.iter().all(KernelReport::sample_correct)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), DriverError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| DriverError::Report {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn fmt_timing(timing: &Option<TimingSummary>) -> String {
    match timing {
        Some(t) => format!("{:.3} ms ({}, n={})", t.mean_ms, t.mode, t.iterations),
        None => "-".to_string(),
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "backend {} | profile {} | seed {} | {} bits",
            self.backend, self.profile, self.seed, self.bit_width
        )?;
        writeln!(
            f,
            "input set: {} vectors (axis {}, extremes {}, pairs {}, random {}, supplied {}) sha3 {}",
            self.input_set_len,
            self.layers.axis,
            self.layers.extremes,
            self.layers.pairs,
            self.layers.random,
            self.layers.supplied,
            self.fingerprint
        )?;
        for k in &self.kernels {
            writeln!(
                f,
                "{:<7} compile {:>10.3} ms | single {} | multi {} | output {:?}{}",
                k.kernel.to_string(),
                k.compile_ms,
                fmt_timing(&k.single_core),
                fmt_timing(&k.multi_core),
                k.output,
                if k.sample_correct() {
                    String::new()
                } else {
                    format!(" (expected {:?})", k.expected)
                }
            )?;
        }
        writeln!(
            f,
            "spot-checks: {}/{} passed",
            self.checks_run - self.failures.len(),
            self.checks_run
        )?;
        for failure in &self.failures {
            writeln!(f, "  {failure}")?;
        }
        write!(f, "{}", if self.passed() { "PASS" } else { "FAIL" })
    }
}

pub struct BenchmarkDriver {
    compiler: Box<dyn CircuitCompiler>,
    conf: BenchConfig,
}

impl BenchmarkDriver {
    pub fn new(compiler: Box<dyn CircuitCompiler>, conf: BenchConfig) -> Self {
        Self { compiler, conf }
    }

    pub fn run(&self) -> Result<BenchReport, DriverError> {
        let conf = &self.conf;
        let sample = conf.sample_vector();
        let sample_lanes = lanes(sample.values())?;

        let shape = conf.shape()?;
        let mut rng = AesRng::seed_from_u64(conf.seed);
        let inputs = InputSet::generate(shape, &conf.coverage(), &mut rng)?;
        let fingerprint = inputs.fingerprint();
        info!(
            profile = %conf.profile,
            seed = conf.seed,
            vectors = inputs.len(),
            %fingerprint,
            "built input set"
        );

        let mut compiled = Vec::new();
        for kernel in Kernel::iter() {
            let start = Instant::now();
            let circuit = self
                .compiler
                .compile(kernel, &inputs)
                .map_err(|source| DriverError::Compile { kernel, source })?;
            let compile_ms = start.elapsed().as_secs_f64() * 1e3;
            info!(%kernel, backend = self.compiler.name(), compile_ms, "compiled");
            compiled.push((circuit, compile_ms));
        }

        let mut kernels = Vec::with_capacity(compiled.len());
        for (circuit, compile_ms) in &compiled {
            let kernel = circuit.kernel();
            let expected = kernel.reference(&sample_lanes);
            let (output, single_core, multi_core) = self.time_sample(circuit.as_ref(), &sample)?;
            let report = KernelReport {
                kernel,
                compile_ms: *compile_ms,
                output,
                expected,
                single_core,
                multi_core,
            };
            info!(
                %kernel,
                output = ?report.output,
                single = %fmt_timing(&report.single_core),
                multi = %fmt_timing(&report.multi_core),
                "sample result"
            );
            if !report.sample_correct() {
                warn!(
                    %kernel,
                    output = ?report.output,
                    expected = ?report.expected,
                    "sample output differs from reference"
                );
            }
            kernels.push(report);
        }

        let mut failures = Vec::new();
        let mut checks_run = 0;
        for round in 0..conf.spot_checks {
            let input = shape.sample(&mut rng);
            for (circuit, _) in &compiled {
                checks_run += 1;
                if let Some(failure) = spot_check(circuit.as_ref(), round, input.clone()) {
                    debug!(%failure, "spot-check failed");
                    failures.push(failure);
                }
            }
        }
        info!(checks_run, failed = failures.len(), "spot-checks done");

        let report = BenchReport {
            backend: self.compiler.name().to_string(),
            profile: conf.profile.to_string(),
            seed: conf.seed,
            bit_width: conf.bit_width,
            input_set_len: inputs.len(),
            layers: *inputs.counts(),
            fingerprint,
            kernels,
            checks_run,
            failures,
        };
        if let Some(path) = &conf.report_path {
            report.write_json(path)?;
            info!("report written to {}", path.display());
        }
        Ok(report)
    }

    #[allow(clippy::type_complexity)]
    fn time_sample(
        &self,
        circuit: &dyn CompiledCircuit,
        sample: &InputVector,
    ) -> Result<(Vec<u64>, Option<TimingSummary>, Option<TimingSummary>), DriverError> {
        let kernel = circuit.kernel();
        let evaluate = || {
            circuit
                .encrypt_run_decrypt(sample)
                .map_err(|source| DriverError::Evaluate { kernel, source })
        };
        let iterations = self.conf.timing_iterations.max(1);
        let mut output = Vec::new();

        let single_core = if self.conf.timing.single() {
            let mut samples = Vec::with_capacity(iterations);
            let mut mode = ExecutionMode::SingleCore;
            for _ in 0..iterations {
                let (result, timing) = time_single_core_best_effort(self.conf.cpu_id, evaluate);
                output = result?;
                mode = timing.mode;
                samples.push(timing.elapsed);
            }
            Some(TimingSummary::new(mode, &samples))
        } else {
            None
        };

        let multi_core = if self.conf.timing.multi() {
            let mut samples = Vec::with_capacity(iterations);
            for _ in 0..iterations {
                let (result, elapsed) = time_multi_core(evaluate);
                output = result?;
                samples.push(elapsed);
            }
            Some(TimingSummary::new(ExecutionMode::MultiCore, &samples))
        } else {
            None
        };

        debug!(
            %kernel,
            single = ?single_core.as_ref().map(|t| t.mean_ms),
            multi = ?multi_core.as_ref().map(|t| t.mean_ms),
            "timed sample"
        );
        Ok((output, single_core, multi_core))
    }
}

fn spot_check(
    circuit: &dyn CompiledCircuit,
    round: usize,
    input: InputVector,
) -> Option<CheckFailure> {
    let kernel = circuit.kernel();
    let expected = match lanes(input.values()) {
        Ok(values) => kernel.reference(&values),
        Err(e) => {
            return Some(CheckFailure::Error {
                kernel,
                round,
                input,
                message: e.to_string(),
            })
        }
    };
    match circuit.encrypt_run_decrypt(&input) {
        Ok(actual) if actual == expected => None,
        Ok(actual) => Some(CheckFailure::Mismatch {
            kernel,
            round,
            input,
            expected,
            actual,
        }),
        Err(e) => Some(CheckFailure::Error {
            kernel,
            round,
            input,
            message: e.to_string(),
        }),
    }
}

/// Kernel names of the failures, for a one-line summary.
pub fn failing_kernels(report: &BenchReport) -> String {
    report
        .failures
        .iter()
        .map(|f| match f {
            CheckFailure::Mismatch { kernel, .. } | CheckFailure::Error { kernel, .. } => *kernel,
        })
        .chain(
            report
                .kernels
                .iter()
                .filter(|k| !k.sample_correct())
                .map(|k| k.kernel),
        )
        .sorted()
        .dedup()
        .join(", ")
}
