use crate::circuit::BackendKind;
use crate::inputset::{CoverageConfig, CoverageProfile, InputShape, InputSetError, InputVector};
use crate::kernels::LANES;
use anyhow::Context;
use observability::conf::{Settings, TelemetryConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum_macros::{AsRefStr, Display, EnumString};
use validator::{Validate, ValidationError};

/// Prefix of the environment overrides, e.g. `KERNEL_BENCH__SEED=7`.
pub const ENV_PREFIX: &str = "KERNEL_BENCH";

/// Which timings the driver takes for each kernel.
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
    AsRefStr,
    clap::ValueEnum,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    /// Capped to one thread and pinned to one CPU.
    #[default]
    Single,
    /// Unrestricted, for comparison.
    Multi,
    Both,
}

impl TimingMode {
    pub fn single(&self) -> bool {
        matches!(self, TimingMode::Single | TimingMode::Both)
    }

    pub fn multi(&self) -> bool {
        matches!(self, TimingMode::Multi | TimingMode::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = validate_bench_conf))]
pub struct BenchConfig {
    pub profile: CoverageProfile,
    /// Seeds both the random coverage layer and the spot-check vectors.
    pub seed: u64,
    #[validate(range(min = 1, max = 16))]
    pub bit_width: u32,
    /// Value held by the non-swept lanes, half of the range when unset.
    pub baseline: Option<u64>,
    pub backend: BackendKind,
    pub timing: TimingMode,
    /// Timed round trips per kernel and mode, reported as their mean.
    #[validate(range(min = 1))]
    pub timing_iterations: usize,
    pub cpu_id: usize,
    /// Rounds of randomized spot-checks. Each round draws one vector and checks every kernel
    /// on it.
    pub spot_checks: usize,
    /// Vector used for the timed round trips.
    #[validate(length(equal = 5))]
    pub sample: Vec<u64>,
    pub report_path: Option<PathBuf>,
    pub telemetry: TelemetryConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            profile: CoverageProfile::default(),
            seed: 0,
            bit_width: 8,
            baseline: None,
            backend: BackendKind::default(),
            timing: TimingMode::default(),
            timing_iterations: 1,
            cpu_id: 0,
            spot_checks: 3,
            sample: vec![42, 17, 99, 8, 63],
            report_path: None,
            telemetry: TelemetryConfig::default(),
        }
    }
}

fn validate_bench_conf(conf: &BenchConfig) -> Result<(), ValidationError> {
    if conf.bit_width == 0 || conf.bit_width > 16 {
        // already reported by the field rule
        return Ok(());
    }
    let max = (1_u64 << conf.bit_width) - 1;
    if let Some(value) = conf.sample.iter().find(|&&v| v > max) {
        return Err(ValidationError::new("Sample Out Of Range").with_message(
            format!(
                "Sample value {value} does not fit in {} bits.",
                conf.bit_width
            )
            .into(),
        ));
    }
    if let Some(baseline) = conf.baseline.filter(|&b| b > max) {
        return Err(ValidationError::new("Baseline Out Of Range").with_message(
            format!(
                "Baseline {baseline} does not fit in {} bits.",
                conf.bit_width
            )
            .into(),
        ));
    }
    Ok(())
}

impl BenchConfig {
    /// Layer `config/default`, `config/kernel_bench`, the optional file at `path` and the
    /// `KERNEL_BENCH__*` environment, then validate.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let settings = match path {
            Some(path) => Settings::builder()
                .path(path)
                .env_prefix(ENV_PREFIX)
                .parse_keys(vec!["sample"])
                .build(),
            None => Settings::builder()
                .env_prefix(ENV_PREFIX)
                .parse_keys(vec!["sample"])
                .build(),
        };
        let conf: BenchConfig = settings
            .init_conf()
            .context("failed to load benchmark configuration")?;
        conf.validate()
            .context("invalid benchmark configuration")?;
        Ok(conf)
    }

    pub fn shape(&self) -> Result<InputShape, InputSetError> {
        InputShape::new(LANES, self.bit_width)
    }

    pub fn coverage(&self) -> CoverageConfig {
        CoverageConfig::from(self.profile).with_baseline(self.baseline)
    }

    pub fn sample_vector(&self) -> InputVector {
        self.sample.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn write_conf(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_valid() {
        let conf = BenchConfig::default();
        conf.validate().unwrap();
        assert_eq!(conf.profile, CoverageProfile::Strict);
        assert_eq!(conf.sample_vector(), InputVector::from([42, 17, 99, 8, 63]));
        assert_eq!(conf.shape().unwrap().max_value(), 255);
        assert!(conf.timing.single());
        assert!(!conf.timing.multi());
    }

    #[test]
    #[serial]
    fn load_from_file() {
        let file = write_conf(
            r#"
profile = "quick"
seed = 9
backend = "calibrated"
timing = "both"
sample = [1, 2, 3, 4, 5]

[telemetry]
json_logs = true
"#,
        );
        let conf = BenchConfig::load(file.path().to_str()).unwrap();
        assert_eq!(conf.profile, CoverageProfile::Quick);
        assert_eq!(conf.seed, 9);
        assert_eq!(conf.timing, TimingMode::Both);
        assert_eq!(conf.sample, vec![1, 2, 3, 4, 5]);
        assert_eq!(conf.spot_checks, 3);
        assert!(conf.telemetry.json_logs());
    }

    #[test]
    #[serial]
    fn environment_overrides_file() {
        let file = write_conf("seed = 9\n");
        std::env::set_var("KERNEL_BENCH__SEED", "11");
        std::env::set_var("KERNEL_BENCH__SAMPLE", "5,4,3,2,1");
        let conf = BenchConfig::load(file.path().to_str());
        std::env::remove_var("KERNEL_BENCH__SEED");
        std::env::remove_var("KERNEL_BENCH__SAMPLE");
        let conf = conf.unwrap();
        assert_eq!(conf.seed, 11);
        assert_eq!(conf.sample, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    #[serial]
    fn rejects_invalid_values() {
        let file = write_conf("bit_width = 4\nsample = [1, 2, 3, 4, 16]\n");
        assert!(BenchConfig::load(file.path().to_str()).is_err());

        let file = write_conf("sample = [1, 2, 3]\n");
        assert!(BenchConfig::load(file.path().to_str()).is_err());

        let file = write_conf("bit_width = 17\n");
        assert!(BenchConfig::load(file.path().to_str()).is_err());
    }

    #[test]
    fn schema_checks_baseline() {
        let conf = BenchConfig {
            bit_width: 4,
            sample: vec![0; 5],
            baseline: Some(16),
            ..BenchConfig::default()
        };
        assert!(conf.validate().is_err());
        let conf = BenchConfig {
            baseline: Some(15),
            ..conf
        };
        conf.validate().unwrap();
        assert_eq!(conf.coverage().baseline(), Some(15));
    }
}
