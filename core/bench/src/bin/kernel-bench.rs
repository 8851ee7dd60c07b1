use anyhow::Context;
use clap::Parser;
use fhe_kernel_bench::circuit::BackendKind;
use fhe_kernel_bench::conf::{BenchConfig, TimingMode};
use fhe_kernel_bench::driver::{failing_kernels, BenchmarkDriver};
use fhe_kernel_bench::inputset::CoverageProfile;
use observability::telemetry::init_tracing;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "kernel-bench")]
#[clap(
    about = "Compile the sort5, max5, mean5 and sumsq5 kernels against a generated input set, \
    time one round trip of each on a sample vector pinned to a single core, \
    then spot-check random vectors against the plaintext reference. \n
    Settings are read from config/default, config/kernel_bench, the optional --config file \
    and KERNEL_BENCH__* environment variables, in that order. Flags override all of them. \n
    Use the strict profile for any compile whose results matter."
)]
struct Args {
    /// Configuration file layered over the defaults.
    #[clap(short = 'f', long)]
    config: Option<String>,
    /// Coverage profile of the input set.
    #[clap(long, value_enum)]
    profile: Option<CoverageProfile>,
    /// Seed of the input set and of the spot-check vectors.
    #[clap(long)]
    seed: Option<u64>,
    #[clap(long, value_enum)]
    backend: Option<BackendKind>,
    #[clap(long, value_enum)]
    timing: Option<TimingMode>,
    /// CPU the single-core timings are pinned to.
    #[clap(long)]
    cpu: Option<usize>,
    /// Rounds of randomized spot-checks.
    #[clap(long)]
    checks: Option<usize>,
    /// Write the report as json to this path.
    #[clap(long)]
    report: Option<PathBuf>,
    /// Comma separated sample vector, e.g. 42,17,99,8,63.
    #[clap(long, value_delimiter = ',')]
    sample: Option<Vec<u64>>,
}

impl Args {
    fn apply(self, mut conf: BenchConfig) -> BenchConfig {
        if let Some(profile) = self.profile {
            conf.profile = profile;
        }
        if let Some(seed) = self.seed {
            conf.seed = seed;
        }
        if let Some(backend) = self.backend {
            conf.backend = backend;
        }
        if let Some(timing) = self.timing {
            conf.timing = timing;
        }
        if let Some(cpu) = self.cpu {
            conf.cpu_id = cpu;
        }
        if let Some(checks) = self.checks {
            conf.spot_checks = checks;
        }
        if let Some(report) = self.report {
            conf.report_path = Some(report);
        }
        if let Some(sample) = self.sample {
            conf.sample = sample;
        }
        conf
    }
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    let conf = BenchConfig::load(args.config.as_deref())?;
    let conf = args.apply(conf);
    validator::Validate::validate(&conf).context("invalid command line arguments")?;

    let _guard = init_tracing(&conf.telemetry)?;

    let compiler = conf.backend.compiler()?;
    let report = BenchmarkDriver::new(compiler, conf).run()?;
    println!("{report}");
    if !report.passed() {
        tracing::warn!("checks failed for {}", failing_kernels(&report));
    }
    Ok(())
}
