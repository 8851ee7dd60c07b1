use anyhow::Context;
use clap::Parser;
use observability::conf::TelemetryConfig;
use observability::telemetry::init_tracing;
use post_process::aggregate_file;
use std::path::PathBuf;

/// Merge repeated timing runs: rows sharing `(n_bits, threads)` are replaced by their
/// iteration-weighted means and the total iteration count.
#[derive(Parser, Debug)]
#[clap(name = "aggregate-timings")]
struct Args {
    /// Timing CSV with columns n_bits, threads, avg_cbs_ms, avg_lut_ms, avg_total_ms, iters.
    #[clap(default_value = "input.csv")]
    input: PathBuf,
    #[clap(default_value = "result.csv")]
    output: PathBuf,
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    let _guard = init_tracing(&TelemetryConfig::default())?;
    let groups = aggregate_file(&args.input, &args.output).with_context(|| {
        format!(
            "failed to aggregate {} into {}",
            args.input.display(),
            args.output.display()
        )
    })?;
    println!("wrote {groups} groups to {}", args.output.display());
    Ok(())
}
