use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use observability::conf::TelemetryConfig;
use observability::telemetry::init_tracing;
use post_process::plot_file;
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "Usage: plot-by-threads <input.csv> [out_dir]";

/// One chart per thread count, n_bits on the x axis and the three timing columns as lines.
#[derive(Parser, Debug)]
#[clap(name = "plot-by-threads")]
struct Args {
    input: PathBuf,
    #[clap(default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> Result<ExitCode, anyhow::Error> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => {
            eprintln!("{USAGE}");
            return Ok(ExitCode::FAILURE);
        }
    };
    let _guard = init_tracing(&TelemetryConfig::default())?;
    let written = plot_file(&args.input, &args.out_dir)
        .with_context(|| format!("failed to plot {}", args.input.display()))?;
    for path in written {
        println!("saved: {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}
