use crate::conf::{ExecutionEnvironment, TelemetryConfig, ENVIRONMENT};
use anyhow::Context;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{layer, Layer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

fn fmt_layer<S>() -> Layer<S> {
    match *ENVIRONMENT {
        ExecutionEnvironment::Bench | ExecutionEnvironment::Integration => layer(),
        ExecutionEnvironment::Local => layer().with_span_events(FmtSpan::CLOSE),
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber: an env filter (`RUST_LOG`, `info` by default), a console
/// layer and, when `log_dir` is configured, a non-blocking json file layer.
///
/// The returned guard flushes the file writer when dropped, so binaries must keep it alive
/// until they exit.
pub fn init_tracing(settings: &TelemetryConfig) -> Result<Option<WorkerGuard>, anyhow::Error> {
    let (file_layer, guard) = match settings.log_dir() {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::never(dir, settings.log_file_name());
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .json();
            (Some(file_layer), Some(guard))
        }
        None => (None, None),
    };

    let json_console = settings.json_logs().then(|| layer().json());
    let plain_console = (!settings.json_logs()).then(fmt_layer);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(json_console)
        .with(plain_console)
        .with(env_filter())
        .try_init()
        .context("Failed to initialize tracing")?;

    info!(
        service = settings.service_name(),
        environment = %*ENVIRONMENT,
        "tracing initialized"
    );
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialization_fails_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let settings = TelemetryConfig::builder()
            .service_name("telemetry-test")
            .log_dir(dir.path())
            .build();
        let first = init_tracing(&settings);
        assert!(first.is_ok());
        assert!(dir.path().exists());
        let second = init_tracing(&TelemetryConfig::default());
        assert!(second.is_err());
    }
}
