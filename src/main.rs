//! ssr-i18n binary entrypoint kept minimal. The work lives in the library and `args`.

mod args;

use std::fmt;
use std::process::ExitCode;
use std::sync::OnceLock;

use clap::Parser;

struct SsrTimer;

impl tracing_subscriber::fmt::time::FormatTime for SsrTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Local::now()
            .format("%Y-%m-%d-T %H:%M:%S")
            .to_string();
        w.write_str(&ts)
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// What: Initialize tracing, writing to `log_file` when given and stderr otherwise.
///
/// Details:
/// - `RUST_LOG` wins over `level`
/// - A log file that cannot be opened falls back to stderr with a warning
fn init_logging(level: &str, log_file: Option<&std::path::Path>) {
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };

    let open_error = match log_file.map(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
    }) {
        Some(Ok(file)) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(SsrTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            if let Some(path) = log_file {
                tracing::info!(path = %path.display(), "logging initialized");
            }
            return;
        }
        Some(Err(e)) => Some(e),
        None => None,
    };

    // stdout carries command output, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_timer(SsrTimer)
        .init();
    if let Some(e) = open_error {
        tracing::warn!(error = %e, "failed to open log file; using stderr");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = args::Args::parse();
    init_logging(&args::determine_log_level(&args), args.log_file.as_deref());

    tracing::debug!(command = ?args.command, "ssr-i18n starting");
    match args::process_args(&args).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
