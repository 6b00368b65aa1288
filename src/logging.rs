use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Keeps the file writer thread alive; drop it last.
pub struct LogGuard {
    _guard: WorkerGuard,
}

pub fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse::<LevelFilter>().unwrap_or(LevelFilter::INFO)
}

/// Logs go to a file: the terminal belongs to the renderer while running.
/// `RUST_LOG` overrides `level`.
pub fn init(path: &Path, level: &str) -> Result<LogGuard> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
    }

    let filter = EnvFilter::builder()
        .with_default_directive(parse_level(level).into())
        .from_env_lossy();

    let file = File::create(path).with_context(|| format!("create log file {}", path.display()))?;
    let (writer, worker_guard) = tracing_appender::non_blocking(file);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;

    tracing::info!("logging to {}", path.display());
    Ok(LogGuard {
        _guard: worker_guard,
    })
}
