use std::io::{self, Write};
use std::path::Path;

use indicatif::MultiProgress;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::config::LogConfig;
use crate::error::{AppError, Result};

/// Stderr writer that hides the progress bars while a log line is printed
#[derive(Clone)]
pub struct ProgressAwareStderr {
    progress: MultiProgress,
}

impl ProgressAwareStderr {
    pub fn new(progress: MultiProgress) -> Self {
        Self { progress }
    }
}

impl Write for ProgressAwareStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.progress.suspend(|| io::stderr().write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.progress.suspend(|| io::stderr().write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Install the global subscriber: stderr plus an append-only log file.
///
/// Stderr output goes through `progress` so log lines never tear the bars.
/// The returned guard flushes the file writer when dropped and must be kept
/// alive for the lifetime of the program.
pub fn init(config: &LogConfig, progress: &MultiProgress) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.level).into())
        .parse_lossy("");

    let stderr = ProgressAwareStderr::new(progress.clone());
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(move || stderr.clone());

    let Some(path) = &config.file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
            .map_err(|e| AppError::Logging(e.to_string()))?;
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| AppError::Logging(format!("invalid log file path: {}", path.display())))?;
    std::fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(Some(guard))
}
