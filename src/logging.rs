//! Tracing setup: stdout always, plus an optional daily-rolling file layer
//! switched on with `AMDE_FILE_LOGS`.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the non-blocking file writer alive; drop it and buffered log lines
/// are lost.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    matches!(
        std::env::var("AMDE_FILE_LOGS").as_deref(),
        Ok("1") | Ok("true")
    )
}

fn file_layer() -> Option<(RollingFileAppender, String)> {
    if !file_logging_enabled() {
        return None;
    }
    let dir = std::env::var("AMDE_LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("log directory {dir} unavailable: {err}");
        return None;
    }
    Some((RollingFileAppender::new(Rotation::DAILY, &dir, "amde.log"), dir))
}

/// Installs the global subscriber. Returns a guard when file logging is on.
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout = fmt::layer().with_target(true);
    let registry = tracing_subscriber::registry().with(filter).with(stdout);

    match file_layer() {
        Some((appender, _dir)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
                .init();
            Some(FileLogGuard { _guard: guard })
        }
        None => {
            registry.init();
            None
        }
    }
}
