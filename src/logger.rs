//! Tracing setup for the CLI. Diagnostics must never share stdout with
//! UCI traffic, so everything goes to stderr or, when a path is given, to
//! a non-blocking file appender.

use std::path::Path;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

static GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
static INIT: OnceLock<()> = OnceLock::new();

fn filter(fallback: &str) -> EnvFilter {
    if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(fallback).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Log to stderr. Idempotent; later calls are no-ops.
pub fn init(fallback_filter: &str) {
    INIT.get_or_init(|| {
        let subscriber = fmt()
            .with_env_filter(filter(fallback_filter))
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Log to a file through a non-blocking writer. Idempotent.
pub fn init_file<P: AsRef<Path>>(path: P, fallback_filter: &str) {
    INIT.get_or_init(|| {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        let file = match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(err) => {
                eprintln!("cannot open log file {}: {err}", path.display());
                return;
            }
        };
        let (writer, guard) = tracing_appender::non_blocking(file);
        let _ = GUARD.set(guard);

        let subscriber = fmt()
            .with_env_filter(filter(fallback_filter))
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
