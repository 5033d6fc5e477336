//! Structured logging bootstrap using `tracing`.

use std::{env, fs::OpenOptions, sync::Mutex};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global tracing subscriber with sensible defaults.
///
/// When `LOG_FILE` is set, a plain-text copy of every `debug`-and-above event
/// is appended to that file as well.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_level(true)
        .with_line_number(true)
        .with_file(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_filter(env_filter);

    let file_layer = match env::var("LOG_FILE") {
        Ok(path) if !path.is_empty() => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("opening log file {path}"))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_writer(Mutex::new(file))
                    .with_filter(EnvFilter::try_new("debug")?),
            )
        }
        _ => None,
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .init();

    tracing::debug!(level = ?Level::INFO, "tracing initialised");
    Ok(())
}
