use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing::{Span, Subscriber, info_span};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;

use super::{RegistryError, RegistryResult};

/// Install the subscriber for a `generate` run.
///
/// Every event lands in the run's `logs.ndjson`; warnings such as failed
/// samples are also echoed to stderr so they show up next to the SEM output.
pub fn init_run_logging(path: &Path) -> RegistryResult<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    run_subscriber(file, env_filter("info"))
        .try_init()
        .map_err(|err| RegistryError::Logging(err.to_string()))
}

/// Span whose fields are attached to every run log line.
pub fn run_span(run_id: &str) -> Span {
    info_span!("run", run_id = %run_id)
}

/// Human-readable logs on stderr for commands without a run directory.
pub fn init_stderr_logging() -> RegistryResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| RegistryError::Logging(err.to_string()))
}

fn run_subscriber(file: File, filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    let json = tracing_subscriber::fmt::layer()
        .json()
        .with_timer(UtcTime::rfc_3339())
        .with_current_span(true)
        .with_span_list(false)
        .with_writer(Mutex::new(file))
        .with_filter(filter);
    let echo = tracing_subscriber::fmt::layer()
        .compact()
        .without_time()
        .with_target(false)
        .with_writer(io::stderr)
        .with_filter(LevelFilter::WARN);
    tracing_subscriber::registry().with(json).with(echo)
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}
