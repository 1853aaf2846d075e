//! Log output formatting shared by every subscriber setup

use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    registry::LookupSpan,
    EnvFilter, Layer,
};

use crate::config::{LogFormat, LoggingConfig};

/// Level filter from `RUST_LOG`, falling back to the configured level
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Formatting layer for the configured output format
pub fn fmt_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    }
}
