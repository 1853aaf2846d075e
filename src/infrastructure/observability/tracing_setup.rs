//! OpenTelemetry distributed tracing setup

use opentelemetry::{trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    runtime,
    trace::{RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::config::TracingConfig;
use crate::config::LoggingConfig;
use crate::infrastructure::logging::{env_filter, fmt_layer};

/// Initialize the global subscriber: formatted logs plus optional
/// OpenTelemetry export
pub fn init_tracing(logging_config: &LoggingConfig, tracing_config: &TracingConfig) {
    let registry = tracing_subscriber::registry()
        .with(env_filter(logging_config))
        .with(fmt_layer(logging_config));

    if !tracing_config.enabled {
        registry.init();
        tracing::info!(level = %logging_config.level, "Tracing initialized (OpenTelemetry disabled)");
        return;
    }

    match init_otel_tracing(tracing_config) {
        Ok(tracer_provider) => {
            let tracer = tracer_provider.tracer(tracing_config.service_name.clone());
            opentelemetry::global::set_tracer_provider(tracer_provider);

            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .init();

            tracing::info!(
                "Tracing initialized with OpenTelemetry export to {}",
                tracing_config.otlp_endpoint
            );
        }
        Err(e) => {
            registry.init();

            tracing::warn!(
                "Failed to initialize OpenTelemetry: {}. Tracing disabled.",
                e
            );
        }
    }
}

fn sampler(ratio: f64) -> Sampler {
    if ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(ratio)
    }
}

fn init_otel_tracing(
    config: &TracingConfig,
) -> Result<TracerProvider, opentelemetry::trace::TraceError> {
    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        config.service_name.clone(),
    )]);

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otlp_endpoint)
        .build()?;

    let provider = TracerProvider::builder()
        .with_sampler(sampler(config.sampling_ratio))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .with_batch_exporter(exporter, runtime::Tokio)
        .build();

    Ok(provider)
}

/// Shutdown tracing and flush pending spans
pub fn shutdown_tracing() {
    opentelemetry::global::shutdown_tracer_provider();
    tracing::info!("Tracing shutdown complete");
}
