//! Logging setup.
//!
//! Installs a `tracing` subscriber writing pretty or JSON lines, and
//! optionally exports spans over OTLP.

use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::ExporterBuildError;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter,
    fmt::format::FmtSpan,
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::config::{LoggingFormat, TelemetryConfig};

/// Flushes and shuts down the span exporter when dropped.
pub struct OtelGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.as_mut()
            && let Err(err) = provider.shutdown()
        {
            eprintln!("{err:?}");
        }
    }
}

fn resource(name: &str) -> opentelemetry_sdk::Resource {
    opentelemetry_sdk::Resource::builder()
        .with_service_name(name.to_string())
        .with_schema_url(
            [opentelemetry::KeyValue::new(
                opentelemetry_semantic_conventions::attribute::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            )],
            opentelemetry_semantic_conventions::SCHEMA_URL,
        )
        .build()
}

fn init_tracer_provider(name: &str) -> Result<SdkTracerProvider, ExporterBuildError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_resource(resource(name))
        .with_batch_exporter(exporter)
        .build())
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_directives(config: &TelemetryConfig) -> String {
    format!(
        "{},axum={}",
        tracing::Level::from(config.level),
        tracing::Level::from(config.axum_level),
    )
}

fn fmt_layer<S>(format: LoggingFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LoggingFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .boxed(),
        LoggingFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .boxed(),
    }
}

/// Installs the global subscriber. Keep the returned guard alive until exit.
pub fn init(config: &TelemetryConfig) -> Result<OtelGuard, ExporterBuildError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config)));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(config.format));

    if !config.otlp_enabled {
        registry.init();
        return Ok(OtelGuard {
            tracer_provider: None,
        });
    }

    opentelemetry::global::set_text_map_propagator(
        opentelemetry_sdk::propagation::TraceContextPropagator::new(),
    );
    let tracer_provider = init_tracer_provider(&config.service_name)?;
    let tracer = tracer_provider.tracer(config.service_name.clone());

    registry
        .with(tracing_opentelemetry::OpenTelemetryLayer::new(tracer))
        .init();

    Ok(OtelGuard {
        tracer_provider: Some(tracer_provider),
    })
}
