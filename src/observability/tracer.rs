//! # Per-Service Tracers
//!
//! [`TracerRegistry`] hands out one OpenTelemetry tracer provider per service
//! name. The first request for a name builds the provider; every later
//! request, from any thread, gets the same `Arc`. Creation happens under the
//! map entry's lock, so concurrent first requests cannot build two.
//!
//! Spans are reported over OTLP/HTTP through a batch processor when a
//! collector endpoint is configured, and to stdout otherwise.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing::{debug, info, warn};

use crate::config::ObservabilityConfig;
use crate::errors::{Result, VaultError};

/// Sample rate used when none is configured.
pub const DEFAULT_SAMPLE_RATE: f64 = 0.1;

/// Where finished spans go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterKind {
    /// Batched OTLP/HTTP export to a collector
    Http,
    /// Pretty-printed to stdout
    Console,
}

/// Collector settings for the HTTP reporter.
#[derive(Debug, Clone, PartialEq)]
pub struct ReporterConfig {
    pub endpoint: String,
    pub headers: HashMap<String, String>,
    pub flush_interval: Duration,
    pub timeout: Duration,
}

impl ReporterConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            headers: HashMap::new(),
            flush_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}

/// How to build a tracer for a service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TracerConfig {
    /// Fraction of traces to sample; [`DEFAULT_SAMPLE_RATE`] when unset
    pub sample_rate: Option<f64>,
    /// Sample everything regardless of `sample_rate`
    pub debug: bool,
    /// Collector to report to; console reporting when unset
    pub reporter: Option<ReporterConfig>,
}

impl TracerConfig {
    pub fn from_observability(config: &ObservabilityConfig) -> Self {
        Self {
            sample_rate: Some(config.trace_sample_rate),
            debug: config.trace_debug,
            reporter: config.trace_endpoint.clone().map(ReporterConfig::new),
        }
    }

    /// The rate actually applied: 1.0 in debug mode.
    pub fn effective_sample_rate(&self) -> f64 {
        if self.debug {
            1.0
        } else {
            self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
        }
    }

    fn sampler(&self) -> Result<Sampler> {
        if self.debug {
            return Ok(Sampler::AlwaysOn);
        }

        let rate = self.effective_sample_rate();
        if !(0.0..=1.0).contains(&rate) {
            return Err(VaultError::validation_field(
                format!("Sample rate must be between 0.0 and 1.0, got {}", rate),
                "sample_rate",
            ));
        }
        Ok(Sampler::TraceIdRatioBased(rate))
    }
}

/// A tracer provider bound to one service name.
pub struct ServiceTracer {
    service_name: String,
    sample_rate: f64,
    reporter: ReporterKind,
    provider: SdkTracerProvider,
}

impl std::fmt::Debug for ServiceTracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceTracer")
            .field("service_name", &self.service_name)
            .field("sample_rate", &self.sample_rate)
            .field("reporter", &self.reporter)
            .finish()
    }
}

impl ServiceTracer {
    fn build(service_name: &str, config: &TracerConfig) -> Result<Self> {
        let resource = Resource::builder().with_service_name(service_name.to_string()).build();
        let builder =
            SdkTracerProvider::builder().with_sampler(config.sampler()?).with_resource(resource);

        let (builder, reporter) = match &config.reporter {
            Some(reporter) => match http_reporter(builder, reporter) {
                Ok(builder) => (builder, ReporterKind::Http),
                Err(HttpReporterUnavailable { builder, reason }) => {
                    warn!(
                        service_name,
                        endpoint = %reporter.endpoint,
                        "{}; reporting spans to console",
                        reason
                    );
                    (console_reporter(builder), ReporterKind::Console)
                }
            },
            None => (console_reporter(builder), ReporterKind::Console),
        };

        Ok(Self {
            service_name: service_name.to_string(),
            sample_rate: config.effective_sample_rate(),
            reporter,
            provider: builder.build(),
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn reporter(&self) -> ReporterKind {
        self.reporter
    }

    pub fn provider(&self) -> &SdkTracerProvider {
        &self.provider
    }

    /// A tracer named after the service.
    pub fn tracer(&self) -> impl opentelemetry::trace::Tracer {
        self.provider.tracer(self.service_name.clone())
    }

    /// Flush pending spans and stop the reporter.
    pub fn shutdown(&self) -> Result<()> {
        self.provider
            .shutdown()
            .map_err(|e| VaultError::tracing(format!("shutdown of '{}': {}", self.service_name, e)))
    }
}

type ProviderBuilder = opentelemetry_sdk::trace::TracerProviderBuilder;

struct HttpReporterUnavailable {
    builder: ProviderBuilder,
    reason: &'static str,
}

fn console_reporter(builder: ProviderBuilder) -> ProviderBuilder {
    builder.with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
}

#[cfg(feature = "otlp")]
fn http_reporter(
    builder: ProviderBuilder,
    config: &ReporterConfig,
) -> std::result::Result<ProviderBuilder, HttpReporterUnavailable> {
    use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
    use opentelemetry_sdk::trace::{BatchConfigBuilder, BatchSpanProcessor};

    let mut exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(config.endpoint.clone())
        .with_timeout(config.timeout);
    if !config.headers.is_empty() {
        exporter = exporter.with_headers(config.headers.clone());
    }

    let exporter = match exporter.build() {
        Ok(exporter) => exporter,
        Err(e) => {
            warn!(endpoint = %config.endpoint, error = %e, "Failed to build OTLP exporter");
            let reason = "OTLP exporter failed to build";
            return Err(HttpReporterUnavailable { builder, reason });
        }
    };

    let batch = BatchConfigBuilder::default().with_scheduled_delay(config.flush_interval).build();
    let processor = BatchSpanProcessor::builder(exporter).with_batch_config(batch).build();
    Ok(builder.with_span_processor(processor))
}

#[cfg(not(feature = "otlp"))]
fn http_reporter(
    builder: ProviderBuilder,
    _config: &ReporterConfig,
) -> std::result::Result<ProviderBuilder, HttpReporterUnavailable> {
    Err(HttpReporterUnavailable { builder, reason: "OTLP exporter not compiled in" })
}

/// Tracers keyed by service name.
///
/// Owned by whoever owns the process lifetime (the CLI keeps one for the
/// whole run); tests build their own for isolation.
#[derive(Default)]
pub struct TracerRegistry {
    tracers: DashMap<String, Arc<ServiceTracer>>,
}

impl std::fmt::Debug for TracerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracerRegistry")
            .field("services", &self.tracers.iter().map(|e| e.key().clone()).collect::<Vec<_>>())
            .finish()
    }
}

impl TracerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tracer for `service_name`, building it on first use.
    ///
    /// `config` is only consulted when the tracer does not exist yet.
    pub fn get_or_create(
        &self,
        service_name: &str,
        config: &TracerConfig,
    ) -> Result<Arc<ServiceTracer>> {
        if let Some(existing) = self.tracers.get(service_name) {
            return Ok(Arc::clone(existing.value()));
        }

        match self.tracers.entry(service_name.to_string()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let tracer = Arc::new(ServiceTracer::build(service_name, config)?);
                info!(
                    service_name,
                    reporter = ?tracer.reporter(),
                    sample_rate = tracer.sample_rate(),
                    "Created tracer"
                );
                entry.insert(Arc::clone(&tracer));
                Ok(tracer)
            }
        }
    }

    pub fn get(&self, service_name: &str) -> Option<Arc<ServiceTracer>> {
        self.tracers.get(service_name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.tracers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracers.is_empty()
    }

    /// Shut down every tracer, reporting the first failure.
    pub fn shutdown_all(&self) -> Result<()> {
        let mut first_error = None;
        for entry in self.tracers.iter() {
            debug!(service_name = %entry.key(), "Shutting down tracer");
            if let Err(e) = entry.value().shutdown() {
                warn!(service_name = %entry.key(), error = %e, "Tracer shutdown failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
