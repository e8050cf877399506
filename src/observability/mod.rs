//! # Observability Infrastructure
//!
//! Structured logging for client operations, B3 trace-context propagation
//! for outbound requests, and per-service OpenTelemetry tracers.

pub mod logging;
pub mod trace_context;
pub mod tracer;

pub use logging::{init_logging, log_config_info};
pub use trace_context::{headers_for_trace_id, Sampled, TraceHeader, TraceHeaders, TraceId};
pub use tracer::{
    ReporterConfig, ReporterKind, ServiceTracer, TracerConfig, TracerRegistry, DEFAULT_SAMPLE_RATE,
};

use std::sync::Arc;

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use ::tracing::info;

/// Install logging and build the tracer for the configured service.
///
/// The returned tracer lives in `registry`; call
/// [`TracerRegistry::shutdown_all`] before exit to flush pending spans.
pub fn init_observability(
    config: &ObservabilityConfig,
    registry: &TracerRegistry,
) -> Result<Arc<ServiceTracer>> {
    init_logging(config)?;

    let tracer =
        registry.get_or_create(&config.service_name, &TracerConfig::from_observability(config))?;

    info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        reporter = ?tracer.reporter(),
        "Observability initialized"
    );

    Ok(tracer)
}
