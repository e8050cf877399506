//! # Trace Context Propagation
//!
//! Turns an optional trace identifier into B3 headers for outbound calls.
//! Header names come from the closed [`TraceHeader`] set and identifier
//! values are checked when the [`TraceId`] is built, so the resulting
//! [`TraceHeaders`] are always legal HTTP headers.

use std::collections::BTreeMap;
use std::fmt;

use opentelemetry::trace::SpanContext;

use crate::errors::{Result, VaultError};

/// The headers the adapter can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TraceHeader {
    TraceId,
    SpanId,
    ParentId,
    Sampled,
}

impl TraceHeader {
    pub const ALL: [TraceHeader; 4] =
        [TraceHeader::TraceId, TraceHeader::SpanId, TraceHeader::ParentId, TraceHeader::Sampled];

    pub const fn as_str(self) -> &'static str {
        match self {
            TraceHeader::TraceId => "X-B3-TraceId",
            TraceHeader::SpanId => "X-B3-SpanId",
            TraceHeader::ParentId => "X-B3-ParentSpanId",
            TraceHeader::Sampled => "X-B3-Sampled",
        }
    }
}

impl fmt::Display for TraceHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling decision carried by a trace identifier.
///
/// `Unknown` omits the sampled header entirely; it is not the same as `No`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampled {
    #[default]
    Unknown,
    Yes,
    No,
}

impl From<Option<bool>> for Sampled {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Sampled::Unknown,
            Some(true) => Sampled::Yes,
            Some(false) => Sampled::No,
        }
    }
}

/// Trace, span and optional parent identifiers plus the sampling decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId {
    trace_id: String,
    span_id: String,
    parent_id: Option<String>,
    sampled: Sampled,
}

impl TraceId {
    /// Build an identifier from hex trace and span ids.
    pub fn new(trace_id: impl Into<String>, span_id: impl Into<String>) -> Result<Self> {
        let trace_id = trace_id.into();
        let span_id = span_id.into();
        validate_hex_id(&trace_id, "trace_id", &[16, 32])?;
        validate_hex_id(&span_id, "span_id", &[16])?;

        Ok(Self { trace_id, span_id, parent_id: None, sampled: Sampled::Unknown })
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Result<Self> {
        let parent_id = parent_id.into();
        validate_hex_id(&parent_id, "parent_id", &[16])?;
        self.parent_id = Some(parent_id);
        Ok(self)
    }

    pub fn with_sampled(mut self, sampled: Sampled) -> Self {
        self.sampled = sampled;
        self
    }

    /// Capture the identifiers of an OpenTelemetry span.
    ///
    /// Returns `None` for an invalid (unset) span context.
    pub fn from_span_context(context: &SpanContext) -> Option<Self> {
        if !context.is_valid() {
            return None;
        }

        Some(Self {
            trace_id: context.trace_id().to_string(),
            span_id: context.span_id().to_string(),
            parent_id: None,
            sampled: if context.is_sampled() { Sampled::Yes } else { Sampled::No },
        })
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn sampled(&self) -> Sampled {
        self.sampled
    }
}

fn validate_hex_id(value: &str, field: &str, lengths: &[usize]) -> Result<()> {
    if !lengths.contains(&value.len()) || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(VaultError::validation_field(
            format!("{} must be {:?} hex characters", field, lengths),
            field,
        ));
    }
    Ok(())
}

/// Header name to value mapping produced by [`headers_for_trace_id`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceHeaders(BTreeMap<TraceHeader, String>);

impl TraceHeaders {
    pub fn get(&self, header: TraceHeader) -> Option<&str> {
        self.0.get(&header).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TraceHeader, &str)> + '_ {
        self.0.iter().map(|(name, value)| (*name, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// B3 headers for `trace_id`; an empty mapping when there is none.
pub fn headers_for_trace_id(trace_id: Option<&TraceId>) -> TraceHeaders {
    let Some(trace_id) = trace_id else {
        return TraceHeaders::default();
    };

    let mut headers = BTreeMap::new();
    headers.insert(TraceHeader::TraceId, trace_id.trace_id.clone());
    headers.insert(TraceHeader::SpanId, trace_id.span_id.clone());
    headers.insert(TraceHeader::ParentId, trace_id.parent_id.clone().unwrap_or_default());

    match trace_id.sampled {
        Sampled::Yes => {
            headers.insert(TraceHeader::Sampled, "1".to_string());
        }
        Sampled::No => {
            headers.insert(TraceHeader::Sampled, "0".to_string());
        }
        Sampled::Unknown => {}
    }

    TraceHeaders(headers)
}
