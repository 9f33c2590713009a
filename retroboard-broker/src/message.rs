//! The wire envelope carried on every bus channel.
//!
//! The bus has no header channel of its own, so the trace-propagation bag
//! rides inside the payload: `{"State": <board>, "Header": {...}}`. The bag
//! carries a W3C `traceparent` entry so the merge worker can attach its
//! persistence span to the session's request trace.

use opentelemetry::global;
use retroboard_data::State;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// A board plus its propagation headers, as published on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "State")]
    pub state: State,
    #[serde(rename = "Header", default)]
    pub header: HashMap<String, String>,
}

impl Envelope {
    /// Wraps a board with an empty header bag.
    pub fn new(state: State) -> Self {
        Self {
            state,
            header: HashMap::new(),
        }
    }

    /// Wraps a board and injects the calling task's trace context into the
    /// header bag via the globally configured propagator.
    pub fn with_current_trace(state: State) -> Self {
        let mut envelope = Self::new(state);
        let cx = tracing::Span::current().context();

        global::get_text_map_propagator(|propagator| {
            propagator.inject_context(&cx, &mut envelope.header);
        });

        envelope
    }

    /// Rebuilds the trace context from the header bag.
    pub fn extract_trace(&self) -> opentelemetry::Context {
        global::get_text_map_propagator(|propagator| propagator.extract(&self.header))
    }
}
