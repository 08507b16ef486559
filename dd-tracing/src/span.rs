// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use dd_tracing_sampling::SamplingPriority;

use crate::constants::tags;

/// A finished span as handed to the span buffer.
///
/// The buffer mutates only `meta` and `metrics`; everything else is set by
/// the span's owner before it is finished.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpanData {
    pub trace_id: u64,
    pub span_id: u64,
    /// 0 means the span has no parent
    pub parent_id: u64,

    pub service: String,
    pub name: String,
    pub resource: String,
    pub span_type: String,

    /// Start time, nanoseconds since the epoch
    pub start: i64,
    /// Duration in nanoseconds
    pub duration: i64,
    /// Non-zero when the span carries an error
    pub error: i32,

    pub meta: HashMap<String, String>,
    pub metrics: HashMap<String, f64>,
}

impl SpanData {
    /// The span's deployment environment, read from the `env` meta tag.
    /// Empty when the tag is absent.
    pub fn env(&self) -> &str {
        self.meta.get(tags::ENV).map(String::as_str).unwrap_or("")
    }
}

/// The slice of a span's propagation context the buffer needs when the
/// span is registered.
#[derive(Clone, Debug, Default)]
pub struct SpanContext {
    pub trace_id: u64,
    pub span_id: u64,
    /// Priority carried in from an upstream process, if any. Its presence
    /// locks the trace's sampling decision.
    pub propagated_sampling_priority: Option<SamplingPriority>,
    /// The trace's stated origin, if any
    pub origin: Option<String>,
}
