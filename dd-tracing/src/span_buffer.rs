// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dd_tracing_sampling::{RulesSampler, SampleResult, SamplingPriority};

use crate::constants::{metrics, tags};
use crate::log::{Level, Logger};
use crate::span::{SpanContext, SpanData};
use crate::writer::Writer;

/// Buffer-wide options snapshotted onto each trace as it is created.
#[derive(Clone, Debug)]
pub struct SpanBufferOptions {
    /// When false, completed traces are dropped instead of written; the
    /// buffer still samples and cleans up as usual.
    pub enabled: bool,
    /// Reporting hostname stamped on root spans, if set
    pub hostname: Option<String>,
    /// Analytics event sample rate, NaN when unset
    pub analytics_rate: f64,
}

impl Default for SpanBufferOptions {
    fn default() -> Self {
        SpanBufferOptions {
            enabled: true,
            hostname: None,
            analytics_rate: f64::NAN,
        }
    }
}

/// Everything known about a trace whose spans are still arriving.
struct PendingTrace {
    /// Span ids registered for this trace
    all_spans: HashSet<u64>,
    /// Finished spans, in finish order
    finished_spans: Vec<SpanData>,
    sampling_priority: Option<SamplingPriority>,
    /// Once locked, only propagated reassignment is honoured
    sampling_priority_locked: bool,
    origin: Option<String>,
    hostname: Option<String>,
    analytics_rate: f64,
    sample_result: SampleResult,
}

impl PendingTrace {
    /// Applies the per-span decorations ahead of the writer handoff,
    /// treating root / local-root spans as special.
    fn finish(&mut self) {
        let mut spans = std::mem::take(&mut self.finished_spans);
        for span in &mut spans {
            if is_root(span, &self.all_spans) {
                finish_root_span(self, span);
            } else {
                finish_span(self, span);
            }
        }
        self.finished_spans = spans;
    }
}

/// Whether `span` is without a parent among `all_spans_in_trace`. A span
/// whose parent lives in another process is the local root of a
/// distributed trace.
fn is_root(span: &SpanData, all_spans_in_trace: &HashSet<u64>) -> bool {
    span.parent_id == 0 || !all_spans_in_trace.contains(&span.parent_id)
}

/// Decoration applied to every span of the trace.
fn finish_span(trace: &PendingTrace, span: &mut SpanData) {
    // The trace origin rides on every span so that downstream sampling can
    // vary with it.
    if let Some(origin) = &trace.origin {
        span.meta.insert(tags::ORIGIN.to_string(), origin.clone());
    }
}

/// Decorations only root (and local-root) spans receive.
fn finish_root_span(trace: &PendingTrace, span: &mut SpanData) {
    if let Some(priority) = trace.sampling_priority {
        span.metrics.insert(
            metrics::SAMPLING_PRIORITY.to_string(),
            priority.into_i8() as f64,
        );
    }
    if let Some(hostname) = &trace.hostname {
        span.meta.insert(tags::HOSTNAME.to_string(), hostname.clone());
    }
    if !trace.analytics_rate.is_nan() && !span.metrics.contains_key(metrics::EVENT_SAMPLE_RATE) {
        span.metrics
            .insert(metrics::EVENT_SAMPLE_RATE.to_string(), trace.analytics_rate);
    }
    if !trace.sample_result.rule_rate.is_nan() {
        span.metrics.insert(
            metrics::RULE_SAMPLE_RATE.to_string(),
            trace.sample_result.rule_rate,
        );
    }
    if !trace.sample_result.limiter_rate.is_nan() {
        span.metrics.insert(
            metrics::LIMITER_SAMPLE_RATE.to_string(),
            trace.sample_result.limiter_rate,
        );
    }
    if !trace.sample_result.priority_rate.is_nan() {
        span.metrics.insert(
            metrics::AGENT_SAMPLE_RATE.to_string(),
            trace.sample_result.priority_rate,
        );
    }
    finish_span(trace, span);
}

type Traces = HashMap<u64, PendingTrace>;

/// The thread-safe registry of traces whose spans are still in flight.
///
/// Spans enter through `register_span` and leave through `finish_span`;
/// when the last registered span of a trace finishes, the trace is
/// sampled (unless a decision already stands), decorated, and handed to
/// the writer as one batch.
///
/// All state lives behind a single mutex. Nothing performs I/O while
/// holding it except the writer handoff, which is a non-blocking enqueue
/// by contract.
pub struct WritingSpanBuffer {
    logger: Arc<dyn Logger>,
    writer: Arc<dyn Writer>,
    sampler: Arc<RulesSampler>,
    options: SpanBufferOptions,
    traces: Mutex<Traces>,
}

impl WritingSpanBuffer {
    pub fn new(
        logger: Arc<dyn Logger>,
        writer: Arc<dyn Writer>,
        sampler: Arc<RulesSampler>,
        options: SpanBufferOptions,
    ) -> Self {
        WritingSpanBuffer {
            logger,
            writer,
            sampler,
            options,
            traces: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Traces> {
        self.traces.lock().expect("span buffer mutex poisoned")
    }

    /// Records that a span belongs to its trace, creating the pending
    /// trace on first sight. Trace-level metadata (propagated priority,
    /// origin, hostname, analytics rate) is captured at creation; the
    /// propagated priority, when present, locks the sampling decision.
    /// Idempotent per (trace, span).
    pub fn register_span(&self, context: &SpanContext) {
        let mut traces = self.lock();
        let trace = traces
            .entry(context.trace_id)
            .or_insert_with(|| PendingTrace {
                all_spans: HashSet::new(),
                finished_spans: Vec::new(),
                sampling_priority: context.propagated_sampling_priority,
                sampling_priority_locked: context.propagated_sampling_priority.is_some(),
                origin: context.origin.clone(),
                hostname: self.options.hostname.clone(),
                analytics_rate: self.options.analytics_rate,
                sample_result: SampleResult::default(),
            });
        trace.all_spans.insert(context.span_id);
    }

    /// Accepts a finished span. A span for an unknown trace, or one that
    /// was never registered, is logged and dropped. When this was the last
    /// registered span, the trace is sampled (this span being the last
    /// chance to decide), decorated, emitted, and forgotten.
    pub fn finish_span(&self, span: SpanData) {
        let mut traces = self.lock();
        let trace_id = span.trace_id;
        let Some(trace) = traces.get_mut(&trace_id) else {
            self.logger
                .log(Level::Error, "missing trace for finished span");
            return;
        };
        if !trace.all_spans.contains(&span.span_id) {
            self.logger.log(
                Level::Error,
                "a span that was not registered was submitted to the span buffer",
            );
            return;
        }

        let env = span.env().to_string();
        let service = span.service.clone();
        let name = span.name.clone();
        trace.finished_spans.push(span);

        if trace.finished_spans.len() == trace.all_spans.len() {
            self.assign_priority(&mut traces, &env, &service, &name, trace_id);
            if let Some(trace) = traces.get_mut(&trace_id) {
                trace.finish();
            }
            self.unbuffer_and_write(&mut traces, trace_id);
        }
    }

    /// Returns the priority currently stamped on the trace, if any.
    pub fn get_sampling_priority(&self, trace_id: u64) -> Option<SamplingPriority> {
        self.get_priority(&self.lock(), trace_id)
    }

    /// Stores a priority on the trace, subject to the precedence rules:
    /// a locked trace keeps its value, and storing a `Sampler*` value
    /// locks the trace. Returns the priority in effect after the call.
    pub fn set_sampling_priority(
        &self,
        trace_id: u64,
        priority: Option<SamplingPriority>,
    ) -> Option<SamplingPriority> {
        self.set_priority(&mut self.lock(), trace_id, priority)
    }

    /// Runs the sampler for the span's trace unless a decision already
    /// stands, and returns the priority in effect.
    pub fn assign_sampling_priority(&self, span: &SpanData) -> Option<SamplingPriority> {
        self.assign_priority(
            &mut self.lock(),
            span.env(),
            &span.service,
            &span.name,
            span.trace_id,
        )
    }

    pub fn flush(&self, timeout: Duration) {
        self.writer.flush(timeout);
    }

    fn get_priority(&self, traces: &Traces, trace_id: u64) -> Option<SamplingPriority> {
        let Some(trace) = traces.get(&trace_id) else {
            self.logger
                .trace(trace_id, "cannot get sampling priority, trace not found");
            return None;
        };
        trace.sampling_priority
    }

    fn set_priority(
        &self,
        traces: &mut Traces,
        trace_id: u64,
        priority: Option<SamplingPriority>,
    ) -> Option<SamplingPriority> {
        let Some(trace) = traces.get_mut(&trace_id) else {
            self.logger
                .trace(trace_id, "cannot set sampling priority, trace not found");
            return None;
        };
        if trace.sampling_priority_locked {
            // Only report the attempt when it looks deliberate. The sampler
            // routinely retries through this path with a Sampler* value and
            // the unchanged outcome is expected.
            if priority.is_none() || priority.is_some_and(|p| p.is_user_decision()) {
                self.logger
                    .trace(trace_id, "sampling priority already set and cannot be reassigned");
            }
            return trace.sampling_priority;
        }
        trace.sampling_priority = priority;
        if matches!(
            priority,
            Some(SamplingPriority::SamplerKeep | SamplingPriority::SamplerDrop)
        ) {
            trace.sampling_priority_locked = true;
        }
        trace.sampling_priority
    }

    fn assign_priority(
        &self,
        traces: &mut Traces,
        env: &str,
        service: &str,
        name: &str,
        trace_id: u64,
    ) -> Option<SamplingPriority> {
        if self.get_priority(traces, trace_id).is_none() {
            let result = self.sampler.sample(env, service, name, trace_id);
            self.set_priority(traces, trace_id, result.sampling_priority);
            self.set_sampler_result(traces, trace_id, result);
        }
        self.get_priority(traces, trace_id)
    }

    fn set_sampler_result(&self, traces: &mut Traces, trace_id: u64, result: SampleResult) {
        let Some(trace) = traces.get_mut(&trace_id) else {
            self.logger
                .trace(trace_id, "cannot record sampler result, trace not found");
            return;
        };
        trace.sample_result = result;
    }

    fn unbuffer_and_write(&self, traces: &mut Traces, trace_id: u64) {
        let Some(trace) = traces.remove(&trace_id) else {
            return;
        };
        if self.options.enabled {
            self.writer.write(trace.finished_spans);
        }
    }
}
