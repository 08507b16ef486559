// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The trace sampling and span-buffering core of the tracing client.
//!
//! Spans are registered with the [`WritingSpanBuffer`] as they start and
//! handed back as they finish; once the last span of a trace finishes, the
//! trace is sampled, its root span stamped with the sampling metadata, and
//! the whole batch handed to the [`Writer`].

pub mod constants;
pub mod log;

pub(crate) mod span;
pub(crate) mod span_buffer;
pub(crate) mod writer;

pub use span::{SpanContext, SpanData};
pub use span_buffer::{SpanBufferOptions, WritingSpanBuffer};
pub use writer::Writer;

// The sampling stack travels with the buffer's API: sampler handles are
// passed into the buffer and priorities come back out of it.
pub use dd_tracing_sampling::{
    parse_agent_rates, parse_sampling_rules, system_time_provider, ConfigError, PrioritySampler,
    RulesSampler, SampleResult, SamplingPriority, SamplingRule, TimePoint, TimeProvider,
};
