// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use crate::span::SpanData;

/// Destination for completed traces.
///
/// `write` is called with the buffer's mutex held and must only enqueue;
/// anything slow (encoding, I/O) belongs on the writer's own thread.
pub trait Writer: Send + Sync {
    /// Enqueues a completed trace for delivery. Must not block.
    fn write(&self, trace: Vec<SpanData>);

    /// Blocks until previously enqueued traces have been delivered, or
    /// `timeout` has elapsed.
    fn flush(&self, timeout: Duration);
}
