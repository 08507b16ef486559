// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// A paired wall-clock and monotonic reading taken at the same moment.
///
/// The wall-clock reading is what ends up on spans; the monotonic reading is
/// what rate limiting arithmetic is performed against, so that clock
/// adjustments never distort token accounting.
#[derive(Clone, Copy, Debug)]
pub struct TimePoint {
    pub wall: SystemTime,
    pub tick: Instant,
}

impl TimePoint {
    pub fn now() -> Self {
        TimePoint {
            wall: SystemTime::now(),
            tick: Instant::now(),
        }
    }
}

/// Source of time for samplers. Swapped out for a frozen clock in tests.
pub type TimeProvider = Arc<dyn Fn() -> TimePoint + Send + Sync>;

/// Returns a provider backed by the system clocks.
pub fn system_time_provider() -> TimeProvider {
    Arc::new(TimePoint::now)
}
