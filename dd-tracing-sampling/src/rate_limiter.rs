// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::clock::{TimePoint, TimeProvider};

/// Outcome of asking the limiter for admission.
#[derive(Clone, Copy, Debug)]
pub struct LimitResult {
    /// Whether a token was consumed
    pub allowed: bool,
    /// Admit/attempt ratio over the trailing windows
    pub effective_rate: f64,
}

/// A token bucket limiter pacing how often "keep" decisions are admitted.
///
/// Tokens accumulate at `tokens_per_refresh` per `refresh_interval`, capped
/// at `max_tokens`. Refills happen lazily from the injected clock's
/// monotonic reading; a clock that goes backwards simply refills nothing.
pub struct RateLimiter {
    time: TimeProvider,
    max_tokens: u64,
    tokens_per_refresh: u64,
    refresh_interval: Duration,

    /// Inner state protected by a mutex for thread safety
    inner: Mutex<LimiterState>,
}

/// The internal state of the rate limiter
struct LimiterState {
    /// Current number of tokens available
    tokens: u64,

    /// Last time the bucket was brought up to date
    last_refresh: Instant,

    /// Start of the window the admission counters cover
    window_start: Option<Instant>,

    /// Admissions in the current window
    allowed_in_window: u64,

    /// Attempts in the current window
    requested_in_window: u64,

    /// Rate of the previous window, once one has completed
    prev_window_rate: Option<f64>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock().unwrap();
        f.debug_struct("RateLimiter")
            .field("max_tokens", &self.max_tokens)
            .field("tokens", &state.tokens)
            .field("effective_rate", &Self::trailing_rate(&state))
            .finish()
    }
}

impl RateLimiter {
    /// Creates a limiter whose bucket starts full.
    pub fn new(
        time: TimeProvider,
        max_tokens: u32,
        refresh_interval: Duration,
        tokens_per_refresh: u32,
    ) -> Self {
        let start = time();
        RateLimiter {
            time,
            max_tokens: max_tokens as u64,
            tokens_per_refresh: tokens_per_refresh as u64,
            refresh_interval,
            inner: Mutex::new(LimiterState {
                tokens: max_tokens as u64,
                last_refresh: start.tick,
                window_start: None,
                allowed_in_window: 0,
                requested_in_window: 0,
                prev_window_rate: None,
            }),
        }
    }

    /// Consumes a token if one is available at the clock's current reading.
    pub fn allow(&self) -> LimitResult {
        self.allow_at((self.time)())
    }

    /// Consumes a token if one is available at the given time.
    pub fn allow_at(&self, now: TimePoint) -> LimitResult {
        let mut state = self.inner.lock().unwrap();

        self.replenish(&mut state, now.tick);

        let allowed = if state.tokens > 0 {
            state.tokens -= 1;
            true
        } else {
            false
        };

        self.roll_window(&mut state, now.tick);
        if allowed {
            state.allowed_in_window += 1;
        }
        state.requested_in_window += 1;

        LimitResult {
            allowed,
            effective_rate: Self::trailing_rate(&state),
        }
    }

    /// Returns the admit/attempt ratio over the trailing windows.
    pub fn effective_rate(&self) -> f64 {
        Self::trailing_rate(&self.inner.lock().unwrap())
    }

    /// Add tokens for every whole refresh interval elapsed since the last
    /// refill. A timestamp earlier than the last refill adds nothing.
    fn replenish(&self, state: &mut LimiterState, timestamp: Instant) {
        let Some(elapsed) = timestamp.checked_duration_since(state.last_refresh) else {
            return;
        };
        let interval_ns = self.refresh_interval.as_nanos();
        if interval_ns == 0 {
            state.tokens = self.max_tokens;
            state.last_refresh = timestamp;
            return;
        }

        let intervals = (elapsed.as_nanos() / interval_ns) as u64;
        if intervals == 0 {
            return;
        }

        let refill = intervals.saturating_mul(self.tokens_per_refresh);
        state.tokens = state.tokens.saturating_add(refill).min(self.max_tokens);
        if state.tokens == self.max_tokens {
            state.last_refresh = timestamp;
        } else {
            // Advance only by the whole intervals consumed, so the fractional
            // remainder keeps accruing toward the next token.
            state.last_refresh += self.refresh_interval * intervals as u32;
        }
    }

    /// Close out the admission window once it has covered a full refresh
    /// interval, retaining its rate for the trailing average.
    fn roll_window(&self, state: &mut LimiterState, timestamp: Instant) {
        match state.window_start {
            None => state.window_start = Some(timestamp),
            Some(window_start) => {
                let elapsed = timestamp
                    .checked_duration_since(window_start)
                    .unwrap_or_default();
                if elapsed >= self.refresh_interval {
                    state.prev_window_rate = Some(Self::window_rate(state));
                    state.allowed_in_window = 0;
                    state.requested_in_window = 0;
                    state.window_start = Some(timestamp);
                }
            }
        }
    }

    fn window_rate(state: &LimiterState) -> f64 {
        // No attempts yet is effectively a 100% admission rate
        if state.requested_in_window == 0 {
            return 1.0;
        }
        state.allowed_in_window as f64 / state.requested_in_window as f64
    }

    fn trailing_rate(state: &LimiterState) -> f64 {
        match state.prev_window_rate {
            Some(prev_rate) => (Self::window_rate(state) + prev_rate) / 2.0,
            None => Self::window_rate(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// A clock that only moves when told to.
    #[derive(Clone)]
    struct MockClock {
        start: TimePoint,
        offset: Arc<Mutex<Duration>>,
    }

    impl MockClock {
        fn new() -> Self {
            MockClock {
                start: TimePoint::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        fn provider(&self) -> TimeProvider {
            let clock = self.clone();
            Arc::new(move || clock.read())
        }

        fn read(&self) -> TimePoint {
            let offset = *self.offset.lock().unwrap();
            TimePoint {
                wall: self.start.wall + offset,
                tick: self.start.tick + offset,
            }
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }

        fn rewind_to(&self, offset: Duration) {
            *self.offset.lock().unwrap() = offset;
        }
    }

    #[test]
    fn test_bucket_starts_full() {
        let clock = MockClock::new();
        let limiter = RateLimiter::new(clock.provider(), 5, Duration::from_secs(1), 5);

        for _ in 0..5 {
            assert!(limiter.allow().allowed);
        }
        assert!(!limiter.allow().allowed);
    }

    #[test]
    fn test_refill_after_interval() {
        let clock = MockClock::new();
        let limiter = RateLimiter::new(clock.provider(), 2, Duration::from_secs(1), 1);

        assert!(limiter.allow().allowed);
        assert!(limiter.allow().allowed);
        assert!(!limiter.allow().allowed);

        // A partial interval earns nothing
        clock.advance(Duration::from_millis(900));
        assert!(!limiter.allow().allowed);

        // Completing the interval earns one token
        clock.advance(Duration::from_millis(100));
        assert!(limiter.allow().allowed);
        assert!(!limiter.allow().allowed);
    }

    #[test]
    fn test_refill_is_capped() {
        let clock = MockClock::new();
        let limiter = RateLimiter::new(clock.provider(), 2, Duration::from_secs(1), 1);

        assert!(limiter.allow().allowed);
        assert!(limiter.allow().allowed);

        clock.advance(Duration::from_secs(60));
        assert!(limiter.allow().allowed);
        assert!(limiter.allow().allowed);
        assert!(!limiter.allow().allowed);
    }

    #[test]
    fn test_fractional_progress_is_not_lost() {
        let clock = MockClock::new();
        let limiter = RateLimiter::new(clock.provider(), 10, Duration::from_secs(1), 1);
        for _ in 0..10 {
            assert!(limiter.allow().allowed);
        }

        // Two half intervals from different calls add up to one token.
        clock.advance(Duration::from_millis(500));
        assert!(!limiter.allow().allowed);
        clock.advance(Duration::from_millis(500));
        assert!(limiter.allow().allowed);
    }

    #[test]
    fn test_clock_going_backwards_refills_nothing() {
        let clock = MockClock::new();
        let limiter = RateLimiter::new(clock.provider(), 1, Duration::from_secs(1), 1);

        assert!(limiter.allow().allowed);
        clock.advance(Duration::from_secs(2));
        assert!(limiter.allow().allowed);

        clock.rewind_to(Duration::from_millis(500));
        assert!(!limiter.allow().allowed);

        // Once the clock catches back up past the last refill, refills resume.
        clock.rewind_to(Duration::from_secs(4));
        assert!(limiter.allow().allowed);
    }

    #[test]
    fn test_effective_rate_tracks_admissions() {
        let clock = MockClock::new();
        let limiter = RateLimiter::new(clock.provider(), 50, Duration::from_secs(1), 50);

        let mut allowed = 0;
        for _ in 0..100 {
            if limiter.allow().allowed {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 50);

        let rate = limiter.effective_rate();
        assert!(
            (0.45..=0.55).contains(&rate),
            "expected rate around 0.5, got {rate}"
        );
    }

    #[test]
    fn test_effective_rate_spans_two_windows() {
        let clock = MockClock::new();
        let limiter = RateLimiter::new(clock.provider(), 1, Duration::from_secs(1), 1);

        // First window: 1 of 2 admitted.
        assert!(limiter.allow().allowed);
        assert!(!limiter.allow().allowed);

        // Second window: 1 of 1 admitted; trailing rate averages the two.
        clock.advance(Duration::from_secs(1));
        let result = limiter.allow();
        assert!(result.allowed);
        assert_eq!(result.effective_rate, (0.5 + 1.0) / 2.0);
    }

    #[test]
    fn test_thread_safety() {
        let clock = MockClock::new();
        let limiter = Arc::new(RateLimiter::new(
            clock.provider(),
            100,
            Duration::from_secs(1),
            100,
        ));

        let other = Arc::clone(&limiter);
        let handle = std::thread::spawn(move || {
            (0..100).filter(|_| other.allow().allowed).count()
        });
        let here = (0..100).filter(|_| limiter.allow().allowed).count();
        let there = handle.join().unwrap();

        assert_eq!(here + there, 100);
    }
}
