// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::constants::{numeric, rate};
use numeric::{KNUTH_FACTOR, MAX_UINT_64BITS};

/// Keeps (100 * `sample_rate`)% of the traces, chosen deterministically by
/// trace id.
///
/// The trace id is hashed with Knuth's multiplicative factor and compared
/// against `sample_rate * 2^64`. Every process that sees the same trace id
/// and the same rate therefore reaches the same keep/drop decision without
/// coordinating, and raising the rate can only turn drops into keeps.
#[derive(Clone)]
pub struct RateSampler {
    sample_rate: f64,
    sampling_id_threshold: u64,
}

impl fmt::Debug for RateSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateSampler")
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

impl RateSampler {
    fn calculate_threshold(rate: f64) -> u64 {
        if rate >= rate::MAX_SAMPLE_RATE {
            MAX_UINT_64BITS
        } else {
            (rate * (MAX_UINT_64BITS as f64)) as u64
        }
    }

    /// `sample_rate` is clamped between 0.0 and 1.0 inclusive.
    pub fn new(sample_rate: f64) -> Self {
        let clamped_rate = sample_rate.clamp(rate::MIN_SAMPLE_RATE, rate::MAX_SAMPLE_RATE);

        RateSampler {
            sample_rate: clamped_rate,
            sampling_id_threshold: Self::calculate_threshold(clamped_rate),
        }
    }

    /// Returns the current sample rate
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Whether the trace with the given id is kept at this sampler's rate.
    pub fn keep(&self, trace_id: u64) -> bool {
        // Fast-path for sample rate of 0.0 (always drop) or 1.0 (always keep)
        if self.sample_rate <= rate::MIN_SAMPLE_RATE {
            return false;
        }
        if self.sample_rate >= rate::MAX_SAMPLE_RATE {
            return true;
        }

        trace_id.wrapping_mul(KNUTH_FACTOR) <= self.sampling_id_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_is_clamped() {
        assert_eq!(RateSampler::new(-0.1).sample_rate(), 0.0);
        assert_eq!(RateSampler::new(0.25).sample_rate(), 0.25);
        assert_eq!(RateSampler::new(1.1).sample_rate(), 1.0);
    }

    #[test]
    fn test_threshold_calculation() {
        assert_eq!(RateSampler::new(0.0).sampling_id_threshold, 0);
        assert_eq!(
            RateSampler::new(0.5).sampling_id_threshold,
            (0.5 * (MAX_UINT_64BITS as f64)) as u64
        );
        assert_eq!(RateSampler::new(1.0).sampling_id_threshold, MAX_UINT_64BITS);
    }

    #[test]
    fn test_boundary_rates() {
        let drop_all = RateSampler::new(0.0);
        let keep_all = RateSampler::new(1.0);
        for trace_id in [0, 1, 42, u64::MAX / 2, u64::MAX] {
            assert!(!drop_all.keep(trace_id));
            assert!(keep_all.keep(trace_id));
        }
    }

    #[test]
    fn test_decision_is_deterministic() {
        let sampler = RateSampler::new(0.5);
        for trace_id in 0..1000u64 {
            assert_eq!(sampler.keep(trace_id), sampler.keep(trace_id));
        }
    }

    #[test]
    fn test_monotone_in_rate() {
        // A higher rate never converts a keep into a drop.
        let low = RateSampler::new(0.2);
        let high = RateSampler::new(0.7);
        for trace_id in 0..10_000u64 {
            if low.keep(trace_id) {
                assert!(high.keep(trace_id), "trace {trace_id} kept at 0.2 but dropped at 0.7");
            }
        }
    }

    #[test]
    fn test_keep_ratio_tracks_rate() {
        let sampler = RateSampler::new(0.5);
        let total = 10_000u64;
        let kept = (1..=total).filter(|id| sampler.keep(*id)).count() as f64;
        let ratio = kept / total as f64;
        assert!(
            (0.45..=0.55).contains(&ratio),
            "expected keep ratio around 0.5, got {ratio}"
        );
    }
}
