// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// The priority stamped on a trace once its sampling fate is decided.
///
/// The sign encodes keep/drop (keep iff the value is positive); the
/// `User*`/`Sampler*` split records who made the decision, which the span
/// buffer relies on when deciding whether a reassignment may be honoured.
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplingPriority {
    /// The user asked for this trace to be dropped
    UserDrop = -1,
    /// Automatic sampling decided to drop
    SamplerDrop = 0,
    /// Automatic sampling decided to keep
    SamplerKeep = 1,
    /// The user asked for this trace to be kept
    UserKeep = 2,
}

impl SamplingPriority {
    pub fn into_i8(self) -> i8 {
        self as i8
    }

    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            -1 => Some(SamplingPriority::UserDrop),
            0 => Some(SamplingPriority::SamplerDrop),
            1 => Some(SamplingPriority::SamplerKeep),
            2 => Some(SamplingPriority::UserKeep),
            _ => None,
        }
    }

    pub fn is_keep(&self) -> bool {
        (*self as i8) >= 1
    }

    /// Whether this value was (or claims to have been) set by a user rather
    /// than by automatic sampling.
    pub fn is_user_decision(&self) -> bool {
        matches!(self, SamplingPriority::UserDrop | SamplingPriority::UserKeep)
    }
}

/// The outcome of sampling a trace, with the rates each layer applied.
///
/// A rate of `NaN` means the corresponding layer took no part in the
/// decision; consumers write a metric per non-NaN rate.
#[derive(Clone, Copy, Debug)]
pub struct SampleResult {
    /// Rate of the matched user rule, if any
    pub rule_rate: f64,
    /// Effective admission rate of the limiter, if it was consulted
    pub limiter_rate: f64,
    /// Rate applied by the agent-configured priority sampler, if used
    pub priority_rate: f64,
    /// The priority decided on, if a decision was made
    pub sampling_priority: Option<SamplingPriority>,
}

impl Default for SampleResult {
    fn default() -> Self {
        SampleResult {
            rule_rate: f64::NAN,
            limiter_rate: f64::NAN,
            priority_rate: f64::NAN,
            sampling_priority: None,
        }
    }
}
