// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::time::Duration;

use crate::clock::TimeProvider;
use crate::glob_matcher::GlobMatcher;
use crate::priority_sampler::PrioritySampler;
use crate::rate_limiter::RateLimiter;
use crate::rate_sampler::RateSampler;
use crate::sampling::{SampleResult, SamplingPriority};

/// A user-authored sampling rule matched against (service, operation name).
///
/// An absent pattern matches anything; present patterns are AND-ed.
#[derive(Clone, Debug)]
pub struct SamplingRule {
    /// Optional service pattern
    pub service: Option<String>,
    /// Optional operation name pattern
    pub name: Option<String>,

    rate_sampler: RateSampler,
    service_matcher: Option<GlobMatcher>,
    name_matcher: Option<GlobMatcher>,
}

impl SamplingRule {
    /// Creates a rule keeping traces at `sample_rate` (clamped to [0, 1]).
    pub fn new(sample_rate: f64, service: Option<String>, name: Option<String>) -> Self {
        let service_matcher = service.as_deref().map(GlobMatcher::new);
        let name_matcher = name.as_deref().map(GlobMatcher::new);
        SamplingRule {
            service,
            name,
            rate_sampler: RateSampler::new(sample_rate),
            service_matcher,
            name_matcher,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.rate_sampler.sample_rate()
    }

    /// Whether both patterns accept the given service and operation name.
    pub fn matches(&self, service: &str, name: &str) -> bool {
        if let Some(matcher) = &self.service_matcher {
            if !matcher.matches(service) {
                return false;
            }
        }
        if let Some(matcher) = &self.name_matcher {
            if !matcher.matches(name) {
                return false;
            }
        }
        true
    }

    fn keep(&self, trace_id: u64) -> bool {
        self.rate_sampler.keep(trace_id)
    }
}

/// Result of probing the rule list for a (service, name) pair.
#[derive(Clone, Copy, Debug)]
pub struct RuleMatch {
    pub matched: bool,
    /// The matched rule's rate, NaN when nothing matched
    pub rate: f64,
}

/// The three-layer sampler: user rules first, paced by a token-bucket
/// limiter, with the agent-configured priority sampler as the fallback.
///
/// Rules are evaluated in declaration order and the first match wins. A
/// matched rule yields `User*` priorities, recording that the decision was
/// authored by a user; the fallback path yields `Sampler*` priorities.
pub struct RulesSampler {
    rules: Vec<SamplingRule>,
    priority_sampler: PrioritySampler,
    limiter: RateLimiter,
}

impl fmt::Debug for RulesSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RulesSampler")
            .field("rules", &self.rules)
            .field("limiter", &self.limiter)
            .finish()
    }
}

impl RulesSampler {
    /// Creates a sampler with no rules; every trace falls through to the
    /// priority sampler.
    pub fn new(
        time: TimeProvider,
        max_tokens: u32,
        refresh_interval: Duration,
        tokens_per_refresh: u32,
    ) -> Self {
        Self::with_rules(
            Vec::new(),
            time,
            max_tokens,
            refresh_interval,
            tokens_per_refresh,
        )
    }

    pub fn with_rules(
        rules: Vec<SamplingRule>,
        time: TimeProvider,
        max_tokens: u32,
        refresh_interval: Duration,
        tokens_per_refresh: u32,
    ) -> Self {
        RulesSampler {
            rules,
            priority_sampler: PrioritySampler::new(),
            limiter: RateLimiter::new(time, max_tokens, refresh_interval, tokens_per_refresh),
        }
    }

    /// Replaces the priority sampler's rate table from an agent response.
    /// Safe to call while other threads are sampling.
    pub fn configure_priority_rates<I: IntoIterator<Item = (String, f64)>>(&self, rates: I) {
        self.priority_sampler.configure(rates);
    }

    /// Scans the rules in declaration order and reports the first match.
    pub fn match_rule(&self, service: &str, name: &str) -> RuleMatch {
        match self.rules.iter().find(|rule| rule.matches(service, name)) {
            Some(rule) => RuleMatch {
                matched: true,
                rate: rule.sample_rate(),
            },
            None => RuleMatch {
                matched: false,
                rate: f64::NAN,
            },
        }
    }

    /// Decides the sampling fate of a trace.
    ///
    /// A matched rule applies the consistent selector at the rule's rate
    /// and, when that keeps, asks the limiter for admission. With no match
    /// the priority sampler's result is returned unchanged.
    pub fn sample(&self, env: &str, service: &str, name: &str, trace_id: u64) -> SampleResult {
        let Some(rule) = self.rules.iter().find(|rule| rule.matches(service, name)) else {
            return self.priority_sampler.sample(env, service, trace_id);
        };

        let mut result = SampleResult {
            rule_rate: rule.sample_rate(),
            ..Default::default()
        };

        if !rule.keep(trace_id) {
            result.sampling_priority = Some(SamplingPriority::UserDrop);
            return result;
        }

        let admission = self.limiter.allow();
        result.limiter_rate = admission.effective_rate;
        result.sampling_priority = Some(if admission.allowed {
            SamplingPriority::UserKeep
        } else {
            SamplingPriority::UserDrop
        });
        result
    }
}
