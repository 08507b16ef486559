// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::constants::rate::DEFAULT_SAMPLE_RATE;
use crate::rate_sampler::RateSampler;
use crate::sampling::{SampleResult, SamplingPriority};

/// Builds the `"service:<svc>,env:<env>"` key the agent reports rates under.
pub(crate) fn service_env_key(service: &str, env: &str) -> String {
    format!("service:{service},env:{env}")
}

/// Samples traces at per-(service, env) rates pushed down by the agent.
///
/// Until the agent reports anything, every trace is kept at the default
/// rate of 1.0. The rate table is replaced wholesale on `configure`, so a
/// concurrent `sample` sees either the old table or the new one in full.
#[derive(Debug, Default, Clone)]
pub struct PrioritySampler {
    inner: Arc<RwLock<HashMap<String, RateSampler>>>,
}

impl PrioritySampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replaces the per-service rate table.
    pub fn configure<I: IntoIterator<Item = (String, f64)>>(&self, rates: I) {
        let table: HashMap<_, _> = rates
            .into_iter()
            .map(|(key, rate)| (key, RateSampler::new(rate)))
            .collect();
        *self.inner.write().unwrap() = table;
    }

    /// Decides keep/drop for the trace with the rate configured for
    /// `(service, env)`, falling back to the default rate.
    pub fn sample(&self, env: &str, service: &str, trace_id: u64) -> SampleResult {
        let key = service_env_key(service, env);
        let sampler = self
            .inner
            .read()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| RateSampler::new(DEFAULT_SAMPLE_RATE));

        let priority = if sampler.keep(trace_id) {
            SamplingPriority::SamplerKeep
        } else {
            SamplingPriority::SamplerDrop
        };

        SampleResult {
            priority_rate: sampler.sample_rate(),
            sampling_priority: Some(priority),
            ..Default::default()
        }
    }

    // used for testing purposes
    #[allow(dead_code)]
    pub(crate) fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keep_ratio(sampler: &PrioritySampler, env: &str, service: &str, total: u64) -> f64 {
        let mut kept = 0;
        for trace_id in 1..=total {
            let result = sampler.sample(env, service, trace_id);
            let priority = result.sampling_priority.expect("priority always assigned");
            assert!(matches!(
                priority,
                SamplingPriority::SamplerKeep | SamplingPriority::SamplerDrop
            ));
            if priority == SamplingPriority::SamplerKeep {
                kept += 1;
            }
        }
        kept as f64 / total as f64
    }

    #[test]
    fn test_unconfigured_sampler_keeps_everything() {
        let sampler = PrioritySampler::new();
        let result = sampler.sample("", "", 0);
        assert_eq!(result.priority_rate, 1.0);
        assert_eq!(result.sampling_priority, Some(SamplingPriority::SamplerKeep));

        let result = sampler.sample("env", "service", 1);
        assert_eq!(result.priority_rate, 1.0);
        assert_eq!(result.sampling_priority, Some(SamplingPriority::SamplerKeep));
    }

    #[test]
    fn test_unknown_key_uses_default_rate() {
        let sampler = PrioritySampler::new();
        sampler.configure([
            ("service:nginx,env:".to_string(), 0.8),
            ("service:nginx,env:prod".to_string(), 0.2),
        ]);

        let result = sampler.sample("different env", "different service", 1);
        assert_eq!(result.priority_rate, 1.0);
        assert_eq!(result.sampling_priority, Some(SamplingPriority::SamplerKeep));
    }

    #[test]
    fn test_configured_rates_are_applied() {
        let sampler = PrioritySampler::new();
        sampler.configure([
            ("service:nginx,env:".to_string(), 0.8),
            ("service:nginx,env:prod".to_string(), 0.2),
        ]);

        let ratio = keep_ratio(&sampler, "", "nginx", 10_000);
        assert!(
            (0.75..0.85).contains(&ratio),
            "expected keep ratio around 0.8, got {ratio}"
        );

        let ratio = keep_ratio(&sampler, "prod", "nginx", 10_000);
        assert!(
            (0.15..0.25).contains(&ratio),
            "expected keep ratio around 0.2, got {ratio}"
        );
    }

    #[test]
    fn test_configure_replaces_the_whole_table() {
        let sampler = PrioritySampler::new();
        sampler.configure([("service:web,env:staging".to_string(), 0.0)]);
        let result = sampler.sample("staging", "web", 1);
        assert_eq!(result.priority_rate, 0.0);
        assert_eq!(result.sampling_priority, Some(SamplingPriority::SamplerDrop));

        sampler.configure([("service:other,env:".to_string(), 0.5)]);
        // The old key is gone, so the default applies again.
        let result = sampler.sample("staging", "web", 1);
        assert_eq!(result.priority_rate, 1.0);
        assert_eq!(result.sampling_priority, Some(SamplingPriority::SamplerKeep));
    }

    #[test]
    fn test_rates_set_only_the_priority_fields() {
        let sampler = PrioritySampler::new();
        let result = sampler.sample("prod", "web", 7);
        assert!(result.rule_rate.is_nan());
        assert!(result.limiter_rate.is_nan());
    }
}
