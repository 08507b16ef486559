// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod clock;
pub(crate) mod config;
pub(crate) mod constants;
pub(crate) mod error;
pub(crate) mod glob_matcher;
pub(crate) mod priority_sampler;
pub(crate) mod rate_limiter;
pub(crate) mod rate_sampler;
pub(crate) mod rules_sampler;
pub(crate) mod sampling;

// Re-export key public types
pub use clock::{system_time_provider, TimePoint, TimeProvider};
pub use config::{parse_agent_rates, parse_sampling_rules, AgentRates, SamplingRuleConfig};
pub use error::ConfigError;
pub use priority_sampler::PrioritySampler;
pub use rate_limiter::{LimitResult, RateLimiter};
pub use rate_sampler::RateSampler;
pub use rules_sampler::{RuleMatch, RulesSampler, SamplingRule};
pub use sampling::{SampleResult, SamplingPriority};
