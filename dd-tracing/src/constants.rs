// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Tag and metric names stamped onto spans. These are part of the backend
//! contract and must not change.

/// String tags written into span `meta`
pub mod tags {
    /// The trace's stated origin, propagated onto every span
    pub const ORIGIN: &str = "_dd.origin";
    /// Reporting host, written on root spans
    pub const HOSTNAME: &str = "_dd.hostname";
    /// Deployment environment tag
    pub const ENV: &str = "env";
}

/// Numeric metrics written into span `metrics`
pub mod metrics {
    /// The trace's sampling priority, stamped on root spans
    pub const SAMPLING_PRIORITY: &str = "_sampling_priority_v1";
    /// Analytics event sample rate
    pub const EVENT_SAMPLE_RATE: &str = "_dd1.sr.eausr";
    /// Rate applied by the matched sampling rule
    pub const RULE_SAMPLE_RATE: &str = "_dd.rule_psr";
    /// Effective admission rate of the rule limiter
    pub const LIMITER_SAMPLE_RATE: &str = "_dd.limit_psr";
    /// Rate applied by the agent-configured priority sampler
    pub const AGENT_SAMPLE_RATE: &str = "_dd.agent_psr";
}
