// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rules_sampler::SamplingRule;

/// One entry of the user's `sampling_rules` configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingRuleConfig {
    /// The sample rate to apply when this rule matches (0.0-1.0)
    pub sample_rate: f64,

    /// Optional service name pattern to match
    #[serde(default)]
    pub service: Option<String>,

    /// Optional operation name pattern to match
    #[serde(default)]
    pub name: Option<String>,
}

/// Parses the user's `sampling_rules` JSON array, preserving declaration
/// order. A rate outside [0, 1] (or not a number) rejects the whole list.
pub fn parse_sampling_rules(json: &str) -> Result<Vec<SamplingRule>, ConfigError> {
    let configs: Vec<SamplingRuleConfig> = serde_json::from_str(json)?;

    let mut rules = Vec::with_capacity(configs.len());
    for (index, config) in configs.into_iter().enumerate() {
        if !(0.0..=1.0).contains(&config.sample_rate) {
            return Err(ConfigError::InvalidSampleRate {
                index,
                rate: config.sample_rate,
            });
        }
        rules.push(SamplingRule::new(
            config.sample_rate,
            config.service,
            config.name,
        ));
    }
    Ok(rules)
}

/// The sampling-rate table in the agent's response to a trace flush.
#[derive(Debug, Deserialize)]
pub struct AgentRates {
    #[serde(default)]
    pub rate_by_service: Option<HashMap<String, f64>>,
}

/// Parses the agent response body carrying `rate_by_service`. An absent
/// table yields an empty map, which resets the priority sampler to its
/// default rate.
pub fn parse_agent_rates(body: &str) -> Result<HashMap<String, f64>, ConfigError> {
    let rates: AgentRates = serde_json::from_str(body)?;
    Ok(rates.rate_by_service.unwrap_or_default())
}
