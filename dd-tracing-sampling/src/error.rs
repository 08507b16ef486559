// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors surfaced to the configuration loader. Nothing here is fatal to
/// the sampling core; callers decide whether to reject the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid sampling configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sampling rule {index} has sample_rate {rate}, expected a value in [0, 1]")]
    InvalidSampleRate { index: usize, rate: f64 },
}
