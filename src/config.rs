// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the query abuse guard.
//!
//! Defaults match the reference deployment: depth 5, 50 fields, 10 root
//! fields, 5 aliases, 2 sensitive fields, complexity 50 and 10 requests per
//! client per minute. Configuration is loaded once at startup and is
//! immutable afterwards; an invalid configuration stops the process.

use crate::error::{ConfigError, ConfigIssue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the guard service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Per-client rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Query shape and cost thresholds
    #[serde(default)]
    pub limits: LimitConfig,

    /// Field weights for complexity scoring
    #[serde(default)]
    pub complexity: ComplexityConfig,

    /// Field names counted against `max_sensitive_fields`
    #[serde(default = "default_sensitive_fields")]
    pub sensitive_fields: Vec<String>,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Fixed-window rate limiting per client identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests admitted per client per window (default: 10)
    #[serde(default = "default_rate_limit")]
    pub limit: u32,

    /// Window length in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// How often stale client windows are evicted, in seconds (default: 60)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// Thresholds checked by the validation pipeline. A value is violated when
/// the measured value is strictly greater than it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: u64,

    #[serde(default = "default_max_total_fields")]
    pub max_total_fields: u64,

    #[serde(default = "default_max_root_fields")]
    pub max_root_fields: u64,

    #[serde(default = "default_max_aliases")]
    pub max_aliases: u64,

    #[serde(default = "default_max_sensitive_fields")]
    pub max_sensitive_fields: u64,

    #[serde(default = "default_max_complexity")]
    pub max_complexity: u64,

    /// Enforce `max_depth` (default: true)
    #[serde(default = "default_true")]
    pub enforce_depth: bool,

    /// Enforce the field, root field and alias counts (default: true)
    #[serde(default = "default_true")]
    pub enforce_width: bool,

    /// Enforce `max_sensitive_fields` (default: true)
    #[serde(default = "default_true")]
    pub enforce_sensitive_fields: bool,

    /// Enforce `max_complexity` (default: true)
    #[serde(default = "default_true")]
    pub enforce_complexity: bool,
}

/// Complexity weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityConfig {
    /// Weight of any field no estimator has an opinion on (default: 1)
    #[serde(default = "default_field_weight")]
    pub default_field_weight: u64,

    /// Hand-tuned weights by field name. Signed so that zero or negative
    /// entries can be reported instead of failing deserialization.
    #[serde(default = "default_weights")]
    pub weights: BTreeMap<String, i64>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_rate_limit() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    60
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_max_depth() -> u64 {
    5
}

fn default_max_total_fields() -> u64 {
    50
}

fn default_max_root_fields() -> u64 {
    10
}

fn default_max_aliases() -> u64 {
    5
}

fn default_max_sensitive_fields() -> u64 {
    2
}

fn default_max_complexity() -> u64 {
    50
}

fn default_field_weight() -> u64 {
    1
}

fn default_weights() -> BTreeMap<String, i64> {
    BTreeMap::from([
        ("friends".to_string(), 5),
        ("users".to_string(), 2),
        ("systemUpdate".to_string(), 20),
    ])
}

fn default_sensitive_fields() -> Vec<String> {
    vec!["password".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            limits: LimitConfig::default(),
            complexity: ComplexityConfig::default(),
            sensitive_fields: default_sensitive_fields(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: default_rate_limit(),
            window_secs: default_window_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_total_fields: default_max_total_fields(),
            max_root_fields: default_max_root_fields(),
            max_aliases: default_max_aliases(),
            max_sensitive_fields: default_max_sensitive_fields(),
            max_complexity: default_max_complexity(),
            enforce_depth: default_true(),
            enforce_width: default_true(),
            enforce_sensitive_fields: default_true(),
            enforce_complexity: default_true(),
        }
    }
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            default_field_weight: default_field_weight(),
            weights: default_weights(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the stale-window eviction interval
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl Config {
    /// Read a JSON configuration file. Missing sections take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply single-value overrides, looked up by variable name.
    ///
    /// Recognised: `BIND_ADDR`, `RATE_LIMIT`, `RATE_WINDOW_SECS`, `MAX_DEPTH`,
    /// `MAX_COMPLEXITY`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        }
        override_parsed(&lookup, "RATE_LIMIT", &mut self.rate_limit.limit)?;
        override_parsed(&lookup, "RATE_WINDOW_SECS", &mut self.rate_limit.window_secs)?;
        override_parsed(&lookup, "MAX_DEPTH", &mut self.limits.max_depth)?;
        override_parsed(&lookup, "MAX_COMPLEXITY", &mut self.limits.max_complexity)?;
        Ok(())
    }

    /// Check every threshold and weight, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut issues = Vec::new();

        let thresholds = [
            ("max_depth", self.limits.max_depth),
            ("max_total_fields", self.limits.max_total_fields),
            ("max_root_fields", self.limits.max_root_fields),
            ("max_aliases", self.limits.max_aliases),
            ("max_sensitive_fields", self.limits.max_sensitive_fields),
            ("max_complexity", self.limits.max_complexity),
            ("rate_limit.limit", u64::from(self.rate_limit.limit)),
            ("rate_limit.window_secs", self.rate_limit.window_secs),
            (
                "rate_limit.cleanup_interval_secs",
                self.rate_limit.cleanup_interval_secs,
            ),
        ];
        issues.extend(
            thresholds
                .iter()
                .filter(|(_, value)| *value == 0)
                .map(|(name, _)| ConfigIssue::NonPositiveThreshold(*name)),
        );

        if self.complexity.default_field_weight == 0 {
            issues.push(ConfigIssue::NonPositiveDefaultWeight);
        }
        issues.extend(
            self.complexity
                .weights
                .iter()
                .filter(|(_, weight)| **weight <= 0)
                .map(|(field, weight)| ConfigIssue::NonPositiveWeight {
                    field: field.clone(),
                    weight: *weight,
                }),
        );

        if self.sensitive_fields.iter().any(|name| name.trim().is_empty()) {
            issues.push(ConfigIssue::EmptySensitiveField);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }
}

fn override_parsed<F, T>(lookup: &F, name: &'static str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = lookup(name) {
        *target = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { name, value })?;
    }
    Ok(())
}
