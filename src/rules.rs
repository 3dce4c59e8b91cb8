// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Threshold rules evaluated against a query's measurements.
//!
//! Each rule is independent and reports every violation it finds; none of
//! them short-circuits another.

use crate::collector::QueryMetrics;
use crate::config::LimitConfig;
use crate::error::{Violation, ViolationKind};
use serde::Serialize;

/// Everything the rules need to know about one query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub metrics: QueryMetrics,
    pub complexity: u64,
}

/// A threshold check over an [`Analysis`].
pub trait LimitRule: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Append any violations to `violations`.
    fn check(&self, analysis: &Analysis, violations: &mut Vec<Violation>);
}

/// Rejects nesting beyond `max_depth`.
///
/// Self-referential types (`friends { friends { ... } }`) allow unbounded
/// nesting that can be cheap per level yet still exhaust the executor.
pub struct DepthLimiter {
    max_depth: u64,
}

impl DepthLimiter {
    pub fn new(max_depth: u64) -> Self {
        Self { max_depth }
    }
}

impl LimitRule for DepthLimiter {
    fn name(&self) -> &'static str {
        "depth"
    }

    fn check(&self, analysis: &Analysis, violations: &mut Vec<Violation>) {
        violations.extend(Violation::exceeding(
            ViolationKind::DepthExceeded,
            analysis.metrics.max_depth,
            self.max_depth,
        ));
    }
}

/// Bounds total fields, root fields and aliases.
///
/// Aliases let one nominal query ask for the same expensive field many times
/// under different response keys.
pub struct WidthLimiter {
    max_total_fields: u64,
    max_root_fields: u64,
    max_aliases: u64,
}

impl WidthLimiter {
    pub fn new(max_total_fields: u64, max_root_fields: u64, max_aliases: u64) -> Self {
        Self {
            max_total_fields,
            max_root_fields,
            max_aliases,
        }
    }
}

impl LimitRule for WidthLimiter {
    fn name(&self) -> &'static str {
        "width"
    }

    fn check(&self, analysis: &Analysis, violations: &mut Vec<Violation>) {
        let metrics = &analysis.metrics;
        let checks = [
            (ViolationKind::TooManyFields, metrics.total_fields, self.max_total_fields),
            (ViolationKind::TooManyRootFields, metrics.root_fields, self.max_root_fields),
            (ViolationKind::TooManyAliases, metrics.alias_count, self.max_aliases),
        ];
        violations.extend(
            checks
                .into_iter()
                .filter_map(|(kind, observed, threshold)| {
                    Violation::exceeding(kind, observed, threshold)
                }),
        );
    }
}

/// Bounds how many sensitive field occurrences one request may read.
pub struct SensitiveFieldLimiter {
    max_sensitive_fields: u64,
}

impl SensitiveFieldLimiter {
    pub fn new(max_sensitive_fields: u64) -> Self {
        Self {
            max_sensitive_fields,
        }
    }
}

impl LimitRule for SensitiveFieldLimiter {
    fn name(&self) -> &'static str {
        "sensitive_fields"
    }

    fn check(&self, analysis: &Analysis, violations: &mut Vec<Violation>) {
        violations.extend(Violation::exceeding(
            ViolationKind::TooManySensitiveFields,
            analysis.metrics.sensitive_field_count,
            self.max_sensitive_fields,
        ));
    }
}

/// Rejects queries whose weighted cost exceeds `max_complexity`.
pub struct ComplexityLimiter {
    max_complexity: u64,
}

impl ComplexityLimiter {
    pub fn new(max_complexity: u64) -> Self {
        Self { max_complexity }
    }
}

impl LimitRule for ComplexityLimiter {
    fn name(&self) -> &'static str {
        "complexity"
    }

    fn check(&self, analysis: &Analysis, violations: &mut Vec<Violation>) {
        violations.extend(Violation::exceeding(
            ViolationKind::ComplexityExceeded,
            analysis.complexity,
            self.max_complexity,
        ));
    }
}

/// The enabled rules for `config`, in reporting order.
pub fn build_rules(config: &LimitConfig) -> Vec<Box<dyn LimitRule>> {
    let mut rules: Vec<Box<dyn LimitRule>> = Vec::new();

    if config.enforce_depth {
        rules.push(Box::new(DepthLimiter::new(config.max_depth)));
    }

    if config.enforce_width {
        rules.push(Box::new(WidthLimiter::new(
            config.max_total_fields,
            config.max_root_fields,
            config.max_aliases,
        )));
    }

    if config.enforce_sensitive_fields {
        rules.push(Box::new(SensitiveFieldLimiter::new(
            config.max_sensitive_fields,
        )));
    }

    if config.enforce_complexity {
        rules.push(Box::new(ComplexityLimiter::new(config.max_complexity)));
    }

    rules
}
