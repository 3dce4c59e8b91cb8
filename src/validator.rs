// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Query validation pipeline.
//!
//! Measures a tree once, runs every enabled rule against the measurements and
//! collects all violations. A request is admitted only when the list is empty;
//! a rejected tree never reaches the executor.

use crate::collector::{QueryMetrics, SensitiveFieldSet};
use crate::complexity::ComplexityAnalyzer;
use crate::config::Config;
use crate::error::{ConfigError, Violation};
use crate::rules::{build_rules, Analysis, LimitRule};
use crate::tree::SelectionTree;
use tracing::debug;

/// Outcome of validating one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Query may proceed to execution
    Admitted,
    /// Query must not run; carries every violation found
    Rejected(Vec<Violation>),
}

impl ValidationResult {
    fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            ValidationResult::Admitted
        } else {
            ValidationResult::Rejected(violations)
        }
    }

    pub fn is_admitted(&self) -> bool {
        matches!(self, ValidationResult::Admitted)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationResult::Admitted => &[],
            ValidationResult::Rejected(violations) => violations,
        }
    }
}

/// Validates selection trees against static limits.
///
/// Holds only immutable configuration, so one guard can serve every request
/// concurrently.
pub struct QueryGuard {
    sensitive: SensitiveFieldSet,
    complexity: ComplexityAnalyzer,
    rules: Vec<Box<dyn LimitRule>>,
}

impl QueryGuard {
    /// Assemble a guard from its parts.
    pub fn new(
        sensitive: SensitiveFieldSet,
        complexity: ComplexityAnalyzer,
        rules: Vec<Box<dyn LimitRule>>,
    ) -> Self {
        Self {
            sensitive,
            complexity,
            rules,
        }
    }

    /// Build the guard described by `config`, validating it first.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            SensitiveFieldSet::new(config.sensitive_fields.iter().cloned()),
            ComplexityAnalyzer::from_config(&config.complexity)?,
            build_rules(&config.limits),
        ))
    }

    /// Measure `tree` without judging it.
    pub fn analyze(&self, tree: &SelectionTree) -> Analysis {
        Analysis {
            metrics: QueryMetrics::collect(tree, &self.sensitive),
            complexity: self.complexity.score(tree),
        }
    }

    /// Run every rule against precomputed measurements.
    pub fn evaluate(&self, analysis: &Analysis) -> ValidationResult {
        let mut violations = Vec::new();
        for rule in &self.rules {
            let before = violations.len();
            rule.check(analysis, &mut violations);
            if violations.len() > before {
                debug!(rule = rule.name(), found = violations.len() - before, "Rule violated");
            }
        }
        ValidationResult::from_violations(violations)
    }

    /// Measure and judge `tree`.
    pub fn validate(&self, tree: &SelectionTree) -> ValidationResult {
        let analysis = self.analyze(tree);
        debug!(
            depth = analysis.metrics.max_depth,
            fields = analysis.metrics.total_fields,
            root_fields = analysis.metrics.root_fields,
            aliases = analysis.metrics.alias_count,
            sensitive = analysis.metrics.sensitive_field_count,
            complexity = analysis.complexity,
            "Query analysed"
        );
        self.evaluate(&analysis)
    }

    /// Run `execute` only if `tree` is admitted.
    pub fn run_guarded<T, F>(&self, tree: &SelectionTree, execute: F) -> Result<T, Vec<Violation>>
    where
        F: FnOnce(&SelectionTree) -> T,
    {
        match self.validate(tree) {
            ValidationResult::Admitted => Ok(execute(tree)),
            ValidationResult::Rejected(violations) => Err(violations),
        }
    }
}
