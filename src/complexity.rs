// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Weighted cost estimation.
//!
//! Every field occurrence is priced by an ordered chain of estimators. The
//! first estimator with an opinion wins; if all abstain the default weight
//! applies. Costs are additive per occurrence: a field's weight does not
//! multiply its children, and a field requested through N aliases costs N
//! times.
//!
//! Arguments such as `first`/`limit` are not consulted, so list fields are
//! not scaled by the requested page size.

use crate::config::ComplexityConfig;
use crate::error::{ConfigError, ConfigIssue};
use crate::tree::{SelectionNode, SelectionTree};
use std::collections::HashMap;
use std::sync::Arc;

/// One link of the estimator chain.
pub trait ComplexityEstimator: Send + Sync {
    /// Weight of `node`, or `None` for no opinion.
    fn estimate(&self, node: &SelectionNode) -> Option<u64>;
}

/// Hand-tuned positive weights by field name.
#[derive(Debug, Clone, Default)]
pub struct ComplexityTable {
    weights: HashMap<String, u64>,
}

impl ComplexityTable {
    /// Build a table from validated config, rejecting zero or negative weights.
    pub fn from_config(config: &ComplexityConfig) -> Result<Self, ConfigError> {
        let mut weights = HashMap::with_capacity(config.weights.len());
        let mut issues = Vec::new();

        for (field, &weight) in &config.weights {
            match u64::try_from(weight) {
                Ok(w) if w > 0 => {
                    weights.insert(field.clone(), w);
                }
                _ => issues.push(ConfigIssue::NonPositiveWeight {
                    field: field.clone(),
                    weight,
                }),
            }
        }

        if issues.is_empty() {
            Ok(Self { weights })
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }

    pub fn weight(&self, field: &str) -> Option<u64> {
        self.weights.get(field).copied()
    }
}

/// Answers from a [`ComplexityTable`]; abstains for unlisted fields.
pub struct TableEstimator {
    table: Arc<ComplexityTable>,
}

impl TableEstimator {
    pub fn new(table: Arc<ComplexityTable>) -> Self {
        Self { table }
    }
}

impl ComplexityEstimator for TableEstimator {
    fn estimate(&self, node: &SelectionNode) -> Option<u64> {
        self.table.weight(&node.name)
    }
}

/// Always answers the same weight.
pub struct FixedEstimator {
    weight: u64,
}

impl FixedEstimator {
    pub fn new(weight: u64) -> Self {
        Self { weight }
    }
}

impl ComplexityEstimator for FixedEstimator {
    fn estimate(&self, _node: &SelectionNode) -> Option<u64> {
        Some(self.weight)
    }
}

/// Scores whole trees with an estimator chain.
pub struct ComplexityAnalyzer {
    estimators: Vec<Box<dyn ComplexityEstimator>>,
    default_weight: u64,
}

impl ComplexityAnalyzer {
    /// An empty chain: every field costs `default_weight`.
    pub fn new(default_weight: u64) -> Self {
        Self {
            estimators: Vec::new(),
            default_weight,
        }
    }

    /// Chain from config: the weight table, then a fixed estimator answering
    /// the default weight for everything the table does not list.
    pub fn from_config(config: &ComplexityConfig) -> Result<Self, ConfigError> {
        if config.default_field_weight == 0 {
            return Err(ConfigError::Invalid(vec![ConfigIssue::NonPositiveDefaultWeight]));
        }
        let table = Arc::new(ComplexityTable::from_config(config)?);
        Ok(Self::new(config.default_field_weight)
            .with_estimator(TableEstimator::new(table))
            .with_estimator(FixedEstimator::new(config.default_field_weight)))
    }

    /// Append an estimator; it is consulted after every one already present.
    pub fn with_estimator(mut self, estimator: impl ComplexityEstimator + 'static) -> Self {
        self.estimators.push(Box::new(estimator));
        self
    }

    /// Weight of a single occurrence.
    pub fn field_weight(&self, node: &SelectionNode) -> u64 {
        self.estimators
            .iter()
            .find_map(|estimator| estimator.estimate(node))
            .unwrap_or(self.default_weight)
    }

    /// Total cost of every field in the tree; the synthetic root is free.
    pub fn score(&self, tree: &SelectionTree) -> u64 {
        tree.walk()
            .fold(0u64, |total, (node, _)| total.saturating_add(self.field_weight(node)))
    }
}
