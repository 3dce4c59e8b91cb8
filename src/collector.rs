// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Single-pass measurement of a selection tree.

use crate::tree::SelectionTree;
use serde::Serialize;
use std::collections::HashSet;

/// Field names whose values are considered sensitive (credentials, secrets).
#[derive(Debug, Clone, Default)]
pub struct SensitiveFieldSet {
    names: HashSet<String>,
}

impl SensitiveFieldSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Shape measurements of one query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueryMetrics {
    /// Longest root-to-leaf path; the synthetic root is depth 0
    pub max_depth: u64,
    /// Every field occurrence, excluding the synthetic root
    pub total_fields: u64,
    /// Immediate children of the root
    pub root_fields: u64,
    /// Occurrences whose alias differs from the field name
    pub alias_count: u64,
    /// Occurrences of sensitive field names, counted per occurrence
    pub sensitive_field_count: u64,
}

impl QueryMetrics {
    /// Measure `tree` in one traversal.
    pub fn collect(tree: &SelectionTree, sensitive: &SensitiveFieldSet) -> Self {
        let mut metrics = Self {
            root_fields: tree.root_fields().len() as u64,
            ..Self::default()
        };

        for (node, depth) in tree.walk() {
            metrics.total_fields += 1;
            metrics.max_depth = metrics.max_depth.max(u64::from(depth));
            if node.is_aliased() {
                metrics.alias_count += 1;
            }
            if sensitive.contains(&node.name) {
                metrics.sensitive_field_count += 1;
            }
        }

        metrics
    }
}
