// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Violation descriptors, configuration errors and GraphQL-shaped error bodies.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Kind of limit a request violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// Nesting deeper than `max_depth`
    DepthExceeded,
    /// More field occurrences than `max_total_fields`
    TooManyFields,
    /// More root-level selections than `max_root_fields`
    TooManyRootFields,
    /// More aliased fields than `max_aliases`
    TooManyAliases,
    /// More sensitive field occurrences than `max_sensitive_fields`
    TooManySensitiveFields,
    /// Weighted cost above `max_complexity`
    ComplexityExceeded,
    /// Client sent more requests than allowed in the current window
    RateLimitExceeded,
}

impl ViolationKind {
    /// Every kind, in the order the pipeline reports them.
    pub const ALL: [ViolationKind; 7] = [
        Self::DepthExceeded,
        Self::TooManyFields,
        Self::TooManyRootFields,
        Self::TooManyAliases,
        Self::TooManySensitiveFields,
        Self::ComplexityExceeded,
        Self::RateLimitExceeded,
    ];

    /// Wire code for the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepthExceeded => "DEPTH_EXCEEDED",
            Self::TooManyFields => "TOO_MANY_FIELDS",
            Self::TooManyRootFields => "TOO_MANY_ROOT_FIELDS",
            Self::TooManyAliases => "TOO_MANY_ALIASES",
            Self::TooManySensitiveFields => "TOO_MANY_SENSITIVE_FIELDS",
            Self::ComplexityExceeded => "COMPLEXITY_EXCEEDED",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::DepthExceeded => "Query depth exceeds the allowed nesting",
            Self::TooManyFields => "Query has too many fields",
            Self::TooManyRootFields => "Query has too many root fields",
            Self::TooManyAliases => "Query has too many aliases",
            Self::TooManySensitiveFields => "Query contains too many sensitive fields",
            Self::ComplexityExceeded => "Query complexity is too high",
            Self::RateLimitExceeded => "Too many requests from this client",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single limit violation: what was measured and what was allowed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}: {observed} (maximum {threshold})", .kind.describe())]
pub struct Violation {
    pub kind: ViolationKind,
    pub observed: u64,
    pub threshold: u64,
}

impl Violation {
    pub fn new(kind: ViolationKind, observed: u64, threshold: u64) -> Self {
        Self {
            kind,
            observed,
            threshold,
        }
    }

    /// Report a violation of `kind` only when `observed` strictly exceeds `threshold`.
    pub fn exceeding(kind: ViolationKind, observed: u64, threshold: u64) -> Option<Self> {
        (observed > threshold).then(|| Self::new(kind, observed, threshold))
    }
}

/// A single problem found while validating configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    #[error("threshold `{0}` must be greater than zero")]
    NonPositiveThreshold(&'static str),

    #[error("default field weight must be greater than zero")]
    NonPositiveDefaultWeight,

    #[error("complexity weight for field `{field}` must be greater than zero, got {weight}")]
    NonPositiveWeight { field: String, weight: i64 },

    #[error("sensitive field names must not be empty")]
    EmptySensitiveField,
}

/// Errors that stop the service from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("invalid configuration: {}", join_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A selection document that could not be decoded.
///
/// Offsets are byte positions within the document text.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("expected {expected} at byte {offset}")]
    Syntax { expected: &'static str, offset: usize },

    #[error("selection at byte {offset} has no name")]
    MissingName { offset: usize },

    #[error("invalid value at byte {offset}: {source}")]
    Value {
        offset: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl DocumentError {
    /// Machine-readable code reported under `extensions.code`.
    pub const CODE: &'static str = "INVALID_SELECTION_DOCUMENT";
}

/// Build a GraphQL error body for a request that could not be decoded.
pub fn invalid_document_response(message: impl Into<String>) -> Value {
    json!({
        "errors": [{
            "message": message.into(),
            "extensions": { "code": DocumentError::CODE }
        }]
    })
}

/// Build a GraphQL-compliant error body for a set of violations.
///
/// GraphQL clients expect `{"errors": [...]}` with machine-readable codes
/// under `extensions`.
pub fn graphql_error_response(violations: &[Violation]) -> Value {
    json!({
        "errors": violations.iter().map(|v| json!({
            "message": v.to_string(),
            "extensions": {
                "code": v.kind.as_str(),
                "observed": v.observed,
                "threshold": v.threshold,
            }
        })).collect::<Vec<_>>()
    })
}
