// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! GraphQL Abuse Guard
//!
//! This crate inspects a parsed GraphQL field selection before execution and
//! decides whether to admit it, plus a per-client request rate limiter in
//! front of it:
//!
//! - Depth limiting (recursive `friends { friends { ... } }` chains)
//! - Field, root field and alias limits (alias amplification)
//! - Sensitive field limiting (credential harvesting)
//! - Weighted complexity scoring with an estimator chain
//! - Per-client fixed-window rate limiting (10 requests per minute default)
//!
//! All violations of a query are reported together; a rejected query is
//! never executed.

pub mod collector;
pub mod complexity;
pub mod config;
pub mod document;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod rules;
pub mod telemetry;
pub mod tree;
pub mod validator;

pub use config::Config;
pub use error::{DocumentError, Violation, ViolationKind};
pub use limiter::{RateLimitResult, RateLimiter};
pub use tree::SelectionTree;
pub use validator::{QueryGuard, ValidationResult};
