// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for GraphQL abuse guard attack simulation.
//!
//! This module provides utilities for simulating abusive query shapes and
//! request floods against the guard to validate its security controls.

pub mod generators;
pub mod metrics;
