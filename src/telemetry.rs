// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for guard decisions.

use crate::error::{Violation, ViolationKind};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Guard metrics, registered in a private registry.
pub struct GuardMetrics {
    registry: Registry,
    requests: IntCounterVec,
    violations: IntCounterVec,
    rate_limited: IntCounter,
    tracked_clients: IntGauge,
}

impl GuardMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("guard_requests_total", "Checked requests by outcome"),
            &["outcome"],
        )?;
        let violations = IntCounterVec::new(
            Opts::new("guard_violations_total", "Reported violations by kind"),
            &["kind"],
        )?;
        let rate_limited = IntCounter::new(
            "guard_rate_limited_total",
            "Requests refused by the client rate limiter",
        )?;
        let tracked_clients = IntGauge::new(
            "guard_tracked_clients",
            "Client windows currently held by the rate limiter",
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(violations.clone()))?;
        registry.register(Box::new(rate_limited.clone()))?;
        registry.register(Box::new(tracked_clients.clone()))?;

        // Export every kind from the start, even before it first fires
        for kind in ViolationKind::ALL {
            violations.with_label_values(&[kind.as_str()]);
        }

        Ok(Self {
            registry,
            requests,
            violations,
            rate_limited,
            tracked_clients,
        })
    }

    pub fn record_admitted(&self) {
        self.requests.with_label_values(&["admitted"]).inc();
    }

    pub fn record_rejected(&self, violations: &[Violation]) {
        self.requests.with_label_values(&["rejected"]).inc();
        for violation in violations {
            self.violations
                .with_label_values(&[violation.kind.as_str()])
                .inc();
        }
    }

    /// A request whose envelope or selection document could not be decoded.
    pub fn record_invalid(&self) {
        self.requests.with_label_values(&["invalid"]).inc();
    }

    pub fn record_rate_limited(&self) {
        self.requests.with_label_values(&["rate_limited"]).inc();
        self.violations
            .with_label_values(&[ViolationKind::RateLimitExceeded.as_str()])
            .inc();
        self.rate_limited.inc();
    }

    pub fn set_tracked_clients(&self, count: usize) {
        self.tracked_clients.set(count as i64);
    }

    /// Render the registry in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
