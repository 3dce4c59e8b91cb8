// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter keyed by client identity.
//!
//! Each client gets a window that starts on its first request. Requests in
//! the window increment a counter; once the counter passes the limit further
//! requests are refused (and still counted) until the window elapses, at
//! which point the next request opens a fresh window.
//!
//! Windows live in a sharded concurrent map. The check-and-increment for one
//! client runs under that client's shard lock, so concurrent requests cannot
//! both slip under the limit, and unrelated clients do not contend.

use crate::config::RateLimitConfig;
use crate::error::{Violation, ViolationKind};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until window resets
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Attempts seen in this window against the configured limit
        violation: Violation,
        /// Time until the window resets
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Per-client window state.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    window_start: Instant,
    count: u32,
}

impl RateWindow {
    fn open(now: Instant) -> Self {
        Self {
            window_start: now,
            count: 1,
        }
    }

    fn has_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }

    fn reset_in(&self, now: Instant, window: Duration) -> Duration {
        window.saturating_sub(now.saturating_duration_since(self.window_start))
    }
}

/// Thread-safe rate limiter.
pub struct RateLimiter {
    /// Configuration
    config: RateLimitConfig,
    /// Windows by client identity
    windows: DashMap<String, RateWindow>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// Record a request from `client` now.
    pub fn check(&self, client: &str) -> RateLimitResult {
        self.check_at(client, Instant::now())
    }

    /// Record a request from `client` at `now`.
    pub fn check_at(&self, client: &str, now: Instant) -> RateLimitResult {
        let window = self.config.window_duration();
        let limit = self.config.limit;

        let state = match self.windows.entry(client.to_owned()) {
            Entry::Occupied(mut occupied) => {
                let state = occupied.get_mut();
                if state.has_expired(now, window) {
                    *state = RateWindow::open(now);
                } else {
                    state.count = state.count.saturating_add(1);
                }
                *state
            }
            Entry::Vacant(vacant) => *vacant.insert(RateWindow::open(now)),
        };

        let reset_in = state.reset_in(now, window);
        if state.count > limit {
            debug!(client, count = state.count, limit, "Client rate limit exceeded");
            RateLimitResult::Limited {
                violation: Violation::new(
                    ViolationKind::RateLimitExceeded,
                    u64::from(state.count),
                    u64::from(limit),
                ),
                retry_after: reset_in,
            }
        } else {
            RateLimitResult::Allowed {
                remaining: limit - state.count,
                reset_in,
            }
        }
    }

    /// Drop every window that has elapsed at `now`.
    ///
    /// An evicted client simply starts a fresh window on its next request,
    /// which is exactly what an expired window would have done.
    pub fn evict_stale(&self, now: Instant) -> usize {
        let window = self.config.window_duration();
        let before = self.windows.len();
        self.windows
            .retain(|_, state| !state.has_expired(now, window));
        before.saturating_sub(self.windows.len())
    }

    /// Clean up expired entries (should be called periodically).
    pub fn cleanup(&self) {
        let evicted = self.evict_stale(Instant::now());
        if evicted > 0 {
            warn!(evicted, remaining = self.windows.len(), "Evicted stale rate windows");
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}
