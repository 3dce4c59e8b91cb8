// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! GraphQL Abuse Guard Service
//!
//! A pre-execution check service for a GraphQL gateway. For every incoming
//! operation the gateway posts the client identity and the parsed selection
//! tree to `/check`; the service applies the client rate limit first and then
//! the query limits, and answers with either `allowed: true` or the complete
//! list of violations.
//!
//! ## Configuration
//!
//! If `GUARD_CONFIG` names a JSON file it is loaded, otherwise defaults are
//! used. Single values can then be overridden from the environment:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `RATE_LIMIT`: Requests per client per window (default: 10)
//! - `RATE_WINDOW_SECS`: Rate window length (default: 60)
//! - `MAX_DEPTH`: Maximum selection depth (default: 5)
//! - `MAX_COMPLEXITY`: Maximum weighted cost (default: 50)
//!
//! An invalid configuration is fatal: the service refuses to start.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use graphql_abuse_guard::{
    config::Config,
    error::ConfigError,
    handlers::{router, AppState},
    limiter::RateLimiter,
    telemetry::GuardMetrics,
    validator::QueryGuard,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_config()?;
    info!(
        bind_addr = %config.bind_addr,
        rate_limit = config.rate_limit.limit,
        window_secs = config.rate_limit.window_secs,
        max_depth = config.limits.max_depth,
        max_complexity = config.limits.max_complexity,
        weighted_fields = config.complexity.weights.len(),
        sensitive_fields = config.sensitive_fields.len(),
        "Starting GraphQL abuse guard"
    );

    // Create application state
    let state = Arc::new(AppState {
        limiter: RateLimiter::new(config.rate_limit.clone()),
        guard: QueryGuard::from_config(&config)?,
        metrics: GuardMetrics::new()?,
        config: config.clone(),
    });

    // Spawn cleanup task
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_state.config.rate_limit.cleanup_interval());
        loop {
            interval.tick().await;
            cleanup_state.limiter.cleanup();
            cleanup_state
                .metrics
                .set_tracked_clients(cleanup_state.limiter.tracked_clients());
        }
    });

    // Start server
    let app = router(state);
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Load configuration from `GUARD_CONFIG` and environment overrides.
fn load_config() -> Result<Config, ConfigError> {
    let mut config = match std::env::var("GUARD_CONFIG") {
        Ok(path) => Config::from_file(Path::new(&path))?,
        Err(_) => Config::default(),
    };
    config.apply_overrides(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}
