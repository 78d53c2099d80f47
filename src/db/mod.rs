use secrecy::ExposeSecret;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    PgPool,
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::DbConfig;
use crate::error::DataError;

pub mod metrics;

pub use metrics::{PoolMetrics, PoolStats};

/// Sizing and recycling rules for the products pool.
///
/// Idle and lifetime expiry are enforced by the pool's `before_acquire` hook
/// rather than by sqlx itself, so that every closed connection is counted.
#[derive(Debug, Clone, Copy)]
pub struct PoolPolicy {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolPolicy {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(10 * 60),
            max_lifetime: Duration::from_secs(30 * 60),
        }
    }
}

/// Builds connect options from the loaded config.
///
/// Empty host, user or database fall back to libpq-style defaults. A port that
/// is set but not numeric is rejected.
pub fn connect_options(config: &DbConfig) -> Result<PgConnectOptions, DataError> {
    let mut options = PgConnectOptions::new().ssl_mode(PgSslMode::Disable);

    if !config.host.is_empty() {
        options = options.host(&config.host);
    }
    if !config.port.is_empty() {
        let port = config
            .port
            .parse::<u16>()
            .map_err(|e| DataError::PoolOpen(format!("invalid port {:?}: {}", config.port, e)))?;
        options = options.port(port);
    }
    if !config.username.is_empty() {
        options = options.username(&config.username);
    }
    if !config.password.expose_secret().is_empty() {
        options = options.password(config.password.expose_secret());
    }
    if !config.database.is_empty() {
        options = options.database(&config.database);
    }
    if !config.schema.is_empty() {
        options = options.options([("search_path", config.schema.as_str())]);
    }

    Ok(options)
}

/// Opens the pool without connecting. Connectivity is first exercised by a
/// query or a health probe.
pub fn open_pool(
    config: &DbConfig,
    policy: &PoolPolicy,
    metrics: Arc<PoolMetrics>,
) -> Result<PgPool, DataError> {
    let options = connect_options(config)?;
    Ok(open_pool_with(options, policy, metrics))
}

/// Same as `open_pool`, for callers that already hold connect options.
pub fn open_pool_with(
    options: PgConnectOptions,
    policy: &PoolPolicy,
    metrics: Arc<PoolMetrics>,
) -> PgPool {
    let idle_timeout = policy.idle_timeout;
    let max_lifetime = policy.max_lifetime;

    PgPoolOptions::new()
        .max_connections(policy.max_connections)
        .acquire_timeout(policy.acquire_timeout)
        .idle_timeout(None)
        .max_lifetime(None)
        .before_acquire(move |_conn, meta| {
            let metrics = Arc::clone(&metrics);
            Box::pin(async move {
                let keep = if meta.idle_for > idle_timeout {
                    metrics.record_idle_closed();
                    false
                } else if meta.age > max_lifetime {
                    metrics.record_lifetime_closed();
                    false
                } else {
                    true
                };
                Ok::<_, sqlx::Error>(keep)
            })
        })
        .connect_lazy_with(options)
}

pub fn pool_stats(pool: &PgPool, metrics: &PoolMetrics) -> PoolStats {
    let open_connections = pool.size();
    let idle = u32::try_from(pool.num_idle()).unwrap_or(u32::MAX);

    PoolStats {
        open_connections,
        in_use: open_connections.saturating_sub(idle),
        idle,
        wait_count: metrics.wait_count(),
        wait_duration: metrics.wait_duration(),
        idle_closed: metrics.idle_closed(),
        lifetime_closed: metrics.lifetime_closed(),
    }
}
