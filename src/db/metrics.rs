use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters sqlx does not keep on its own.
///
/// Updated from the pool's `before_acquire` hook and from the service's
/// acquire path. All counters are monotonic for the life of the pool.
#[derive(Debug, Default)]
pub struct PoolMetrics {
    wait_count: AtomicU64,
    wait_nanos: AtomicU64,
    idle_closed: AtomicU64,
    lifetime_closed: AtomicU64,
}

impl PoolMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an acquire that had to wait for a connection to be released.
    pub fn record_wait(&self, waited: Duration) {
        self.wait_count.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(waited.as_nanos()).unwrap_or(u64::MAX);
        self.wait_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn record_idle_closed(&self) {
        self.idle_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lifetime_closed(&self) {
        self.lifetime_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn wait_count(&self) -> u64 {
        self.wait_count.load(Ordering::Relaxed)
    }

    pub fn wait_duration(&self) -> Duration {
        Duration::from_nanos(self.wait_nanos.load(Ordering::Relaxed))
    }

    pub fn idle_closed(&self) -> u64 {
        self.idle_closed.load(Ordering::Relaxed)
    }

    pub fn lifetime_closed(&self) -> u64 {
        self.lifetime_closed.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of the connection pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub open_connections: u32,
    pub in_use: u32,
    pub idle: u32,
    pub wait_count: u64,
    pub wait_duration: Duration,
    pub idle_closed: u64,
    pub lifetime_closed: u64,
}
