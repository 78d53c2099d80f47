use std::collections::BTreeMap;

use crate::db::PoolStats;

/// Flat string map returned by `/health`.
pub type HealthReport = BTreeMap<String, String>;

pub const STATUS_UP: &str = "up";
pub const STATUS_DOWN: &str = "down";

pub const MSG_HEALTHY: &str = "is healthy";
pub const MSG_HEAVY_LOAD: &str = "The database is experiencing heavy load.";
pub const MSG_HIGH_WAIT: &str =
    "The database has a high number of wait events, indicating potential bottlenecks.";
pub const MSG_IDLE_CLOSED: &str =
    "Many idle connections are being closed, consider revising the connection pool settings.";
pub const MSG_LIFETIME_CLOSED: &str = "Many connections are being closed due to max lifetime, consider increasing max lifetime or revising the connection usage pattern.";

const HEAVY_LOAD_CONNECTIONS: u32 = 40;
const HIGH_WAIT_COUNT: u64 = 1000;

/// Diagnoses a pool snapshot taken after a successful probe.
///
/// Every rule is checked; a later match replaces the message of an earlier
/// one, so the max-lifetime warning wins whenever it applies.
pub fn diagnose(stats: &PoolStats) -> HealthReport {
    let mut report = HealthReport::new();
    report.insert("status".into(), STATUS_UP.into());
    report.insert("message".into(), MSG_HEALTHY.into());

    report.insert("open_connections".into(), stats.open_connections.to_string());
    report.insert("in_use".into(), stats.in_use.to_string());
    report.insert("idle".into(), stats.idle.to_string());
    report.insert("wait_count".into(), stats.wait_count.to_string());
    report.insert("wait_duration".into(), format!("{:?}", stats.wait_duration));
    report.insert("max_idle_closed".into(), stats.idle_closed.to_string());
    report.insert("max_lifetime_closed".into(), stats.lifetime_closed.to_string());

    let half_open = u64::from(stats.open_connections / 2);

    if stats.open_connections > HEAVY_LOAD_CONNECTIONS {
        report.insert("message".into(), MSG_HEAVY_LOAD.into());
    }
    if stats.wait_count > HIGH_WAIT_COUNT {
        report.insert("message".into(), MSG_HIGH_WAIT.into());
    }
    if stats.idle_closed > half_open {
        report.insert("message".into(), MSG_IDLE_CLOSED.into());
    }
    if stats.lifetime_closed > half_open {
        report.insert("message".into(), MSG_LIFETIME_CLOSED.into());
    }

    report
}

/// Report for a failed probe. Carries no pool counters.
pub fn down(error: impl ToString) -> HealthReport {
    let mut report = HealthReport::new();
    report.insert("status".into(), STATUS_DOWN.into());
    report.insert("error".into(), error.to_string());
    report
}
