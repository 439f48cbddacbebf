use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_gauge, Encoder, IntCounter, IntGauge, TextEncoder};
use service::store::StoreStats;

// Prometheus metrics (default registry)
pub static REGISTRATIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "complaint_portal_registrations_total",
        "Total accounts registered"
    )
    .expect("register registrations_total")
});

pub static COMPLAINTS_SUBMITTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "complaint_portal_complaints_submitted_total",
        "Total complaints submitted"
    )
    .expect("register complaints_submitted_total")
});

pub static COMPLAINTS_RESOLVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "complaint_portal_complaints_resolved_total",
        "Total complaints resolved by an administrator"
    )
    .expect("register complaints_resolved_total")
});

pub static AUTH_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "complaint_portal_auth_failures_total",
        "Total requests rejected for an unknown secret code"
    )
    .expect("register auth_failures_total")
});

pub static ACCOUNTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("complaint_portal_accounts", "Accounts currently held in memory")
        .expect("register accounts gauge")
});

pub static OPEN_COMPLAINTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("complaint_portal_open_complaints", "Complaints not yet resolved")
        .expect("register open_complaints gauge")
});

fn as_gauge(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

/// Refresh gauges from a store snapshot.
pub fn observe(stats: StoreStats) {
    ACCOUNTS.set(as_gauge(stats.accounts));
    OPEN_COMPLAINTS.set(as_gauge(stats.records.saturating_sub(stats.resolved)));
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}
