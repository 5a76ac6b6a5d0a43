//! Metrics collection and exposition.
//!
//! # Metrics
//! - `db_session_state` (gauge): 0=disconnected, 1=connecting, 2=connected, 3=degraded
//! - `db_connect_attempts_total` (counter): startup/reconnect attempts by outcome
//! - `db_operation_retries_total` (counter): operation retries after connection errors
//! - `db_operation_failures_total` (counter): failures surfaced to callers, by class
//! - `db_health_probes_total` (counter): probe results by outcome
//! - `db_health` (gauge): 1=last probe succeeded, 0=failed
//!
//! Recording without an installed recorder is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::session::SessionState;

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

pub fn record_session_state(state: SessionState) {
    gauge!("db_session_state").set(f64::from(state as u8));
}

pub fn record_connect_attempt(success: bool) {
    counter!("db_connect_attempts_total", "outcome" => outcome(success)).increment(1);
}

pub fn record_operation_retry() {
    counter!("db_operation_retries_total").increment(1);
}

/// `class` is "connection" or "application".
pub fn record_operation_failure(class: &'static str) {
    counter!("db_operation_failures_total", "class" => class).increment(1);
}

pub fn record_probe(healthy: bool) {
    counter!("db_health_probes_total", "outcome" => outcome(healthy)).increment(1);
    gauge!("db_health").set(if healthy { 1.0 } else { 0.0 });
}
