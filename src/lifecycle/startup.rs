//! Startup orchestration.
//!
//! Builds the driver and the session from a validated config and runs the
//! startup connection. Never fails on an unreachable database (fail-open).

use crate::config::AppConfig;
use crate::driver::PgDriver;
use crate::session::{DataSession, RetryPolicy};

/// Build the session from a validated configuration.
pub fn build_session(config: &AppConfig) -> DataSession<PgDriver> {
    let driver = PgDriver::new(&config.database);
    tracing::info!(
        url = %driver.redacted_url(),
        max_connections = config.database.max_connections,
        max_attempts = config.retries.max_attempts,
        base_delay_ms = config.retries.base_delay_ms,
        "Database session configured"
    );
    DataSession::new(
        driver,
        RetryPolicy::from(&config.retries),
        config.health_check.clone(),
    )
}

/// Build the session and connect it.
pub async fn bootstrap(config: &AppConfig) -> DataSession<PgDriver> {
    let session = build_session(config);
    let state = session.initialize().await;
    tracing::info!(state = %state, "Data access layer started");
    session
}
