//! Resilient data-access session.
//!
//! # Responsibilities
//! - Connect with retry at startup, without blocking boot on an outage
//! - Retry operations that fail with connection errors, reconnecting in between
//! - Run the periodic health probe and track connectivity state
//!
//! # Caller obligations
//! A retried operation is re-run from scratch. Operations issuing several
//! dependent writes must be idempotent or run inside a transaction, or a
//! retry after a partial failure can apply a write twice.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time;

use crate::config::HealthCheckConfig;
use crate::driver::Driver;
use crate::health::ProbeTask;
use crate::observability::metrics;
use crate::resilience::ConnectionFault;
use crate::session::policy::RetryPolicy;
use crate::session::state::{AtomicSessionState, SessionState, SessionStatus};

/// Shared handle to a database session.
///
/// Cloning is cheap; every clone refers to the same connection state.
pub struct DataSession<D: Driver> {
    inner: Arc<Inner<D>>,
}

struct Inner<D: Driver> {
    driver: D,
    policy: RetryPolicy,
    health: HealthCheckConfig,
    state: AtomicSessionState,
    closed: AtomicBool,
    probe: Mutex<Option<ProbeTask>>,
    reconnecting: tokio::sync::Mutex<()>,
}

impl<D: Driver> Clone for DataSession<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<D: Driver> DataSession<D> {
    /// Create a session in the `Disconnected` state. Nothing connects until
    /// [`initialize`](Self::initialize) or the first operation.
    pub fn new(driver: D, policy: RetryPolicy, health: HealthCheckConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                driver,
                policy,
                health,
                state: AtomicSessionState::new(SessionState::Disconnected),
                closed: AtomicBool::new(false),
                probe: Mutex::new(None),
                reconnecting: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.load()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.inner.policy
    }

    /// Raw driver, for callers that deliberately bypass retry.
    pub fn driver(&self) -> &D {
        &self.inner.driver
    }

    /// Current pool handle without retry.
    pub fn handle(&self) -> Result<D::Handle, D::Error> {
        self.inner.driver.handle()
    }

    /// True once [`shutdown`](Self::shutdown) has run.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn is_probe_running(&self) -> bool {
        self.probe_slot().as_ref().is_some_and(ProbeTask::is_running)
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state(),
            max_attempts: self.inner.policy.max_attempts(),
            base_delay_ms: self.inner.policy.base_delay_ms(),
            probe_running: self.is_probe_running(),
            closed: self.is_closed(),
        }
    }

    /// Connect at process startup.
    ///
    /// Makes up to `max_attempts` attempts, waiting `base * attempt` after
    /// each failure. Exhausting them is logged and the session is left
    /// `Disconnected`; it never fails, and later operations reconnect lazily.
    pub async fn initialize(&self) -> SessionState {
        if self.is_closed() {
            tracing::warn!("initialize() called on a session that was shut down");
            return self.state();
        }

        let max_attempts = self.inner.policy.max_attempts();
        for attempt in 1..=max_attempts {
            self.set_state(SessionState::Connecting);

            match self.open().await {
                Ok(()) => {
                    metrics::record_connect_attempt(true);
                    self.set_state(SessionState::Connected);
                    tracing::info!(attempt, max_attempts, "Database session connected");
                    self.ensure_probe();
                    return SessionState::Connected;
                }
                Err(e) => {
                    metrics::record_connect_attempt(false);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        "Database connection attempt failed"
                    );
                    if attempt < max_attempts {
                        let delay = self.inner.policy.startup_delay(attempt);
                        tracing::debug!(delay_ms = delay.as_millis() as u64, "Waiting before next connection attempt");
                        time::sleep(delay).await;
                    }
                }
            }
        }

        self.set_state(SessionState::Disconnected);
        tracing::error!(
            attempts = max_attempts,
            "Could not connect to the database; continuing startup, will retry on first operation"
        );
        SessionState::Disconnected
    }

    /// Stop the probe and close the pool.
    ///
    /// Close errors are logged and swallowed. The session stays
    /// `Disconnected` afterwards; calling this again is a no-op.
    pub async fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("Database session already shut down");
            return;
        }

        let probe = self.probe_slot().take();
        if let Some(probe) = probe {
            probe.cancel().await;
        }

        if let Err(e) = self.inner.driver.disconnect().await {
            tracing::warn!(error = %e, "Error while closing database connection");
        }

        self.set_state(SessionState::Disconnected);
        tracing::info!("Database session shut down");
    }

    /// Run `operation`, retrying it after connection-class failures.
    ///
    /// Application errors are returned at once and unchanged. Connection
    /// errors mark the session degraded, trigger a best-effort reconnect and
    /// a `base / 4 * attempt` wait, up to `max_attempts` invocations in
    /// total; the last error is then returned unchanged.
    pub async fn execute_with_retry<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ConnectionFault + fmt::Display,
    {
        let max_attempts = self.inner.policy.max_attempts();
        let mut attempt = 1;

        loop {
            let err = match operation().await {
                Ok(value) => {
                    self.mark_recovered();
                    return Ok(value);
                }
                Err(e) => e,
            };

            if !err.is_connection_error() {
                metrics::record_operation_failure("application");
                return Err(err);
            }

            if self.is_closed() {
                metrics::record_operation_failure("connection");
                return Err(err);
            }

            if attempt >= max_attempts {
                self.set_state(SessionState::Disconnected);
                metrics::record_operation_failure("connection");
                tracing::error!(
                    attempts = attempt,
                    error = %err,
                    "Database operation failed after exhausting retries"
                );
                return Err(err);
            }

            self.mark_degraded();
            tracing::warn!(
                attempt,
                max_attempts,
                error = %err,
                "Database operation hit a connection error, reconnecting"
            );
            self.reconnect().await;

            let delay = self.inner.policy.operation_delay(attempt);
            metrics::record_operation_retry();
            time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Like [`execute_with_retry`](Self::execute_with_retry), handing the
    /// operation the current pool on every attempt.
    ///
    /// A retried attempt therefore runs against the pool opened by the
    /// preceding reconnect rather than the one that failed.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, D::Error>
    where
        F: FnMut(D::Handle) -> Fut,
        Fut: Future<Output = Result<T, D::Error>>,
    {
        self.execute_with_retry(|| {
            let pending = self.inner.driver.handle().map(&mut operation);
            async move { pending?.await }
        })
        .await
    }

    /// Run the verification query once and update the state.
    ///
    /// Only `Connected → Degraded` and `Degraded → Connected` are driven
    /// here, each logged once. Never fails.
    pub async fn probe_health(&self) {
        let timeout = Duration::from_secs(self.inner.health.timeout_secs);
        let healthy = match time::timeout(timeout, self.inner.driver.verify()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Health probe query failed");
                false
            }
            Err(_) => {
                tracing::debug!(timeout_secs = timeout.as_secs(), "Health probe timed out");
                false
            }
        };
        metrics::record_probe(healthy);

        if self.is_closed() {
            return;
        }

        if healthy {
            if self.transition(SessionState::Degraded, SessionState::Connected) {
                tracing::info!("Database connectivity recovered");
            }
        } else if self.transition(SessionState::Connected, SessionState::Degraded) {
            tracing::warn!("Database health probe failed, session degraded");
        }
    }

    /// Connect and verify; a pool that fails verification is closed again.
    async fn open(&self) -> Result<(), D::Error> {
        self.inner.driver.connect().await?;
        if let Err(e) = self.inner.driver.verify().await {
            if let Err(close_err) = self.inner.driver.disconnect().await {
                tracing::debug!(error = %close_err, "Failed to close unverified connection");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Best-effort reopen. The driver swaps a new pool in, so callers
    /// holding the old one keep working while it drains. Skipped when
    /// another caller is already reconnecting.
    async fn reconnect(&self) {
        let Ok(_guard) = self.inner.reconnecting.try_lock() else {
            tracing::debug!("Reconnect already in progress");
            return;
        };

        match self.inner.driver.connect().await {
            Ok(()) => {
                metrics::record_connect_attempt(true);
                if self.is_closed() {
                    // shutdown ran while the new pool was opening
                    if let Err(e) = self.inner.driver.disconnect().await {
                        tracing::debug!(error = %e, "Error closing pool reopened during shutdown");
                    }
                    return;
                }
                tracing::info!("Database connection reopened");
            }
            Err(e) => {
                metrics::record_connect_attempt(false);
                tracing::warn!(error = %e, "Reconnect failed, will retry");
            }
        }
    }

    fn mark_recovered(&self) {
        if self.is_closed() {
            return;
        }
        let recovered = self.transition(SessionState::Degraded, SessionState::Connected)
            || self.transition(SessionState::Disconnected, SessionState::Connected);
        if recovered {
            tracing::info!("Database session recovered");
            self.ensure_probe();
        }
        self.settle_if_closed();
    }

    fn mark_degraded(&self) {
        if self.is_closed() {
            return;
        }
        let previous = self.inner.state.swap(SessionState::Degraded);
        if previous != SessionState::Degraded {
            metrics::record_session_state(SessionState::Degraded);
            tracing::warn!(from = %previous, "Database session degraded");
        }
        self.settle_if_closed();
    }

    /// Undo a state write that raced with shutdown.
    fn settle_if_closed(&self) {
        if self.is_closed() {
            self.set_state(SessionState::Disconnected);
        }
    }

    fn set_state(&self, state: SessionState) {
        self.inner.state.swap(state);
        metrics::record_session_state(state);
    }

    fn transition(&self, from: SessionState, to: SessionState) -> bool {
        let changed = self.inner.state.transition(from, to);
        if changed {
            metrics::record_session_state(to);
        }
        changed
    }

    fn probe_slot(&self) -> MutexGuard<'_, Option<ProbeTask>> {
        self.inner.probe.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the health probe unless it is disabled, running, or the
    /// session is closed.
    fn ensure_probe(&self) {
        if !self.inner.health.enabled {
            return;
        }

        // shutdown marks the session closed before it empties the slot, so
        // checking under the lock never leaves an orphaned task behind
        let mut slot = self.probe_slot();
        if self.is_closed() || slot.as_ref().is_some_and(ProbeTask::is_running) {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let interval = Duration::from_secs(self.inner.health.interval_secs);
        *slot = Some(ProbeTask::spawn(interval, move || {
            let inner = weak.upgrade();
            async move {
                match inner {
                    Some(inner) => {
                        let session = DataSession { inner };
                        session.probe_health().await;
                        true
                    }
                    None => false,
                }
            }
        }));
    }
}

impl<D: Driver + fmt::Debug> fmt::Debug for DataSession<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSession")
            .field("driver", &self.inner.driver)
            .field("state", &self.state())
            .field("policy", &self.inner.policy)
            .field("closed", &self.is_closed())
            .finish()
    }
}
