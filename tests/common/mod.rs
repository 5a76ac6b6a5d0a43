//! Shared utilities for session integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use social_store::config::HealthCheckConfig;
use social_store::{ConnectionFault, DataSession, Driver, RetryPolicy};
use thiserror::Error;
use tracing_subscriber::fmt::MakeWriter;

/// Errors produced by [`ScriptedDriver`] and by test operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FakeError {
    #[error("connection reset by peer")]
    ConnectionReset,
    #[error("record not found")]
    NotFound,
    #[error("unique constraint violated: {0}")]
    Conflict(String),
}

impl ConnectionFault for FakeError {
    fn is_connection_error(&self) -> bool {
        matches!(self, FakeError::ConnectionReset)
    }
}

/// In-memory driver whose failures are scripted by the test.
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    connect_calls: AtomicU32,
    disconnect_calls: AtomicU32,
    verify_calls: AtomicU32,
    /// Connects still to fail; `u32::MAX` fails forever.
    connect_failures: AtomicU32,
    verify_fails: AtomicBool,
    disconnect_fails: AtomicBool,
    open: AtomicBool,
    generation: AtomicU32,
    connect_delay_ms: AtomicU64,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` connects.
    pub fn failing_connects(self, n: u32) -> Self {
        self.connect_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Make every connect take `delay` before it resolves.
    pub fn with_connect_delay(self, delay: Duration) -> Self {
        self.connect_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
        self
    }

    /// Fail every connect.
    pub fn unreachable() -> Self {
        Self::new().failing_connects(u32::MAX)
    }

    pub fn set_verify_failing(&self, failing: bool) {
        self.verify_fails.store(failing, Ordering::SeqCst);
    }

    pub fn set_disconnect_failing(&self, failing: bool) {
        self.disconnect_fails.store(failing, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> u32 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> u32 {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> u32 {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl Driver for ScriptedDriver {
    /// Generation of the open pool; bumps on every successful connect.
    type Handle = u32;
    type Error = FakeError;

    async fn connect(&self) -> Result<(), FakeError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.connect_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let remaining = self.connect_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                self.connect_failures.store(remaining - 1, Ordering::SeqCst);
            }
            return Err(FakeError::ConnectionReset);
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), FakeError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
        if self.disconnect_fails.load(Ordering::SeqCst) {
            return Err(FakeError::ConnectionReset);
        }
        Ok(())
    }

    async fn verify(&self) -> Result<(), FakeError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.verify_fails.load(Ordering::SeqCst) || !self.is_open() {
            return Err(FakeError::ConnectionReset);
        }
        Ok(())
    }

    fn handle(&self) -> Result<u32, FakeError> {
        if self.is_open() {
            Ok(self.generation.load(Ordering::SeqCst))
        } else {
            Err(FakeError::ConnectionReset)
        }
    }
}

/// Health settings with the background probe turned off.
pub fn manual_probe() -> HealthCheckConfig {
    HealthCheckConfig {
        enabled: false,
        ..HealthCheckConfig::default()
    }
}

/// Session without jitter and without a background probe.
pub fn session(driver: ScriptedDriver, max_attempts: u32, base_delay_ms: u64) -> DataSession<ScriptedDriver> {
    DataSession::new(driver, RetryPolicy::new(max_attempts, base_delay_ms), manual_probe())
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.contents().matches(needle).count()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Capture INFO-and-above events on the current thread until the guard drops.
pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, LogBuffer) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    (tracing::subscriber::set_default(subscriber), buffer)
}
