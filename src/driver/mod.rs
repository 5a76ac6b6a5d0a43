//! Database driver seam.
//!
//! # Responsibilities
//! - Open and close the underlying connection pool
//! - Run the trivial verification query (`SELECT 1`)
//! - Hand out the current pool to callers
//!
//! # Design Decisions
//! - The session is generic over [`Driver`]; tests use a scripted driver
//! - The driver owns pool concurrency; the session adds no locking around queries
//! - Driver errors must classify themselves through [`ConnectionFault`]

use std::future::Future;

use crate::resilience::ConnectionFault;

pub mod postgres;

pub use postgres::PgDriver;

/// Outbound interface to a raw database driver.
pub trait Driver: Send + Sync + 'static {
    /// Shared handle to the open pool.
    type Handle: Clone + Send + Sync + 'static;

    /// Driver error type.
    type Error: ConnectionFault + std::error::Error + Send + Sync + 'static;

    /// Open a new pool, replacing any existing one.
    ///
    /// The replaced pool must not be closed before the new one is in
    /// place, and closing it must not block the caller; handles already
    /// given out keep serving until it drains.
    fn connect(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close the current pool. Closing an already closed driver is a no-op.
    fn disconnect(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Run the verification query against the current pool.
    fn verify(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Current pool handle, or a connection-class error when none is open.
    fn handle(&self) -> Result<Self::Handle, Self::Error>;
}
