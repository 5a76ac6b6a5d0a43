//! Resilient data-access session.
//!
//! # Data Flow
//! ```text
//! CRUD service
//!     → DataSession::execute_with_retry / run
//!     → Driver (PgDriver over sqlx::PgPool)
//!
//! On connection-class failure:
//!     → state Degraded → reconnect → backoff → retry
//!     → retries exhausted: state Disconnected, original error returned
//!
//! Background:
//!     health::ProbeTask → DataSession::probe_health every 30s
//! ```
//!
//! # Design Decisions
//! - One session per process, constructed explicitly and passed by handle
//! - Fail-open startup: an unreachable database does not abort boot
//! - No locking around queries; the pool owns concurrency
//! - State lives in an atomic; logged transitions use compare-exchange

pub mod data_session;
pub mod policy;
pub mod state;

pub use data_session::DataSession;
pub use policy::RetryPolicy;
pub use state::{SessionState, SessionStatus};
