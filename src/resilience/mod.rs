//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Operation fails:
//!     → classify.rs (connection-class or application-class?)
//!     → application-class: surfaced unchanged, no retry
//!     → connection-class: backoff.rs (linear delay + jitter) → retry
//! ```
//!
//! # Design Decisions
//! - Classification lives in one predicate per driver error type
//! - Linear backoff; jitter spreads out callers retrying at the same time
//! - Never retry application errors; that would hide bugs as flakiness

pub mod backoff;
pub mod classify;

pub use classify::ConnectionFault;
