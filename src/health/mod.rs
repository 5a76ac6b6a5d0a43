//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (probe.rs)
//!     → DataSession::probe_health (SELECT 1 under a timeout)
//!     → Connected ←→ Degraded transition in session state
//! ```
//!
//! # Design Decisions
//! - The probe never throws; it keeps running whatever the outcome
//! - A probe failure does not touch in-flight operations
//! - The task is owned by the session and cancelled on shutdown

pub mod probe;

pub use probe::ProbeTask;
