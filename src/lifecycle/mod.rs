//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build driver + session → initialize()
//!
//! Shutdown (signals.rs):
//!     SIGTERM/SIGINT → session.shutdown() → probe cancelled, pool closed
//! ```
//!
//! # Design Decisions
//! - initialize() and shutdown() are driven once, by the outermost bootstrap
//! - Startup does not fail on an unreachable database
//! - Shutdown errors are logged, never propagated

pub mod signals;
pub mod startup;
