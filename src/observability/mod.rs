//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Session, probe and driver produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (attempt, delay_ms, error) rather than formatted strings
//! - Each state transition is logged once, by the caller that performed it
//! - Database passwords never reach the logs

pub mod logging;
pub mod metrics;
