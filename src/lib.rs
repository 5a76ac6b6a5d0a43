//! Resilient data-access layer for the social-sharing backend.

pub mod config;
pub mod driver;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod session;

pub use config::AppConfig;
pub use driver::{Driver, PgDriver};
pub use resilience::ConnectionFault;
pub use session::{DataSession, RetryPolicy, SessionState};
