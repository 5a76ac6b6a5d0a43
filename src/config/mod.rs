//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → CLI overrides (DATABASE_URL) applied by the binary
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the retry policy never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AppConfig;
pub use schema::DatabaseConfig;
pub use schema::HealthCheckConfig;
pub use schema::ObservabilityConfig;
pub use schema::RetryConfig;
pub use validation::{validate_config, ValidationError};
