//! PostgreSQL driver over a sqlx connection pool.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use sqlx::postgres::{PgPool, PgPoolOptions};
use url::Url;

use crate::config::DatabaseConfig;
use crate::driver::Driver;

/// PostgreSQL driver.
///
/// The open pool lives in an [`ArcSwapOption`] so a reconnect swaps it in
/// atomically while other tasks keep using the handle they already hold.
pub struct PgDriver {
    url: String,
    max_connections: u32,
    acquire_timeout: Duration,
    pool: ArcSwapOption<PgPool>,
}

impl PgDriver {
    /// Create a driver. No connection is made until [`Driver::connect`].
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            acquire_timeout: Duration::from_secs(config.connect_timeout_secs),
            pool: ArcSwapOption::empty(),
        }
    }

    /// Connection URL with the password masked, for logs.
    pub fn redacted_url(&self) -> String {
        redact_url(&self.url)
    }

    /// Whether a pool is currently open.
    pub fn is_open(&self) -> bool {
        self.pool.load_full().is_some_and(|pool| !pool.is_closed())
    }

    /// Swap `pool` in and drain the previous one in the background.
    ///
    /// Holders of the old handle finish their in-flight queries; new
    /// acquisitions on it fail and the retry loop moves them to `pool`.
    fn install(&self, pool: PgPool) {
        if let Some(previous) = self.pool.swap(Some(Arc::new(pool))) {
            let url = self.redacted_url();
            tokio::spawn(async move {
                previous.close().await;
                tracing::debug!(%url, "Previous database pool drained");
            });
        }
    }
}

impl Driver for PgDriver {
    type Handle = PgPool;
    type Error = sqlx::Error;

    async fn connect(&self) -> Result<(), sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(&self.url)
            .await?;

        tracing::debug!(url = %self.redacted_url(), "Database pool opened");
        self.install(pool);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), sqlx::Error> {
        if let Some(pool) = self.pool.swap(None) {
            pool.close().await;
            tracing::debug!(url = %self.redacted_url(), "Database pool closed");
        }
        Ok(())
    }

    async fn verify(&self) -> Result<(), sqlx::Error> {
        let pool = self.handle()?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    fn handle(&self) -> Result<PgPool, sqlx::Error> {
        self.pool
            .load_full()
            .map(|pool| PgPool::clone(&pool))
            .ok_or(sqlx::Error::PoolClosed)
    }
}

impl std::fmt::Debug for PgDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDriver")
            .field("url", &self.redacted_url())
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Mask the password of a connection URL. Unparseable input is hidden entirely.
pub fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}
