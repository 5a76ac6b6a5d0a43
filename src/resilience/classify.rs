//! Connection-error classification.
//!
//! The only place that knows which driver failures are about connectivity.
//! Retry logic asks [`ConnectionFault::is_connection_error`] and nothing else.

use std::io::ErrorKind;

/// Errors that can tell whether they were caused by lost connectivity.
pub trait ConnectionFault {
    /// True for transient infrastructure failures worth a reconnect and retry.
    fn is_connection_error(&self) -> bool;
}

impl ConnectionFault for sqlx::Error {
    fn is_connection_error(&self) -> bool {
        match self {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => true,
            sqlx::Error::Database(db) => db
                .code()
                .is_some_and(|code| is_connection_sqlstate(&code)),
            _ => false,
        }
    }
}

impl ConnectionFault for std::io::Error {
    fn is_connection_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ConnectionRefused
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::NotConnected
                | ErrorKind::BrokenPipe
                | ErrorKind::TimedOut
                | ErrorKind::UnexpectedEof
        )
    }
}

/// SQLSTATE codes reported by the server for connectivity problems.
///
/// Class 08 is "connection exception"; 57P01-57P03 mean the server is
/// shutting down or not accepting connections; 53300 is "too many connections".
pub fn is_connection_sqlstate(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03" | "53300")
}
