//! Shared error type across tally crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// The backing store failed or could not be reached.
    DbError,
    /// Invalid configuration.
    BadConfig,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::DbError => "DB_ERROR",
            ClientCode::BadConfig => "BAD_CONFIG",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Unified error type used by core and server.
///
/// `StoreUnreachable`, `SchemaInitFailed` and `Config` only occur during
/// startup and terminate the process. `Store` is per-operation and is
/// reported to the caller.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("store unreachable after {attempts} attempts")]
    StoreUnreachable { attempts: u32 },
    #[error("schema init failed: {0}")]
    SchemaInitFailed(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl TallyError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            TallyError::StoreUnreachable { .. }
            | TallyError::SchemaInitFailed(_)
            | TallyError::Store(_) => ClientCode::DbError,
            TallyError::Config(_) => ClientCode::BadConfig,
            TallyError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Whether the error must stop the process instead of being reported
    /// per request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TallyError::StoreUnreachable { .. }
                | TallyError::SchemaInitFailed(_)
                | TallyError::Config(_)
        )
    }

    /// Bare message without the variant prefix (`detail` field of error bodies).
    pub fn detail(&self) -> String {
        match self {
            TallyError::SchemaInitFailed(m)
            | TallyError::Store(m)
            | TallyError::Config(m)
            | TallyError::Internal(m) => m.clone(),
            TallyError::StoreUnreachable { .. } => self.to_string(),
        }
    }
}
