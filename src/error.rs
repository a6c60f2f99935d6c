//! Error kinds shared by every backend.
//!
//! Backends translate their native failures into these variants so callers
//! can write one piece of logic for "no such secret" on every platform.
//! Messages never carry secret values.

/// Canonical outcome of a failed credential operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No credential exists for the requested (service, account).
    #[error("credential not found")]
    NotFound,

    /// The store refused the operation (locked keyring, dismissed prompt, policy).
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A backend precondition is missing, or no backend exists for this platform.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Any other failure reported by the underlying store.
    #[error("backend failure: {0}")]
    Backend(String),

    /// The secret does not fit the backend's hard size limit.
    #[error("secret too large for backend (limit {limit} bytes)")]
    TooLarge { limit: usize },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
