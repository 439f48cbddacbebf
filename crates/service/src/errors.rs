use thiserror::Error;

/// Failures produced by [`crate::store::Store`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("user with this email already exists")]
    Conflict,
    #[error("complaint {0} not found")]
    NotFound(u64),
    #[error("complaint {0} is already resolved")]
    AlreadyResolved(u64),
    #[error("owner account {0} does not exist")]
    OwnerNotFound(u64),
    #[error("could not generate a unique secret code after {0} attempts")]
    TokenExhausted(usize),
}
