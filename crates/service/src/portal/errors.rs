use thiserror::Error;

use crate::errors::StoreError;

/// Business errors for portal workflows
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortalError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid secret code")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("User with this email already exists")]
    Conflict,
    #[error("Complaint not found")]
    NotFound,
    #[error("Complaint is already resolved")]
    AlreadyResolved,
    #[error("internal error: {0}")]
    Internal(String),
}

impl PortalError {
    pub fn admin_required() -> Self { Self::Forbidden("Access denied. Admin privileges required".into()) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            PortalError::Validation(_) => 2001,
            PortalError::Conflict => 2002,
            PortalError::NotFound => 2003,
            PortalError::Unauthorized => 2004,
            PortalError::Forbidden(_) => 2005,
            PortalError::AlreadyResolved => 2006,
            PortalError::Internal(_) => 2100,
        }
    }
}

impl From<StoreError> for PortalError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => PortalError::Conflict,
            StoreError::NotFound(_) => PortalError::NotFound,
            StoreError::AlreadyResolved(_) => PortalError::AlreadyResolved,
            // the caller was authenticated a moment ago and accounts are never removed
            StoreError::OwnerNotFound(_) => PortalError::Unauthorized,
            StoreError::TokenExhausted(_) => PortalError::Internal(e.to_string()),
        }
    }
}
