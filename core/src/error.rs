//! Error taxonomy for ticket issuance and minting operations.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error taxonomy shared across the pipeline.
///
/// Validation and authorization failures are terminal and surface before
/// any write. Persistence failures during issuance abort the whole batch.
/// External-service failures during queued minting are captured on the job
/// rather than raised to the issuance caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Malformed or out-of-range input; no side effects occurred.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Caller is not permitted to manage the event.
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// Identifier that failed to resolve.
        id: String,
    },

    /// State transition rejected: the record is not in the required state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Blockchain RPC, metadata upload, or confirmation failure.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Database read or write failure.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl CoreError {
    /// Build a `NotFound` error for an entity kind and id.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns `true` if this error is due to invalid caller input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Authorization(_))
    }

    /// Returns `true` if retrying the operation later could succeed.
    ///
    /// Conflicts (lost claim races) and external-service failures are
    /// transient; validation and missing entities are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::ExternalService(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_formats_entity_and_id() {
        let err = CoreError::not_found("Event", "abc-123");
        assert_eq!(err.to_string(), "Event abc-123 not found");
    }

    #[test]
    fn error_categories() {
        assert!(CoreError::Validation("quantity".into()).is_user_error());
        assert!(!CoreError::Persistence("down".into()).is_user_error());
        assert!(CoreError::ExternalService("rpc timeout".into()).is_retryable());
        assert!(!CoreError::Validation("bad".into()).is_retryable());
    }
}
