//! Errors raised while building or saving a faction record.

use thiserror::Error;

/// Error type returned by persistence backends.
pub type PersistenceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures of faction construction and persistence.
///
/// A dangling or malformed home is deliberately not part of this enum: it is
/// reported as a [`HomeWarning`](crate::HomeWarning) and never aborts
/// construction.
#[derive(Debug, Error)]
pub enum FactionError {
    /// `id` or `name` was absent (or null) in the construction source.
    #[error("faction source is missing required field '{field}'")]
    MissingField { field: &'static str },

    /// A member entry resolved to a player bound to another faction.
    #[error(
        "can not assign player '{player}' to faction '{faction}' while they are a member of faction '{current}'"
    )]
    ConflictingMembership {
        player: String,
        faction: String,
        current: String,
    },

    /// `save` was called on a record its registry no longer knows.
    #[error("faction data '{id}' is not assigned to a registered faction")]
    Orphaned { id: String },

    /// The construction source was not a key/value object.
    #[error("faction source must be an object, got {found}")]
    NotAnObject { found: &'static str },

    /// A present field had the wrong type.
    #[error("invalid faction source: {0}")]
    InvalidSource(#[from] serde_json::Error),

    /// The persistence backend rejected the record.
    #[error("failed to persist faction '{id}': {source}")]
    Persistence {
        id: String,
        #[source]
        source: PersistenceError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_names_player() {
        let err = FactionError::ConflictingMembership {
            player: "steve".to_string(),
            faction: "f1".to_string(),
            current: "f2".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("'steve'"));
        assert!(message.contains("'f2'"));
    }

    #[test]
    fn test_persistence_error_keeps_source() {
        use std::error::Error as _;

        let err = FactionError::Persistence {
            id: "f1".to_string(),
            source: "disk full".into(),
        };
        assert_eq!(err.source().map(|s| s.to_string()), Some("disk full".to_string()));
    }
}
