use thiserror::Error;

/// Main error type for GraphMem
#[derive(Error, Debug)]
pub enum GraphMemError {
    /// Referenced entity does not exist
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Entity creation with an already-used name
    #[error("Entity already exists: {0}")]
    DuplicateEntity(String),

    /// Relation creation duplicating an existing (from, to, type) triple
    #[error("Relation already exists: {from} -[{relation_type}]-> {to}")]
    DuplicateRelation {
        from: String,
        to: String,
        relation_type: String,
    },

    /// Memory file could not be read or written
    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    /// A persisted record could not be parsed or serialized.
    /// At load time this is recovered per line (warn and skip).
    #[error("Malformed record: {0}")]
    MalformedRecord(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Protocol(String),
}

/// Convenient Result type using GraphMemError
pub type Result<T> = std::result::Result<T, GraphMemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_errors_display() {
        let err = GraphMemError::EntityNotFound("Alice".to_string());
        assert_eq!(err.to_string(), "Entity not found: Alice");

        let err = GraphMemError::DuplicateEntity("Alice".to_string());
        assert_eq!(err.to_string(), "Entity already exists: Alice");
    }

    #[test]
    fn test_duplicate_relation_display() {
        let err = GraphMemError::DuplicateRelation {
            from: "Alice".to_string(),
            to: "Bob".to_string(),
            relation_type: "knows".to_string(),
        };
        assert_eq!(err.to_string(), "Relation already exists: Alice -[knows]-> Bob");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GraphMemError = io_err.into();
        assert!(matches!(err, GraphMemError::Persistence(_)));
    }

    #[test]
    fn test_error_from_serde() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: GraphMemError = json_err.into();
        assert!(matches!(err, GraphMemError::MalformedRecord(_)));
    }
}
