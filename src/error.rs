// Engine error types.
//
// The library reports typed errors so callers can tell a bad configuration
// apart from bad input data. The binary wraps these in anyhow with context.

use thiserror::Error;

/// Errors raised while configuring the engine or building a tree.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Column not found in table: {0}")]
    MissingColumn(String),

    #[error(
        "Invalid class filter: class_column and class_value must both be set or both be unset \
         (got column={column:?}, value={value:?})"
    )]
    InvalidClassFilter {
        column: Option<String>,
        value: Option<String>,
    },

    #[error("Label {label:?} appears in more than one hierarchy level ({levels})")]
    LabelCollision { label: String, levels: String },

    #[error("Label {label:?} at level {level:?} has more than one parent ({parents})")]
    AmbiguousParent {
        label: String,
        level: String,
        parents: String,
    },

    #[error("Malformed input table: {0}")]
    MalformedInput(String),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::MissingColumn("Zone".to_string());
        assert!(format!("{err}").contains("Column not found"));
        assert!(format!("{err}").contains("Zone"));

        let err = EngineError::InvalidClassFilter {
            column: Some("emotion".to_string()),
            value: None,
        };
        let msg = format!("{err}");
        assert!(msg.contains("both be set"));
        assert!(msg.contains("emotion"));

        let err = EngineError::LabelCollision {
            label: "Monaco".to_string(),
            levels: "Cluster, Country".to_string(),
        };
        assert!(format!("{err}").contains("Monaco"));
    }
}
