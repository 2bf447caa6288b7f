#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("Duplicate output column '{column}'")]
    DuplicateColumn { column: String },

    #[error("Missing column '{column}' in uploaded dataset")]
    MissingColumn { column: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Internal error: {0}")]
    Internal(String),
}
