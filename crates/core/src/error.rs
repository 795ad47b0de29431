use crate::field_mapping::MappingStatus;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid transition: cannot {action} field '{field}' in status {from}")]
    InvalidTransition {
        field: String,
        from: MappingStatus,
        action: &'static str,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing mapping session.
    pub fn session_not_found(integration_id: &str) -> Self {
        Self::NotFound {
            entity: "IntegrationMappingSession",
            id: integration_id.to_string(),
        }
    }

    /// Shorthand for a missing field inside a session.
    pub fn field_not_found(integration_id: &str, source_field: &str) -> Self {
        Self::NotFound {
            entity: "FieldMapping",
            id: format!("{integration_id}/{source_field}"),
        }
    }
}
