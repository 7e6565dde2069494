use crate::types::FeatureId;

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("Allocation failed: {0}")]
    Allocation(String),

    #[error("Layer '{requested}' started while layer '{active}' is still active")]
    LayerAlreadyActive { active: String, requested: String },

    #[error("No active layer")]
    NoActiveLayer,

    #[error("Feature table full ({max} features)")]
    FeatureTableFull { max: FeatureId },

    #[error("Feature id {0} has no representable display character")]
    UnrepresentableId(FeatureId),

    #[error("Grid references unknown feature id {0}")]
    UnknownFeature(FeatureId),

    #[error("Invalid resolution {0}: must be at least 1")]
    InvalidResolution(u32),

    #[error("Invalid value '{value}' for format option {key}")]
    InvalidOption { key: String, value: String },

    #[error("Attribute evaluation failed: {0}")]
    Evaluator(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<std::collections::TryReserveError> for GridError {
    fn from(e: std::collections::TryReserveError) -> Self {
        GridError::Allocation(e.to_string())
    }
}
