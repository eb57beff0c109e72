//! Canvas error type.
//!
//! Nothing here reaches the user directly: the engine logs these and falls
//! back (skip the object, keep the gesture moving).

use replica::ReplicaError;

#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("malformed serialized shape: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("{kind} is missing `{field}`")]
    MissingField { kind: &'static str, field: &'static str },
    #[error("invalid object id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Replica(#[from] ReplicaError),
}

impl CanvasError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "E_MALFORMED_SHAPE",
            Self::MissingField { .. } => "E_MISSING_FIELD",
            Self::InvalidId(_) => "E_INVALID_ID",
            Self::Replica(e) => e.error_code(),
        }
    }
}
