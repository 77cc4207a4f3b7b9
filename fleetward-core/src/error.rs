use fleetward_model::ModelError;
use thiserror::Error;

/// Caller-fixable problems with the shape or content of a request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid status {0:?}; expected CHECKED_IN or CHECKED_OUT")]
    InvalidEventKind(String),

    #[error("invalid session {0:?}; expected MORNING or EVENING")]
    InvalidSession(String),

    #[error("exactly one of studentId or assetId must be provided, not both")]
    ConflictingSubject,

    #[error("either studentId or assetId is required")]
    MissingSubject,

    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("{0}")]
    Invalid(String),
}

impl From<ModelError> for ValidationError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidEventKind(raw) => Self::InvalidEventKind(raw),
            ModelError::InvalidSession(raw) => Self::InvalidSession(raw),
            ModelError::ConflictingSubject => Self::ConflictingSubject,
            ModelError::MissingSubject => Self::MissingSubject,
            ModelError::CoordinateOutOfRange { field, value } => {
                Self::OutOfRange { field, value }
            }
            other => Self::Invalid(other.to_string()),
        }
    }
}

/// Pull a required field out of an optional request value.
pub fn require<T>(
    value: Option<T>,
    field: &'static str,
) -> std::result::Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{reason}")]
    DuplicateManifestEntry { reason: String },

    #[error(
        "a panic alert was raised moments ago; try again in {remaining_secs} seconds"
    )]
    CooldownActive { remaining_secs: i64 },

    #[error("assistant {assistant_id} is not assigned to bus {vehicle_id}")]
    AssistantNotAssigned {
        assistant_id: String,
        vehicle_id: String,
    },

    #[error("{0}")]
    Forbidden(String),

    #[error("external dependency failed: {0}")]
    ExternalDependency(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[cfg(feature = "database")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Coarse classification used by transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Authorization,
    ExternalDependency,
    Internal,
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::DuplicateManifestEntry { .. }
            | CoreError::CooldownActive { .. } => ErrorKind::Conflict,
            CoreError::AssistantNotAssigned { .. }
            | CoreError::Forbidden(_) => ErrorKind::Authorization,
            CoreError::ExternalDependency(_) => ErrorKind::ExternalDependency,
            CoreError::Internal(_) => ErrorKind::Internal,
            #[cfg(feature = "database")]
            CoreError::Database(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-checkable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::DuplicateManifestEntry { .. } => {
                "DUPLICATE_MANIFEST_ENTRY"
            }
            CoreError::CooldownActive { .. } => "COOLDOWN_ACTIVE",
            CoreError::AssistantNotAssigned { .. } => "ASSISTANT_NOT_ASSIGNED",
            CoreError::Forbidden(_) => "FORBIDDEN",
            CoreError::ExternalDependency(_) => "EXTERNAL_DEPENDENCY",
            CoreError::Internal(_) => "INTERNAL",
            #[cfg(feature = "database")]
            CoreError::Database(_) => "INTERNAL",
        }
    }
}

impl From<ModelError> for CoreError {
    fn from(err: ModelError) -> Self {
        CoreError::Validation(err.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_become_validation_errors() {
        let err: CoreError = ModelError::InvalidEventKind("bogus".into()).into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidEventKind(ref raw)) if raw == "bogus"
        ));
    }

    #[test]
    fn conflicts_keep_distinct_codes() {
        let duplicate = CoreError::DuplicateManifestEntry {
            reason: "already".into(),
        };
        let cooldown = CoreError::CooldownActive { remaining_secs: 12 };
        assert_eq!(duplicate.kind(), ErrorKind::Conflict);
        assert_eq!(cooldown.kind(), ErrorKind::Conflict);
        assert_ne!(duplicate.code(), cooldown.code());
        assert!(cooldown.to_string().contains("12 seconds"));
    }
}
