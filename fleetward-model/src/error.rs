use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    InvalidEventKind(String),
    InvalidSession(String),
    InvalidSubjectKind(String),
    InvalidStatus(String),
    InvalidRole(String),
    /// Both a student and an asset reference were supplied.
    ConflictingSubject,
    /// Neither a student nor an asset reference was supplied.
    MissingSubject,
    CoordinateOutOfRange { field: &'static str, value: f64 },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidEventKind(raw) => {
                write!(f, "invalid manifest status: {raw:?}")
            }
            ModelError::InvalidSession(raw) => {
                write!(f, "invalid session: {raw:?}")
            }
            ModelError::InvalidSubjectKind(raw) => {
                write!(f, "invalid subject kind: {raw:?}")
            }
            ModelError::InvalidStatus(raw) => {
                write!(f, "invalid panic status: {raw:?}")
            }
            ModelError::InvalidRole(raw) => write!(f, "invalid role: {raw:?}"),
            ModelError::ConflictingSubject => {
                write!(f, "exactly one of studentId or assetId must be provided, not both")
            }
            ModelError::MissingSubject => {
                write!(f, "either studentId or assetId is required")
            }
            ModelError::CoordinateOutOfRange { field, value } => {
                write!(f, "{field} is out of range: {value}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
