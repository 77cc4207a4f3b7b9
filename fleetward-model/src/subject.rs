use std::fmt;

use uuid::Uuid;

use crate::{
    error::{ModelError, Result},
    ids::{AssetId, StudentId},
};

/// Which kind of subject a record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum SubjectKind {
    Student,
    Asset,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Student => "STUDENT",
            SubjectKind::Asset => "ASSET",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(SubjectKind::Student),
            "ASSET" => Ok(SubjectKind::Asset),
            _ => Err(ModelError::InvalidSubjectKind(raw.to_string())),
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to exactly one transported subject. Loose request fields are
/// narrowed through [`SubjectRef::from_parts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum SubjectRef {
    Student(StudentId),
    Asset(AssetId),
}

impl SubjectRef {
    pub fn from_parts(
        student: Option<StudentId>,
        asset: Option<AssetId>,
    ) -> Result<Self> {
        match (student, asset) {
            (Some(student), None) => Ok(SubjectRef::Student(student)),
            (None, Some(asset)) => Ok(SubjectRef::Asset(asset)),
            (Some(_), Some(_)) => Err(ModelError::ConflictingSubject),
            (None, None) => Err(ModelError::MissingSubject),
        }
    }

    pub fn from_kind(kind: SubjectKind, id: Uuid) -> Self {
        match kind {
            SubjectKind::Student => SubjectRef::Student(StudentId(id)),
            SubjectKind::Asset => SubjectRef::Asset(AssetId(id)),
        }
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            SubjectRef::Student(_) => SubjectKind::Student,
            SubjectRef::Asset(_) => SubjectKind::Asset,
        }
    }

    pub fn to_uuid(self) -> Uuid {
        match self {
            SubjectRef::Student(id) => id.to_uuid(),
            SubjectRef::Asset(id) => id.to_uuid(),
        }
    }

    pub fn student_id(&self) -> Option<StudentId> {
        match self {
            SubjectRef::Student(id) => Some(*id),
            SubjectRef::Asset(_) => None,
        }
    }

    pub fn asset_id(&self) -> Option<AssetId> {
        match self {
            SubjectRef::Asset(id) => Some(*id),
            SubjectRef::Student(_) => None,
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.to_uuid())
    }
}
