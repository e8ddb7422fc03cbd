//! Error types for the Lectern SDK

use crate::model::SiblingScope;
use lectern_client::ClientError;
use thiserror::Error;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK error types
#[derive(Error, Debug)]
pub enum SdkError {
    /// Duplicate order values or ids in a loaded sibling set
    #[error("Malformed order: {0}")]
    MalformedOrder(String),

    /// Reindex referenced an id that is not in the store
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Reindex sequence repeats or omits ids
    #[error("Invalid permutation: expected {expected} distinct ids, got {actual}")]
    InvalidPermutation { expected: usize, actual: usize },

    /// Reorder rejected by the service; local state was rolled back
    #[error("Reorder of {scope} under {parent_id} failed: {reason}")]
    ReorderFailed {
        scope: SiblingScope,
        parent_id: String,
        reason: String,
    },

    /// Lesson completion refused until the previous lesson is complete
    #[error("Lesson {0} is locked: complete the previous lesson first")]
    LessonLocked(String),

    /// Quiz submission refused until every lesson of the module is complete
    #[error("Quiz {0} is locked: complete every lesson of the module first")]
    QuizLocked(String),

    /// A sub-fetch of a hierarchy load failed
    #[error("Failed to load hierarchy for course {course_id} ({stage}): {source}")]
    HierarchyLoad {
        course_id: String,
        stage: String,
        #[source]
        source: ClientError,
    },

    /// Operation references something outside the loaded hierarchy
    #[error("Not loaded: {0}")]
    NotLoaded(String),

    /// Content service error
    #[error("Content service error: {0}")]
    Service(#[from] ClientError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SdkError {
    /// Whether the error is a gating rejection that should be shown to the
    /// learner verbatim rather than retried
    pub fn is_gate_rejection(&self) -> bool {
        matches!(self, SdkError::LessonLocked(_) | SdkError::QuizLocked(_))
    }
}

impl From<toml::de::Error> for SdkError {
    fn from(err: toml::de::Error) -> Self {
        SdkError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SdkError {
    fn from(err: toml::ser::Error) -> Self {
        SdkError::Config(err.to_string())
    }
}
