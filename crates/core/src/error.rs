use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThreatlensError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate element id: {0}")]
    DuplicateElement(String),

    #[error("Element '{element}' references unknown element '{target}' via '{relation}'")]
    UnknownTarget {
        element: String,
        relation: String,
        target: String,
    },

    #[error("Relation '{relation}' is not valid on {category} element '{element}'")]
    InvalidRelation {
        element: String,
        category: String,
        relation: String,
    },

    #[error("Relation '{relation}' on '{element}' points at {found} '{target}', expected {expected}")]
    RelationCategory {
        element: String,
        relation: String,
        target: String,
        found: String,
        expected: String,
    },
}

pub type Result<T> = std::result::Result<T, ThreatlensError>;
