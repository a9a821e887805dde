use crate::param::ParamLevel;
use crate::value::ParamKey;

/// Error types for sqlx-fragments
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown comparison or logic operator
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Field is not present in the allow-list
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Order direction other than `asc` / `desc`
    #[error("Invalid order modifier: {0}")]
    InvalidModifier(String),

    /// Boolean expression did not reduce to exactly one fragment
    #[error("Invalid where structure: {0}")]
    InvalidStructure(String),

    /// Placeholder had neither a binding nor a default at generation time
    #[error("Missing {level} parameter '{key}'")]
    MissingParameter { level: ParamLevel, key: ParamKey },

    /// Element that cannot be used as a template segment
    #[error("Unknown segment in template: {0}")]
    UnknownSegmentType(String),

    /// Fragment text and value list disagree on the number of placeholders
    #[error("Fragment has {placeholders} placeholders but {values} values")]
    PlaceholderMismatch { placeholders: usize, values: usize },

    /// Error during SQL template parsing
    #[error("Failed to parse SQL template: {0}")]
    Parse(#[from] regex::Error),

    /// Malformed JSON input
    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from SQLx database operations
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    pub(crate) fn missing(level: ParamLevel, key: &ParamKey) -> Self {
        Self::MissingParameter {
            level,
            key: key.clone(),
        }
    }
}

/// Result type alias for sqlx-fragments operations
pub type Result<T> = std::result::Result<T, Error>;
