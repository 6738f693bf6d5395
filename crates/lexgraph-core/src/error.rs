//! Error types for Lexgraph

use thiserror::Error;

/// Result type alias using Lexgraph's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Lexgraph error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Lookup errors (E001-E099)
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    // Access errors (E100-E199)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // Extraction errors (E200-E299)
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Network error: {0}. Check that the extraction service is reachable.")]
    NetworkError(#[from] reqwest::Error),

    // Input errors (E300-E399)
    #[error("Invalid input: {0}")]
    ValidationError(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a `NotFound` error
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Shorthand for a `ValidationError`
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Shorthand for a `PermissionDenied` error
    pub fn denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E001",
            Self::PermissionDenied(_) => "E100",
            Self::ExtractionFailed(_) => "E200",
            Self::NetworkError(_) => "E201",
            Self::ValidationError(_) => "E300",
            Self::DatabaseError(_) => "E400",
            Self::SerializationError(_) => "E401",
            Self::ConfigError(_) => "E600",
            Self::Other(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound { kind, .. } if *kind == "graph" => {
                Some("Build the graph first with POST /graph".to_string())
            }
            Self::PermissionDenied(_) => {
                Some("Ask the session owner to share the graph with you".to_string())
            }
            Self::NetworkError(_) => {
                Some("Check extraction.base_url or LEXGRAPH_EXTRACTION_URL".to_string())
            }
            Self::ConfigError(_) => Some("Check your lexgraph config.toml".to_string()),
            _ => None,
        }
    }

    /// Whether this error means the target does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
