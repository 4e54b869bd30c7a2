//! Error types for the vector layer engine.

use thiserror::Error;

/// Result type alias using VectorError.
pub type VectorResult<T> = Result<T, VectorError>;

/// Primary error type for catalog and cache operations.
///
/// Messages are safe to show to clients: none of them carry filesystem paths
/// or client-supplied identifiers.
#[derive(Debug, Clone, Error)]
pub enum VectorError {
    // === Discovery Errors ===
    /// A container file could not be opened or listed.
    #[error("Failed to read source {file}: {message}")]
    SourceRead { file: String, message: String },

    /// Coordinate transformation failed for a layer.
    #[error("Reprojection from {crs} failed: {message}")]
    Reprojection { crs: String, message: String },

    /// The data directory itself could not be enumerated.
    #[error("Discovery failed: {0}")]
    Discovery(String),

    // === Request Errors ===
    /// Identifier matched no discovered layer.
    #[error("Layer not found")]
    NotFound,

    /// Tier-1/tier-2 load failed at request time.
    #[error("Layer could not be loaded")]
    Load { reason: String },

    /// Resolution attempted before discovery completed.
    #[error("Layer catalog is not ready")]
    CatalogNotReady,

    // === Infrastructure Errors ===
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VectorError {
    pub fn source_read(file: impl Into<String>, message: impl ToString) -> Self {
        Self::SourceRead {
            file: file.into(),
            message: message.to_string(),
        }
    }

    pub fn reprojection(crs: impl ToString, message: impl ToString) -> Self {
        Self::Reprojection {
            crs: crs.to_string(),
            message: message.to_string(),
        }
    }

    pub fn load(reason: impl ToString) -> Self {
        Self::Load {
            reason: reason.to_string(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            VectorError::NotFound => 404,
            VectorError::CatalogNotReady => 503,
            _ => 500,
        }
    }

    /// Whether the caller may retry the same request later.
    pub fn is_transient(&self) -> bool {
        matches!(self, VectorError::CatalogNotReady)
    }
}

impl From<std::io::Error> for VectorError {
    fn from(err: std::io::Error) -> Self {
        VectorError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        VectorError::Internal(format!("JSON error: {}", err))
    }
}
