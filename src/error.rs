//! Error types for verchain
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! [`VersionError`] groups failures into four families:
//!
//! - **Not found**: an unknown file id, version id or version number
//! - **Invalid operation**: the call would break a chain invariant, such as
//!   deleting the active version
//! - **I/O**: reading, copying, stat-ing or deleting content failed
//! - **Validation**: malformed query parameters or configuration

use thiserror::Error;

/// Type alias for Results in the verchain library
pub type Result<T> = std::result::Result<T, VersionError>;

/// Main error type for all versioning operations
#[derive(Debug, Error)]
pub enum VersionError {
    /// I/O errors during content operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors while parsing JSON configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No versions exist for the file id
    #[error("No versions found for file: {0}")]
    FileNotFound(String),

    /// Version id is unknown for the file
    #[error("Version {version_id} not found for file {file_id}")]
    VersionNotFound {
        /// Logical file id
        file_id: String,
        /// Requested version id
        version_id: String,
    },

    /// Version number is unknown for the file
    #[error("Version number {version} not found for file {file_id}")]
    VersionNumberNotFound {
        /// Logical file id
        file_id: String,
        /// Requested version number
        version: u32,
    },

    /// The operation would violate a version chain invariant
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Malformed query or request parameters
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl VersionError {
    /// Create an invalid-operation error with a custom message
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        VersionError::InvalidOperation(msg.into())
    }

    /// Create a validation error with a custom message
    pub fn validation(msg: impl Into<String>) -> Self {
        VersionError::Validation(msg.into())
    }

    /// Check if this error reports a missing file or version
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            VersionError::FileNotFound(_)
                | VersionError::VersionNotFound { .. }
                | VersionError::VersionNumberNotFound { .. }
        )
    }

    /// Check if this error reports a rejected invariant violation
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, VersionError::InvalidOperation(_))
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            VersionError::FileNotFound(file_id) => {
                format!("File '{}' has no versions. Create one with 'create' first.", file_id)
            }
            VersionError::VersionNumberNotFound { file_id, version } => {
                format!(
                    "File '{}' has no version {}. Use 'history {}' to list available versions.",
                    file_id, version, file_id
                )
            }
            VersionError::InvalidOperation(msg) if msg.contains("active") => {
                format!("{}. Create a newer version first so this one is no longer active.", msg)
            }
            _ => self.to_string(),
        }
    }
}
