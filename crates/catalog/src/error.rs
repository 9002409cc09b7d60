//! Error types for catalog operations.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failures a catalog operation can report to its caller.
///
/// Rows that cannot be interpreted are never represented here: sources drop
/// them and log at `debug`.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The remote document could not be reached, authenticated or read.
    #[error("source unreachable: {message}")]
    SourceUnreachable {
        /// Description of the transport or status failure.
        message: String,
    },

    /// Insert or rename collides with an existing connector.
    #[error("connector '{name}' already exists in {location}")]
    DuplicateKey {
        /// Normalized name that collided.
        name: String,
        /// Which view of the catalog already holds it.
        location: &'static str,
    },

    /// A remote write was attempted without credentials or was refused.
    #[error("remote write denied: {message}")]
    WriteDenied {
        /// Why the write was refused.
        message: String,
    },

    /// Edit or delete target is absent from the catalog.
    #[error("connector '{name}' not found")]
    NotFound {
        /// Name as supplied by the caller.
        name: String,
    },

    /// The remote source is switched off for this deployment.
    #[error("remote catalog is disabled")]
    RemoteDisabled,

    /// Connector name is empty after trimming.
    #[error("connector name must not be empty")]
    InvalidName,

    /// Size is negative or not a finite number.
    #[error("invalid size {value}: must be a finite number >= 0")]
    InvalidSize {
        /// The rejected value.
        value: f64,
    },

    /// Local file I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    pub(crate) fn unreachable(message: impl Into<String>) -> Self {
        Self::SourceUnreachable {
            message: message.into(),
        }
    }

    pub(crate) fn denied(message: impl Into<String>) -> Self {
        Self::WriteDenied {
            message: message.into(),
        }
    }
}
