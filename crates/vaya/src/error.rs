//! Error types for vaya.
//!
//! This module defines all error types used throughout the vaya crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for vaya operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Family Tree Errors ===
    /// A member id does not exist in the tree.
    #[error("member not found: {id}")]
    MemberNotFound {
        /// The missing member id.
        id: String,
    },

    /// A relationship id does not exist in the tree.
    #[error("connection not found: {id}")]
    ConnectionNotFound {
        /// The missing relationship id.
        id: String,
    },

    /// The pair is already connected by some relationship.
    #[error("members {source_id} and {target} are already connected")]
    DuplicateConnection {
        /// One endpoint of the existing connection.
        source_id: String,
        /// The other endpoint.
        target: String,
    },

    /// A member cannot be connected to itself.
    #[error("cannot connect member {id} to itself")]
    SelfConnection {
        /// The member id used for both endpoints.
        id: String,
    },

    /// A removal was requested but the collection is empty.
    #[error("nothing to remove: no {what} in the tree")]
    NothingToRemove {
        /// What was asked to be removed ("members" or "connections").
        what: &'static str,
    },

    /// A required member field is missing or blank.
    #[error("member field '{field}' must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    // === Workbook Errors ===
    /// The file extension is not a supported spreadsheet format.
    #[error("unsupported spreadsheet format: {path} (expected .xlsx or .xls)")]
    UnsupportedExtension {
        /// Path of the rejected file.
        path: PathBuf,
    },

    /// The first worksheet contains no rows.
    #[error("worksheet '{name}' is empty")]
    EmptyWorksheet {
        /// Name of the empty worksheet.
        name: String,
    },

    /// A required column is missing from the header row.
    #[error("worksheet is missing required column '{column}'")]
    MissingColumn {
        /// Name of the missing column.
        column: &'static str,
    },

    /// Failed to read a workbook.
    #[error("failed to read workbook {path}: {message}")]
    WorkbookRead {
        /// Path of the workbook.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// Failed to write a workbook.
    #[error("failed to write workbook: {message}")]
    WorkbookWrite {
        /// Description of what went wrong.
        message: String,
    },

    // === Transcription Errors ===
    /// The transcription endpoint returned a non-success status.
    #[error("transcription failed (status {status}): {message}")]
    Transcription {
        /// HTTP status code.
        status: u16,
        /// Response body or error detail.
        message: String,
    },

    /// The transcription endpoint could not be reached.
    #[error("transcription service unavailable: {0}")]
    TranscriptionUnavailable(String),

    // === Capture Errors ===
    /// A recording session finished without receiving any audio.
    #[error("recording is empty")]
    RecordingEmpty,

    /// An audio source failed to start.
    #[error("failed to start audio source '{name}': {message}")]
    AudioSourceStart {
        /// Name of the audio source.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// An audio source failed to stop.
    #[error("failed to stop audio source '{name}': {message}")]
    AudioSourceStop {
        /// Name of the audio source.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for vaya operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a member-not-found error.
    #[must_use]
    pub fn member_not_found(id: impl Into<String>) -> Self {
        Self::MemberNotFound { id: id.into() }
    }

    /// Create a connection-not-found error.
    #[must_use]
    pub fn connection_not_found(id: impl Into<String>) -> Self {
        Self::ConnectionNotFound { id: id.into() }
    }

    /// Create a duplicate-connection error.
    #[must_use]
    pub fn duplicate_connection(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::DuplicateConnection {
            source_id: source.into(),
            target: target.into(),
        }
    }

    /// Create a workbook read error.
    #[must_use]
    pub fn workbook_read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::WorkbookRead {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a workbook write error.
    #[must_use]
    pub fn workbook_write(message: impl Into<String>) -> Self {
        Self::WorkbookWrite {
            message: message.into(),
        }
    }

    /// Create an audio source start error.
    #[must_use]
    pub fn audio_source_start(name: &'static str, message: impl Into<String>) -> Self {
        Self::AudioSourceStart {
            name,
            message: message.into(),
        }
    }

    /// Create an audio source stop error.
    #[must_use]
    pub fn audio_source_stop(name: &'static str, message: impl Into<String>) -> Self {
        Self::AudioSourceStop {
            name,
            message: message.into(),
        }
    }

    /// Check if this error is a rejected duplicate connection.
    #[must_use]
    pub fn is_duplicate_connection(&self) -> bool {
        matches!(self, Self::DuplicateConnection { .. })
    }

    /// Check if this error signals an empty-collection removal.
    #[must_use]
    pub fn is_nothing_to_remove(&self) -> bool {
        matches!(self, Self::NothingToRemove { .. })
    }
}
