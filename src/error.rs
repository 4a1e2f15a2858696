//! Error types for the ncli tool.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=config, 3=auth, 4=index, 5=export, 6=io)
//! - Context-aware recovery hints

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::source::SourceError;

/// Result type alias for ncli operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based exit
/// code, so shell scripts can branch on the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Config (exit 2)
    ConfigError,
    ConfigNotFound,

    // Authentication (exit 3)
    AuthError,

    // Index (exit 4)
    IndexCorrupt,

    // Export (exit 5)
    ItemFailures,
    InvalidSource,
    FetchFailed,

    // I/O (exit 6)
    IoError,
    ParseError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::ConfigNotFound => "CONFIG_NOT_FOUND",
            Self::AuthError => "AUTH_ERROR",
            Self::IndexCorrupt => "INDEX_CORRUPT",
            Self::ItemFailures => "ITEM_FAILURES",
            Self::InvalidSource => "INVALID_SOURCE",
            Self::FetchFailed => "FETCH_FAILED",
            Self::IoError => "IO_ERROR",
            Self::ParseError => "PARSE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-6).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::ConfigError | Self::ConfigNotFound => 2,
            Self::AuthError => 3,
            Self::IndexCorrupt => 4,
            Self::ItemFailures | Self::InvalidSource | Self::FetchFailed => 5,
            Self::IoError | Self::ParseError => 6,
        }
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in ncli operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Authentication failed: {0}")]
    AdapterAuth(String),

    /// The persisted export index could not be parsed. Fatal: the index is
    /// the record of prior exports and is never silently discarded.
    #[error("Export index at {path} is corrupt: {message}")]
    IndexCorrupt { path: PathBuf, message: String },

    /// One or more items failed during an export run. The run itself
    /// completed; the failures were already reported per item.
    #[error("{count} item(s) failed during export")]
    ItemFailures { count: usize },

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// A remote fetch failed outside the per-item loop (the library listing,
    /// a video page). Usually transient.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::ConfigError,
            Self::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Self::AdapterAuth(_) => ErrorCode::AuthError,
            Self::IndexCorrupt { .. } => ErrorCode::IndexCorrupt,
            Self::ItemFailures { .. } => ErrorCode::ItemFailures,
            Self::InvalidSource(_) => ErrorCode::InvalidSource,
            Self::Fetch(_) => ErrorCode::FetchFailed,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) | Self::TomlDe(_) | Self::TomlSer(_) => ErrorCode::ParseError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ConfigNotFound { path } => Some(format!(
                "Create a config file at {} or pass one with --config.",
                path.display()
            )),

            Self::AdapterAuth(_) => Some(
                "The stored session is invalid or expired. \
                 Re-export the auth file from an authenticated device."
                    .to_string(),
            ),

            Self::IndexCorrupt { path, .. } => Some(format!(
                "Repair {} by hand, or delete it to start a fresh index \
                 (a full re-export will follow).",
                path.display()
            )),

            Self::ItemFailures { .. } => Some(
                "Re-run the export; completed items are skipped and only the \
                 failed ones are retried."
                    .to_string(),
            ),

            Self::Fetch(_) => {
                Some("Likely a transient network failure; re-run the export.".to_string())
            }

            Self::Config(_)
            | Self::InvalidSource(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::TomlDe(_)
            | Self::TomlSer(_)
            | Self::Other(_) => None,
        }
    }
}

impl From<SourceError> for Error {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Auth(msg) => Self::AdapterAuth(msg),
            SourceError::Fetch(msg) => Self::Fetch(msg),
        }
    }
}
