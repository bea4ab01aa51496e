//! Error types for dnpath-core

use std::fmt;
use thiserror::Error;

/// Directory error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable directory server
    Unreachable,
    /// Bound identity may not read or write the entry
    PermissionDenied,
    /// Query or mutation did not complete in time
    Timeout,
    /// An entry with the same name already exists under the parent
    AlreadyExists,
    /// Parent entry does not exist
    NoSuchParent,
    /// Operation not supported for this object class
    Unsupported,
    /// Backing database errors (SQLite directory files)
    Database,
    /// I/O errors
    IO,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unreachable => "unreachable",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::Timeout => "timeout",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NoSuchParent => "no_such_parent",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Database => "database",
            ErrorKind::IO => "io",
        }
    }

    /// Transient kinds may succeed when the same call is repeated later
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::Unreachable | ErrorKind::Timeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error raised by a directory client or server locator
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct DirectoryError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl DirectoryError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unreachable, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn already_exists(dn: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::AlreadyExists,
            format!("Entry already exists: {}", dn.into()),
        )
    }

    pub fn no_such_parent(dn: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::NoSuchParent,
            format!("Parent does not exist: {}", dn.into()),
        )
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }
}

// SQLite error conversions
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DirectoryError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        let kind = match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => ErrorKind::Timeout,
            Some(ErrorCode::ReadOnly) | Some(ErrorCode::PermissionDenied) => {
                ErrorKind::PermissionDenied
            }
            Some(ErrorCode::CannotOpen) => ErrorKind::Unreachable,
            _ => ErrorKind::Database,
        };
        DirectoryError::new(kind, format!("SQLite error: {}", err)).with_source(err)
    }
}

impl From<std::io::Error> for DirectoryError {
    fn from(err: std::io::Error) -> Self {
        DirectoryError::new(ErrorKind::IO, format!("I/O error: {}", err)).with_source(err)
    }
}

/// Input path does not match the `TYPE=value[,TYPE=value...]` grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Path is empty")]
    Empty,

    #[error("Malformed token '{token}' at position {position}: expected TYPE=value")]
    MalformedToken { token: String, position: usize },

    #[error("Token '{token}' has an empty value")]
    EmptyValue { token: String },

    #[error("Hierarchy token '{token}' appears after the root")]
    MisplacedSegment { token: String },

    #[error("Path '{path}' has no root component")]
    MissingRoot { path: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DirectoryError>;
