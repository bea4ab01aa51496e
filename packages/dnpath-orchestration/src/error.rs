use dnpath_core::{ActionRecord, DirectoryError, ErrorKind, FormatError, PathSegment};
use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, MaterializeError>;

#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("Invalid path: {0}")]
    Format(#[from] FormatError),

    /// Failure before traversal started (server resolution, opening the directory)
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// A segment's existence query or creation failed; containers created
    /// before it remain in the directory
    #[error("Failed to materialize '{segment}' under '{prefix}': {source}")]
    SegmentFailed {
        segment: PathSegment,
        prefix: String,
        source: DirectoryError,
        actions: Vec<ActionRecord>,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MaterializeError {
    pub fn serialization<E: std::fmt::Display>(e: E) -> Self {
        Self::Serialization(e.to_string())
    }

    /// Actions recorded before the run aborted
    pub fn actions(&self) -> &[ActionRecord] {
        match self {
            MaterializeError::SegmentFailed { actions, .. } => actions,
            _ => &[],
        }
    }

    pub fn directory_error(&self) -> Option<&DirectoryError> {
        match self {
            MaterializeError::Directory(e) => Some(e),
            MaterializeError::SegmentFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        if let Some(err) = self.directory_error() {
            return match err.kind {
                kind if kind.is_transient() => ErrorCategory::Transient,
                ErrorKind::Database | ErrorKind::IO => ErrorCategory::Infrastructure,
                _ => ErrorCategory::Permanent,
            };
        }
        match self {
            MaterializeError::Io(_) | MaterializeError::Other(_) => ErrorCategory::Infrastructure,
            _ => ErrorCategory::Permanent,
        }
    }
}

/// Error category for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Transient error - rerunning may succeed (e.g., timeout, unreachable server)
    Transient,
    /// Permanent error - don't retry (e.g., invalid path, permission denied)
    Permanent,
    /// Infrastructure error - local environment problem (e.g., corrupt directory file)
    Infrastructure,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transient => "transient",
            ErrorCategory::Permanent => "permanent",
            ErrorCategory::Infrastructure => "infrastructure",
        }
    }

    /// Process exit status (sysexits `EX_TEMPFAIL` for transient failures)
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorCategory::Permanent => 1,
            ErrorCategory::Infrastructure => 70,
            ErrorCategory::Transient => 75,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnpath_core::SegmentKind;

    fn failed(kind: ErrorKind) -> MaterializeError {
        MaterializeError::SegmentFailed {
            segment: PathSegment::new(SegmentKind::Container, "b", "OU=b"),
            prefix: "DC=x,DC=y".to_string(),
            source: DirectoryError::new(kind, "boom"),
            actions: vec![],
        }
    }

    #[test]
    fn test_segment_failed_display() {
        let msg = failed(ErrorKind::PermissionDenied).to_string();
        assert_eq!(
            msg,
            "Failed to materialize 'OU=b' under 'DC=x,DC=y': [permission_denied] boom"
        );
    }

    #[test]
    fn test_error_category() {
        assert_eq!(failed(ErrorKind::Timeout).category(), ErrorCategory::Transient);
        assert_eq!(
            failed(ErrorKind::PermissionDenied).category(),
            ErrorCategory::Permanent
        );
        assert_eq!(
            failed(ErrorKind::Database).category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            MaterializeError::from(DirectoryError::unreachable("none")).category(),
            ErrorCategory::Transient
        );
        assert_eq!(
            MaterializeError::from(FormatError::Empty).category(),
            ErrorCategory::Permanent
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ErrorCategory::Permanent.exit_code(), 1);
        assert_eq!(ErrorCategory::Infrastructure.exit_code(), 70);
        assert_eq!(ErrorCategory::Transient.exit_code(), 75);

        // every failed segment exits non-zero
        for kind in [
            ErrorKind::Unreachable,
            ErrorKind::PermissionDenied,
            ErrorKind::Timeout,
            ErrorKind::AlreadyExists,
            ErrorKind::NoSuchParent,
            ErrorKind::Unsupported,
            ErrorKind::Database,
            ErrorKind::IO,
        ] {
            assert_ne!(failed(kind).category().exit_code(), 0, "{kind:?}");
        }
    }

    #[test]
    fn test_actions_only_on_segment_failure() {
        assert!(MaterializeError::from(FormatError::Empty).actions().is_empty());
    }
}
