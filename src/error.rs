//! Error kinds raised by the in-memory storage.
//!
//! Every fallible operation of this crate returns [`crate::Result`], an `anyhow::Result`.
//! Failures that originate in the engine itself carry a [`VfsError`] which can be recovered
//! with [`error_kind`] or `err.downcast_ref::<VfsError>()`. Errors raised by interception
//! callbacks are passed through untouched, so a test can downcast to its own injected type.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Which part of a path could not be found.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MissingPart {
    /// The directory that should contain the target does not exist (or is a file).
    Parent,
    /// The target itself does not exist.
    Target,
}

impl fmt::Display for MissingPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingPart::Parent => f.write_str("could not find a part of the path"),
            MissingPart::Target => f.write_str("could not find file or directory"),
        }
    }
}

/// Coarse classification of a [`VfsError`], handy for assertions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PathInvalid,
    PathNotFullyResolvable,
    NotFound,
    AlreadyExists,
    CapacityExceeded,
    AccessDenied,
    NotSupported,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    #[error("invalid path '{path}': {reason}")]
    PathInvalid { path: String, reason: String },

    #[error("path '{path}' cannot be resolved above its root")]
    PathNotFullyResolvable { path: String },

    #[error("{missing} '{path}'")]
    NotFound { path: String, missing: MissingPart },

    #[error("'{path}' already exists")]
    AlreadyExists { path: String },

    #[error("not enough space on drive '{drive}': {requested} bytes requested, {available} available")]
    CapacityExceeded {
        drive: String,
        requested: u64,
        available: u64,
    },

    #[error("access to the path '{path}' is denied")]
    AccessDenied { path: String },

    #[error("{message}")]
    NotSupported { message: String },

    #[error("timed out after {waited:?} waiting for a notification")]
    Timeout { waited: Duration },
}

impl VfsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VfsError::PathInvalid { .. } => ErrorKind::PathInvalid,
            VfsError::PathNotFullyResolvable { .. } => ErrorKind::PathNotFullyResolvable,
            VfsError::NotFound { .. } => ErrorKind::NotFound,
            VfsError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            VfsError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            VfsError::AccessDenied { .. } => ErrorKind::AccessDenied,
            VfsError::NotSupported { .. } => ErrorKind::NotSupported,
            VfsError::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        VfsError::PathInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parent_not_found(path: impl fmt::Display) -> Self {
        VfsError::NotFound {
            path: path.to_string(),
            missing: MissingPart::Parent,
        }
    }

    pub(crate) fn not_found(path: impl fmt::Display) -> Self {
        VfsError::NotFound {
            path: path.to_string(),
            missing: MissingPart::Target,
        }
    }

    pub(crate) fn already_exists(path: impl fmt::Display) -> Self {
        VfsError::AlreadyExists {
            path: path.to_string(),
        }
    }

    pub(crate) fn access_denied(path: impl fmt::Display) -> Self {
        VfsError::AccessDenied {
            path: path.to_string(),
        }
    }

    pub(crate) fn not_supported(message: impl Into<String>) -> Self {
        VfsError::NotSupported {
            message: message.into(),
        }
    }
}

/// Returns the kind of `err` if it was raised by the engine.
///
/// Errors injected by interception callbacks yield `None` unless they are themselves a
/// [`VfsError`].
pub fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.downcast_ref::<VfsError>().map(VfsError::kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_distinguishes_parent_and_target() {
        let parent = VfsError::parent_not_found("/a/b");
        let target = VfsError::not_found("/a/b");
        assert_ne!(parent, target);
        assert_eq!(parent.kind(), ErrorKind::NotFound);
        assert!(parent.to_string().contains("a part of the path"));
        assert!(target.to_string().contains("file or directory"));
    }

    #[test]
    fn test_error_kind_from_anyhow() {
        let err: anyhow::Error = VfsError::already_exists("/x").into();
        assert_eq!(error_kind(&err), Some(ErrorKind::AlreadyExists));

        let foreign = anyhow::anyhow!("injected");
        assert_eq!(error_kind(&foreign), None);
    }

    #[test]
    fn test_capacity_message_names_drive() {
        let err = VfsError::CapacityExceeded {
            drive: "C:\\".to_string(),
            requested: 2,
            available: 1,
        };
        let text = err.to_string();
        assert!(text.contains("C:\\"));
        assert!(text.contains("2 bytes requested"));
    }
}
