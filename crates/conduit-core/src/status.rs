//! # Status
//!
//! The success-or-message value returned by file and debugger operations.
//!
//! A [`Status`] is what a caller on the far side of the scripting bridge
//! sees: it never panics and never carries a live error object, only a kind
//! and the text of whatever went wrong. Errors raised by a user-supplied
//! backing are flattened into one of these, so the message is exactly the
//! original error's `Display` output.

use std::fmt;
use std::io;

use crate::error::ConduitError;

/// Classification of a failed [`Status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind
{
    /// Free-form failure
    Generic,
    /// Operation on a handle with no backing
    InvalidHandle,
    /// Wrong value shape (text where bytes were expected, and so on)
    Type,
    /// Failure reported by the operating system or a backing object
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Failure
{
    kind: StatusKind,
    message: String,
}

/// Outcome of an operation: success, or a failure kind plus message
///
/// ## Example
///
/// ```rust
/// use conduit_core::status::{Status, StatusKind};
///
/// let ok = Status::success();
/// assert!(ok.succeeded());
///
/// let err = Status::error(StatusKind::Io, "disk on fire");
/// assert!(err.fail());
/// assert_eq!(err.message(), Some("disk on fire"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status
{
    failure: Option<Failure>,
}

impl Status
{
    /// A successful status.
    #[must_use]
    pub fn success() -> Self
    {
        Self { failure: None }
    }

    /// A failed status of the given kind.
    pub fn error(kind: StatusKind, message: impl Into<String>) -> Self
    {
        Self {
            failure: Some(Failure {
                kind,
                message: message.into(),
            }),
        }
    }

    /// A generic failure carrying `message`.
    pub fn from_message(message: impl Into<String>) -> Self
    {
        Self::error(StatusKind::Generic, message)
    }

    /// The failure every operation on an invalid handle reports.
    #[must_use]
    pub fn invalid_handle() -> Self
    {
        Self::error(StatusKind::InvalidHandle, ConduitError::InvalidHandle.to_string())
    }

    /// `true` when the operation succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool
    {
        self.failure.is_none()
    }

    /// `true` when the operation failed.
    #[must_use]
    pub fn fail(&self) -> bool
    {
        self.failure.is_some()
    }

    /// The failure message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str>
    {
        self.failure.as_ref().map(|f| f.message.as_str())
    }

    /// The failure kind, if any.
    #[must_use]
    pub fn kind(&self) -> Option<StatusKind>
    {
        self.failure.as_ref().map(|f| f.kind)
    }

    /// Replace this status with `other` unless this one already failed.
    ///
    /// Used when several steps run in sequence and the first failure is the
    /// one worth reporting.
    pub fn merge(&mut self, other: Status)
    {
        if self.succeeded() {
            *self = other;
        }
    }

    /// Convert into a `Result`, turning a failure into an `io::Error` that
    /// carries the same message.
    ///
    /// ## Errors
    ///
    /// Returns `Err` if the status is a failure.
    pub fn into_io_result(self) -> io::Result<()>
    {
        match self.failure {
            None => Ok(()),
            Some(failure) => Err(io::Error::other(failure.message)),
        }
    }
}

impl fmt::Display for Status
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match &self.failure {
            None => f.write_str("success"),
            Some(failure) => f.write_str(&failure.message),
        }
    }
}

impl From<io::Error> for Status
{
    fn from(err: io::Error) -> Self
    {
        Self::error(StatusKind::Io, err.to_string())
    }
}

impl From<ConduitError> for Status
{
    fn from(err: ConduitError) -> Self
    {
        let kind = match &err {
            ConduitError::TypeError(_) => StatusKind::Type,
            ConduitError::InvalidHandle => StatusKind::InvalidHandle,
            ConduitError::Inspection(_) | ConduitError::Io(_) => StatusKind::Io,
            ConduitError::InvalidMode(_) | ConduitError::HandleInUse | ConduitError::MarginTooSmall(_) => {
                StatusKind::Generic
            }
        };
        Self::error(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_default_is_success()
    {
        let status = Status::default();
        assert!(status.succeeded());
        assert_eq!(status.message(), None);
        assert_eq!(status.to_string(), "success");
    }

    #[test]
    fn test_io_error_message_is_preserved()
    {
        let status = Status::from(io::Error::other("OH NOE"));
        assert!(status.fail());
        assert_eq!(status.kind(), Some(StatusKind::Io));
        assert_eq!(status.message(), Some("OH NOE"));
    }

    #[test]
    fn test_merge_keeps_first_failure()
    {
        let mut status = Status::success();
        status.merge(Status::from_message("first"));
        status.merge(Status::from_message("second"));
        assert_eq!(status.message(), Some("first"));
    }

    #[test]
    fn test_type_error_kind()
    {
        let status = Status::from(ConduitError::type_error("not a file"));
        assert_eq!(status.kind(), Some(StatusKind::Type));
        assert_eq!(status.message(), Some("TypeError: not a file"));
    }
}
