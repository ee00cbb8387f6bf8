//! # Error Types
//!
//! Errors that escape a call as `Err`.
//!
//! Only construction-time problems travel this way. Once a
//! [`FileHandle`](crate::file::FileHandle) exists, read/write/flush/close
//! failures are reported as a [`Status`](crate::status::Status) instead.
//!
//! ## Error Categories
//!
//! 1. **Type errors**: TypeError (wrong value shape at the bridge boundary)
//! 2. **Inspection errors**: Inspection (the backing object failed while being inspected)
//! 3. **Mode errors**: InvalidMode (unparseable `fopen`-style mode string)
//! 4. **Handle errors**: InvalidHandle, HandleInUse, MarginTooSmall
//! 5. **I/O errors**: Io

use conduit_utils::config::MIN_TEXT_READ_MARGIN;
use thiserror::Error;

/// Main error type for conduit operations
#[derive(Error, Debug)]
pub enum ConduitError
{
    /// A value of the wrong shape crossed an API boundary
    ///
    /// This happens when:
    /// - A non-file value (a string, `None`, an integer) is offered as a file
    /// - A file-like object is neither readable nor writable
    /// - An immutable buffer is passed where a read needs to fill it
    /// - Text is passed where bytes are required
    #[error("TypeError: {0}")]
    TypeError(String),

    /// The backing object raised while its capabilities were inspected
    ///
    /// The original error is kept untouched; its message is the message of
    /// this error.
    #[error(transparent)]
    Inspection(std::io::Error),

    /// The mode string could not be parsed
    #[error("invalid mode string: {0:?}")]
    InvalidMode(String),

    /// An operation needed a valid handle
    #[error("invalid file handle")]
    InvalidHandle,

    /// The handle was used from inside one of its own operations, for
    /// example by the backing object's `write`
    #[error("file handle is already in use")]
    HandleInUse,

    /// The text read margin cannot hold one UTF-8 character
    #[error("text read margin must be at least {min} bytes, got {0}", min = MIN_TEXT_READ_MARGIN)]
    MarginTooSmall(usize),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConduitError
{
    /// Shorthand for a [`ConduitError::TypeError`].
    pub fn type_error(message: impl Into<String>) -> Self
    {
        Self::TypeError(message.into())
    }
}

/// Convenience type alias for `Result<T, ConduitError>`
///
/// ```rust
/// use conduit_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, ConduitError>;
