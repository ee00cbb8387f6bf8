//! # Script Bridge
//!
//! Values arriving from a dynamically typed scripting layer.
//!
//! A script can pass anything where a file or a buffer is expected. The
//! functions here accept a [`ScriptValue`], check its shape, and either
//! forward to [`FileHandle`] or fail with a [`ConduitError::TypeError`]
//! before any I/O happens.
//!
//! ## Example
//!
//! ```rust
//! use conduit_core::bridge::{self, ScriptValue};
//! use conduit_core::error::ConduitError;
//! use conduit_core::file::{stream_ref, MemoryStream};
//!
//! let file = ScriptValue::File(stream_ref(MemoryStream::new()));
//! let handle = bridge::create_file(&file, false)?;
//!
//! let err = bridge::write_from(&handle, &ScriptValue::from("text")).unwrap_err();
//! assert!(matches!(err, ConduitError::TypeError(_)));
//!
//! let (status, n) = bridge::write_from(&handle, &ScriptValue::Bytes(b"bytes".to_vec()))?;
//! assert!(status.succeeded());
//! assert_eq!(n, 5);
//! # Ok::<(), ConduitError>(())
//! ```

use std::fmt;

use crate::error::{ConduitError, Result};
use crate::file::{FileHandle, IntoFileHandle, IoPath, Ownership, StreamRef};
use crate::status::Status;

/// A dynamically typed value
#[derive(Clone)]
pub enum ScriptValue
{
    /// The absent value
    None,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Text
    Str(String),
    /// Immutable bytes
    Bytes(Vec<u8>),
    /// Mutable bytes
    ByteArray(Vec<u8>),
    /// A file-like object
    File(StreamRef),
    /// An existing file handle
    Handle(FileHandle),
}

impl ScriptValue
{
    /// The scripting-side type name, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str
    {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::ByteArray(_) => "bytearray",
            Self::File(_) => "file",
            Self::Handle(_) => "FileHandle",
        }
    }
}

impl fmt::Debug for ScriptValue
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Self::ByteArray(b) => write!(f, "ByteArray({} bytes)", b.len()),
            Self::File(_) => f.write_str("File(..)"),
            Self::Handle(h) => write!(f, "Handle({h:?})"),
        }
    }
}

impl From<&str> for ScriptValue
{
    fn from(s: &str) -> Self
    {
        Self::Str(s.to_string())
    }
}

impl From<StreamRef> for ScriptValue
{
    fn from(stream: StreamRef) -> Self
    {
        Self::File(stream)
    }
}

impl From<FileHandle> for ScriptValue
{
    fn from(handle: FileHandle) -> Self
    {
        Self::Handle(handle)
    }
}

/// Build a handle from a script value with explicit ownership and I/O path.
///
/// An existing handle is passed through as-is; the flags only apply to raw
/// file-like objects.
///
/// ## Errors
///
/// - [`ConduitError::TypeError`] for anything that is not a file
/// - whatever [`FileHandle::with_stream`] reports for a file-like object
pub fn file_from_value(value: &ScriptValue, ownership: Ownership, io_path: IoPath) -> Result<FileHandle>
{
    match value {
        ScriptValue::File(stream) => FileHandle::with_stream(stream.clone(), ownership, io_path),
        ScriptValue::Handle(handle) => Ok(handle.clone()),
        other => Err(ConduitError::type_error(format!(
            "expected a file-like object, not '{}'",
            other.type_name()
        ))),
    }
}

/// Wrap an externally owned value, borrowing it when `borrow` is true.
///
/// ## Errors
///
/// See [`file_from_value`].
pub fn create_file(value: &ScriptValue, borrow: bool) -> Result<FileHandle>
{
    let ownership = if borrow { Ownership::Borrowed } else { Ownership::Owned };
    file_from_value(value, ownership, IoPath::Native)
}

/// Read from `handle` into a mutable byte buffer.
///
/// ## Errors
///
/// [`ConduitError::TypeError`] unless `buffer` is a [`ScriptValue::ByteArray`].
/// I/O problems are reported through the returned [`Status`].
pub fn read_into(handle: &FileHandle, buffer: &mut ScriptValue) -> Result<(Status, usize)>
{
    match buffer {
        ScriptValue::ByteArray(bytes) => Ok(handle.read(bytes)),
        other => Err(ConduitError::type_error(format!(
            "read() argument must be a writable bytes-like object, not '{}'",
            other.type_name()
        ))),
    }
}

/// Write a byte buffer to `handle`.
///
/// ## Errors
///
/// [`ConduitError::TypeError`] unless `data` is bytes or a bytearray.
pub fn write_from(handle: &FileHandle, data: &ScriptValue) -> Result<(Status, usize)>
{
    match data {
        ScriptValue::Bytes(bytes) | ScriptValue::ByteArray(bytes) => Ok(handle.write(bytes)),
        other => Err(ConduitError::type_error(format!(
            "a bytes-like object is required, not '{}'",
            other.type_name()
        ))),
    }
}

impl IntoFileHandle for ScriptValue
{
    fn into_file_handle(self) -> Result<FileHandle>
    {
        file_from_value(&self, Ownership::Owned, IoPath::Native)
    }
}

impl IntoFileHandle for &ScriptValue
{
    fn into_file_handle(self) -> Result<FileHandle>
    {
        file_from_value(self, Ownership::Owned, IoPath::Native)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::file::{stream_ref, MemoryStream};

    #[test]
    fn test_non_file_values_are_type_errors()
    {
        for value in [
            ScriptValue::None,
            ScriptValue::from("output"),
            ScriptValue::Int(1),
            ScriptValue::Bool(true),
            ScriptValue::Bytes(Vec::new()),
        ] {
            let err = create_file(&value, false).unwrap_err();
            assert!(matches!(err, ConduitError::TypeError(_)), "{value:?}");
            assert!(err.to_string().contains(value.type_name()));
        }
    }

    #[test]
    fn test_handle_passes_through()
    {
        let handle = FileHandle::from_stream(stream_ref(MemoryStream::new())).unwrap();
        let same = ScriptValue::from(handle.clone()).into_file_handle().unwrap();
        assert!(handle.same_file(&same));
    }

    #[test]
    fn test_read_requires_mutable_buffer()
    {
        let handle = FileHandle::from_stream(stream_ref(MemoryStream::with_contents(b"abc".to_vec()))).unwrap();

        let mut immutable = ScriptValue::Bytes(vec![0; 8]);
        assert!(matches!(read_into(&handle, &mut immutable), Err(ConduitError::TypeError(_))));

        let mut buffer = ScriptValue::ByteArray(vec![0; 8]);
        let (status, n) = read_into(&handle, &mut buffer).unwrap();
        assert!(status.succeeded());
        assert_eq!(n, 3);
        match buffer {
            ScriptValue::ByteArray(bytes) => assert_eq!(&bytes[..n], b"abc"),
            other => panic!("unexpected buffer {other:?}"),
        }
    }

    #[test]
    fn test_write_rejects_text()
    {
        let handle = FileHandle::from_stream(stream_ref(MemoryStream::new())).unwrap();
        let err = write_from(&handle, &ScriptValue::from("FOO")).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: a bytes-like object is required, not 'str'");
    }
}
