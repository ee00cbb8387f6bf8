//! # File-like Objects
//!
//! [`FileLike`] is the capability set a host-side object offers when it is
//! handed to a [`FileHandle`](super::FileHandle). Every capability has a
//! default so an implementor only provides what it actually supports:
//!
//! - **Probing**: `readable` / `writable` are asked once, when a handle is
//!   built. Either may fail, and that failure reaches the caller untouched.
//! - **Byte I/O**: `read` / `write` for binary streams.
//! - **Text I/O**: `read_text` / `write_text` for streams whose
//!   [`kind`](FileLike::kind) is [`StreamKind::Text`].
//! - **Descriptor**: `descriptor` exposes an OS descriptor that a handle may
//!   use for direct I/O instead of calling back into the object.
//!
//! Objects are shared as [`StreamRef`]: the handle and the code that created
//! the object may both hold it and use it in turn.

use std::cell::RefCell;
use std::io;
use std::os::unix::io::RawFd;
use std::rc::Rc;

/// Whether a stream moves bytes or characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamKind
{
    /// Byte-oriented stream
    #[default]
    Binary,
    /// Character-oriented UTF-8 stream
    Text,
}

/// A host-side file-like object
pub trait FileLike
{
    /// Can this object be read from?
    ///
    /// ## Errors
    ///
    /// Whatever the object reports while being inspected.
    fn readable(&self) -> io::Result<bool>
    {
        Ok(false)
    }

    /// Can this object be written to?
    ///
    /// ## Errors
    ///
    /// Whatever the object reports while being inspected.
    fn writable(&self) -> io::Result<bool>
    {
        Ok(false)
    }

    /// Binary or text.
    fn kind(&self) -> StreamKind
    {
        StreamKind::Binary
    }

    /// An OS descriptor backing this object, if it has one.
    fn descriptor(&self) -> Option<RawFd>
    {
        None
    }

    /// Read bytes into `buf`.
    ///
    /// ## Errors
    ///
    /// `Unsupported` unless overridden.
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize>
    {
        Err(unsupported("read"))
    }

    /// Write bytes from `buf`, returning how many were accepted.
    ///
    /// ## Errors
    ///
    /// `Unsupported` unless overridden.
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize>
    {
        Err(unsupported("write"))
    }

    /// Read at most `max_chars` characters.
    ///
    /// ## Errors
    ///
    /// `Unsupported` unless overridden.
    fn read_text(&mut self, _max_chars: usize) -> io::Result<String>
    {
        Err(unsupported("read_text"))
    }

    /// Write `text`, returning how many characters were accepted.
    ///
    /// ## Errors
    ///
    /// `Unsupported` unless overridden.
    fn write_text(&mut self, _text: &str) -> io::Result<usize>
    {
        Err(unsupported("write_text"))
    }

    /// Push buffered writes to wherever they are going.
    ///
    /// ## Errors
    ///
    /// Whatever the object reports.
    fn flush(&mut self) -> io::Result<()>
    {
        Ok(())
    }

    /// Close the object. Later I/O should fail.
    ///
    /// ## Errors
    ///
    /// Whatever the object reports.
    fn close(&mut self) -> io::Result<()>
    {
        Ok(())
    }

    /// Has [`close`](FileLike::close) been called?
    fn is_closed(&self) -> bool
    {
        false
    }
}

/// Shared, single-threaded reference to a file-like object
pub type StreamRef = Rc<RefCell<dyn FileLike>>;

/// Wrap a concrete object as a [`StreamRef`].
///
/// Keep a typed clone first if you need the concrete type back later:
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use conduit_core::file::{MemoryStream, StreamRef};
///
/// let typed = Rc::new(RefCell::new(MemoryStream::new()));
/// let shared: StreamRef = typed.clone();
/// assert!(conduit_core::file::same_stream(&shared, &(typed as StreamRef)));
/// ```
pub fn stream_ref<T: FileLike + 'static>(object: T) -> StreamRef
{
    Rc::new(RefCell::new(object))
}

/// Do two references point at the same object?
///
/// Only the data address is compared, so two references to one object
/// created through different coercions still compare equal.
#[must_use]
pub fn same_stream(a: &StreamRef, b: &StreamRef) -> bool
{
    std::ptr::eq(Rc::as_ptr(a).cast::<()>(), Rc::as_ptr(b).cast::<()>())
}

/// The error raised by any operation on a closed object.
#[must_use]
pub fn closed_error() -> io::Error
{
    io::Error::other("I/O operation on closed file")
}

fn unsupported(operation: &str) -> io::Error
{
    io::Error::new(io::ErrorKind::Unsupported, format!("{operation} is not supported by this object"))
}
