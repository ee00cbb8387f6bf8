//! # File Handles
//!
//! [`FileHandle`] gives one read/write/flush/close contract over every kind
//! of backing storage:
//!
//! - a raw OS descriptor, owned or borrowed
//! - a file-like object ([`FileLike`]), owned or borrowed
//! - an in-memory byte or text stream (a file-like object without a descriptor)
//!
//! ## Ownership and I/O path
//!
//! A stream backing carries two independent choices:
//!
//! | | [`IoPath::Native`] | [`IoPath::Generic`] |
//! |---|---|---|
//! | [`Ownership::Owned`] | descriptor I/O when available, close closes the object | always the object's own `read`/`write`, close closes the object |
//! | [`Ownership::Borrowed`] | descriptor I/O when available, close leaves the object open | always the object's own `read`/`write`, close leaves the object open |
//!
//! The backing is resolved once, when the handle is built or re-bound. The
//! object is not inspected again on later calls.
//!
//! ## Sharing
//!
//! Clones of a `FileHandle` share one underlying file, so closing any clone
//! invalidates all of them. The file is closed when the last clone is
//! dropped.
//!
//! ## Failures
//!
//! Building a handle returns `Err` on bad input and never yields a partial
//! handle. After that, every operation reports through a [`Status`] and a
//! byte count that is zero whenever the status is a failure.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::io;
use std::mem;
use std::os::unix::io::RawFd;
use std::rc::Rc;

use conduit_utils::config::{DEFAULT_TEXT_READ_MARGIN, MIN_TEXT_READ_MARGIN};
use tracing::{debug, trace, warn};

use super::descriptor::NativeDescriptor;
use super::options::OpenOptions;
use super::os::DescriptorStream;
use super::stream::{same_stream, FileLike, StreamKind, StreamRef};
use crate::error::{ConduitError, Result};
use crate::status::{Status, StatusKind};

/// Who closes the backing object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership
{
    /// Closing the handle closes the object
    Owned,
    /// Closing the handle leaves the object open
    Borrowed,
}

/// How reads and writes reach a stream backing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoPath
{
    /// Use the object's descriptor directly when it exposes one
    Native,
    /// Always call the object's own `read`/`write`
    Generic,
}

struct StreamBacking
{
    stream: StreamRef,
    ownership: Ownership,
    io_path: IoPath,
    kind: StreamKind,
    // Borrowed copy of the object's descriptor, present only on the native path.
    native: Option<NativeDescriptor>,
}

enum Backing
{
    Invalid,
    Descriptor(NativeDescriptor),
    Stream(StreamBacking),
}

impl Backing
{
    fn describe(&self) -> &'static str
    {
        match self {
            Self::Invalid => "invalid",
            Self::Descriptor(d) if d.is_owned() => "owned descriptor",
            Self::Descriptor(_) => "borrowed descriptor",
            Self::Stream(s) => match (s.ownership, s.io_path) {
                (Ownership::Owned, IoPath::Native) => "owned stream",
                (Ownership::Owned, IoPath::Generic) => "owned stream (forced io)",
                (Ownership::Borrowed, IoPath::Native) => "borrowed stream",
                (Ownership::Borrowed, IoPath::Generic) => "borrowed stream (forced io)",
            },
        }
    }
}

struct Inner
{
    backing: Backing,
    options: OpenOptions,
    text_read_margin: usize,
}

impl Inner
{
    fn new(backing: Backing, options: OpenOptions) -> Self
    {
        Self {
            backing,
            options,
            text_read_margin: DEFAULT_TEXT_READ_MARGIN,
        }
    }

    fn is_valid(&self) -> bool
    {
        match &self.backing {
            Backing::Invalid => false,
            Backing::Descriptor(d) => d.is_valid(),
            Backing::Stream(_) => true,
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> std::result::Result<usize, Status>
    {
        if !self.is_valid() {
            return Err(Status::invalid_handle());
        }
        if !self.options.is_readable() {
            return Err(Status::error(StatusKind::Io, "file is not readable"));
        }
        match &mut self.backing {
            Backing::Invalid => Err(Status::invalid_handle()),
            Backing::Descriptor(d) => Ok(d.read(buf)?),
            Backing::Stream(s) => s.read(buf, self.text_read_margin),
        }
    }

    fn write(&mut self, buf: &[u8]) -> std::result::Result<usize, Status>
    {
        if !self.is_valid() {
            return Err(Status::invalid_handle());
        }
        if !self.options.is_writable() {
            return Err(Status::error(StatusKind::Io, "file is not writable"));
        }
        match &mut self.backing {
            Backing::Invalid => Err(Status::invalid_handle()),
            Backing::Descriptor(d) => Ok(d.write(buf)?),
            Backing::Stream(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> Status
    {
        match &self.backing {
            Backing::Invalid => Status::invalid_handle(),
            // Descriptor writes are not buffered on our side.
            Backing::Descriptor(_) => Status::success(),
            Backing::Stream(s) => match borrow_stream(&s.stream) {
                Ok(mut stream) => stream.flush().map_or_else(Status::from, |()| Status::success()),
                Err(status) => status,
            },
        }
    }

    fn close(&mut self) -> Status
    {
        close_backing(mem::replace(&mut self.backing, Backing::Invalid))
    }
}

fn close_backing(backing: Backing) -> Status
{
    let what = backing.describe();
    let status = match backing {
        Backing::Invalid => return Status::success(),
        Backing::Descriptor(mut d) => d.close().map_or_else(Status::from, |()| Status::success()),
        Backing::Stream(mut s) => {
            if let Some(mut native) = s.native.take() {
                // Borrowed: releases the number without closing it.
                let _ = native.close();
            }
            release_stream(&s.stream, s.ownership)
        }
    };
    debug!(backing = what, ok = status.succeeded(), "file handle closed");
    status
}

/// Close an owned object, flush a borrowed one.
fn release_stream(stream: &StreamRef, ownership: Ownership) -> Status
{
    match borrow_stream(stream) {
        Ok(mut object) => match ownership {
            Ownership::Owned => object.close(),
            Ownership::Borrowed => object.flush(),
        }
        .map_or_else(Status::from, |()| Status::success()),
        Err(status) => status,
    }
}

impl Drop for Inner
{
    fn drop(&mut self)
    {
        let status = self.close();
        if status.fail() {
            warn!(error = %status, "failed to close file handle on drop");
        }
    }
}

impl StreamBacking
{
    fn read(&mut self, buf: &mut [u8], margin: usize) -> std::result::Result<usize, Status>
    {
        if let (IoPath::Native, Some(native)) = (self.io_path, &self.native) {
            return Ok(native.read(buf)?);
        }

        match self.kind {
            StreamKind::Binary => Ok(borrow_stream(&self.stream)?.read(buf)?),
            StreamKind::Text => {
                // A margin of at least MIN_TEXT_READ_MARGIN keeps every
                // requested character within `buf`.
                if buf.len() < margin {
                    return Err(Status::error(
                        StatusKind::Generic,
                        format!("can't read less than {margin} bytes from a utf-8 text stream"),
                    ));
                }
                let text = borrow_stream(&self.stream)?.read_text(buf.len() / margin)?;
                let bytes = text.as_bytes();
                if bytes.len() > buf.len() {
                    return Err(Status::error(
                        StatusKind::Io,
                        format!("text stream returned {} bytes for a {} byte buffer", bytes.len(), buf.len()),
                    ));
                }
                buf[..bytes.len()].copy_from_slice(bytes);
                Ok(bytes.len())
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> std::result::Result<usize, Status>
    {
        if let (IoPath::Native, Some(native)) = (self.io_path, &self.native) {
            return Ok(native.write(buf)?);
        }

        match self.kind {
            StreamKind::Binary => Ok(borrow_stream(&self.stream)?.write(buf)?),
            StreamKind::Text => {
                let text = std::str::from_utf8(buf).map_err(|e| {
                    Status::error(StatusKind::Type, format!("text stream requires utf-8 data: {e}"))
                })?;
                let chars = borrow_stream(&self.stream)?.write_text(text)?;
                Ok(text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i))
            }
        }
    }
}

fn borrow_stream(stream: &StreamRef) -> std::result::Result<RefMut<'_, dyn FileLike + 'static>, Status>
{
    stream
        .try_borrow_mut()
        .map_err(|_| Status::error(StatusKind::Generic, "file object is already in use"))
}

/// Inspect a file-like object and resolve its backing.
fn resolve_stream(stream: StreamRef, ownership: Ownership, io_path: IoPath) -> Result<(Backing, OpenOptions)>
{
    let (options, kind, descriptor) = {
        let object = stream
            .try_borrow()
            .map_err(|_| ConduitError::type_error("file object is already in use"))?;
        let readable = object.readable().map_err(ConduitError::Inspection)?;
        let writable = object.writable().map_err(ConduitError::Inspection)?;
        if !readable && !writable {
            return Err(ConduitError::type_error("object is not a readable or writable file"));
        }

        let mut options = OpenOptions::empty();
        options.set(OpenOptions::READ, readable);
        options.set(OpenOptions::WRITE, writable);
        (options, object.kind(), object.descriptor())
    };

    // Text objects always go through their own methods; a descriptor would
    // bypass their encoding.
    let native = match (io_path, kind, descriptor) {
        (IoPath::Native, StreamKind::Binary, Some(fd)) if fd >= 0 => Some(NativeDescriptor::new(fd, false)),
        _ => None,
    };

    let backing = Backing::Stream(StreamBacking {
        stream,
        ownership,
        io_path,
        kind,
        native,
    });
    Ok((backing, options))
}

/// Polymorphic file handle
///
/// ## Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use conduit_core::file::{FileHandle, MemoryStream};
///
/// let buffer = Rc::new(RefCell::new(MemoryStream::new()));
/// let handle = FileHandle::borrowed(buffer.clone())?;
///
/// let (status, written) = handle.write(b"FOO\nBAR");
/// assert!(status.succeeded());
/// assert_eq!(written, 7);
///
/// handle.close();
/// assert!(!handle.is_valid());
/// assert_eq!(buffer.borrow().contents(), b"FOO\nBAR");
/// # Ok::<(), conduit_core::error::ConduitError>(())
/// ```
#[derive(Clone, Default)]
pub struct FileHandle
{
    inner: Option<Rc<RefCell<Inner>>>,
}

impl FileHandle
{
    /// An invalid handle. Every read and write on it fails.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    fn from_backing(backing: Backing, options: OpenOptions) -> Self
    {
        debug!(backing = backing.describe(), %options, "file handle created");
        Self {
            inner: Some(Rc::new(RefCell::new(Inner::new(backing, options)))),
        }
    }

    /// Wrap a raw descriptor.
    ///
    /// `mode` is an `fopen`-style string (`"r"`, `"w"`, `"r+"`, ...). The
    /// handle closes `fd` when it is closed iff `transfer_ownership` is true.
    ///
    /// ## Errors
    ///
    /// [`ConduitError::InvalidMode`] if `mode` does not parse.
    pub fn from_descriptor(fd: RawFd, mode: &str, transfer_ownership: bool) -> Result<Self>
    {
        let options = OpenOptions::from_mode(mode)?;
        Ok(Self::from_backing(
            Backing::Descriptor(NativeDescriptor::new(fd, transfer_ownership)),
            options,
        ))
    }

    /// Wrap a file-like object with explicit ownership and I/O path.
    ///
    /// ## Errors
    ///
    /// - [`ConduitError::TypeError`] if the object is neither readable nor writable
    /// - [`ConduitError::Inspection`] if probing the object fails; the
    ///   object's own error is passed through
    pub fn with_stream(stream: StreamRef, ownership: Ownership, io_path: IoPath) -> Result<Self>
    {
        let (backing, options) = resolve_stream(stream, ownership, io_path)?;
        Ok(Self::from_backing(backing, options))
    }

    /// Wrap a file-like object the handle owns.
    ///
    /// ## Errors
    ///
    /// See [`FileHandle::with_stream`].
    pub fn from_stream(stream: StreamRef) -> Result<Self>
    {
        Self::with_stream(stream, Ownership::Owned, IoPath::Native)
    }

    /// Wrap a file-like object without taking ownership.
    ///
    /// ## Errors
    ///
    /// See [`FileHandle::with_stream`].
    pub fn borrowed(stream: StreamRef) -> Result<Self>
    {
        Self::with_stream(stream, Ownership::Borrowed, IoPath::Native)
    }

    /// Own a file-like object and always use its own `read`/`write`.
    ///
    /// ## Errors
    ///
    /// See [`FileHandle::with_stream`].
    pub fn forcing_io(stream: StreamRef) -> Result<Self>
    {
        Self::with_stream(stream, Ownership::Owned, IoPath::Generic)
    }

    /// Borrow a file-like object and always use its own `read`/`write`.
    ///
    /// ## Errors
    ///
    /// See [`FileHandle::with_stream`].
    pub fn borrowed_forcing_io(stream: StreamRef) -> Result<Self>
    {
        Self::with_stream(stream, Ownership::Borrowed, IoPath::Generic)
    }

    /// Wrap an externally owned object, borrowing it when `borrow` is true.
    ///
    /// ## Errors
    ///
    /// See [`FileHandle::with_stream`].
    pub fn create(stream: StreamRef, borrow: bool) -> Result<Self>
    {
        let ownership = if borrow { Ownership::Borrowed } else { Ownership::Owned };
        Self::with_stream(stream, ownership, IoPath::Native)
    }

    /// Swap in a new backing and release the old one.
    ///
    /// Re-binding to the object already behind the handle only changes the
    /// flags; the object is not closed in between.
    fn rebind(&mut self, backing: Backing, options: OpenOptions) -> Result<()>
    {
        let Some(inner) = self.inner.clone() else {
            debug!(backing = backing.describe(), %options, "file handle re-bound");
            self.inner = Some(Rc::new(RefCell::new(Inner::new(backing, options))));
            return Ok(());
        };

        let mut inner = inner.try_borrow_mut().map_err(|_| ConduitError::HandleInUse)?;
        debug!(backing = backing.describe(), %options, "file handle re-bound");
        let previous = mem::replace(&mut inner.backing, backing);
        inner.options = options;

        let same_object = match (&previous, &inner.backing) {
            (Backing::Stream(old), Backing::Stream(new)) => same_stream(&old.stream, &new.stream),
            _ => false,
        };
        // Release the old backing without holding the handle, so the object's
        // own close or flush may use the handle.
        drop(inner);
        if same_object {
            return Ok(());
        }
        let status = close_backing(previous);
        if status.fail() {
            warn!(error = %status, "failed to close previous backing");
        }
        Ok(())
    }

    fn rebind_stream(&mut self, stream: StreamRef, ownership: Ownership, io_path: IoPath) -> Result<()>
    {
        let (backing, options) = resolve_stream(stream, ownership, io_path)?;
        self.rebind(backing, options)
    }

    /// Close the current backing and switch to a raw descriptor.
    ///
    /// All clones of this handle see the new backing.
    ///
    /// ## Errors
    ///
    /// [`ConduitError::InvalidMode`], or [`ConduitError::HandleInUse`] when
    /// called from inside one of the handle's own operations. The handle is
    /// unchanged in both cases.
    pub fn set_descriptor(&mut self, fd: RawFd, mode: &str, transfer_ownership: bool) -> Result<()>
    {
        let options = OpenOptions::from_mode(mode)?;
        if let Some(inner) = &self.inner {
            if inner.try_borrow_mut().is_err() {
                return Err(ConduitError::HandleInUse);
            }
        }
        self.rebind(Backing::Descriptor(NativeDescriptor::new(fd, transfer_ownership)), options)
    }

    /// Close the current backing and own `stream` instead.
    ///
    /// ## Errors
    ///
    /// See [`FileHandle::with_stream`]; the handle is unchanged on error.
    pub fn set_file(&mut self, stream: StreamRef) -> Result<()>
    {
        self.rebind_stream(stream, Ownership::Owned, IoPath::Native)
    }

    /// Close the current backing and borrow `stream` instead.
    ///
    /// ## Errors
    ///
    /// See [`FileHandle::with_stream`]; the handle is unchanged on error.
    pub fn set_file_borrowed(&mut self, stream: StreamRef) -> Result<()>
    {
        self.rebind_stream(stream, Ownership::Borrowed, IoPath::Native)
    }

    /// Close the current backing and borrow `stream` with forced I/O.
    ///
    /// ## Errors
    ///
    /// See [`FileHandle::with_stream`]; the handle is unchanged on error.
    pub fn set_file_borrowed_forcing_io(&mut self, stream: StreamRef) -> Result<()>
    {
        self.rebind_stream(stream, Ownership::Borrowed, IoPath::Generic)
    }

    /// Close the current backing and own `stream` with forced I/O.
    ///
    /// ## Errors
    ///
    /// See [`FileHandle::with_stream`]; the handle is unchanged on error.
    pub fn set_file_forcing_io(&mut self, stream: StreamRef) -> Result<()>
    {
        self.rebind_stream(stream, Ownership::Owned, IoPath::Generic)
    }

    /// Read into `buf`.
    ///
    /// Returns the status and the number of bytes read; the count is zero
    /// whenever the status is a failure. Text-mode backings only return whole
    /// characters and reject buffers smaller than the text read margin.
    pub fn read(&self, buf: &mut [u8]) -> (Status, usize)
    {
        let result = match self.borrow_inner_mut() {
            Ok(mut inner) => inner.read(buf),
            Err(status) => Err(status),
        };
        finish("read", result)
    }

    /// Write `buf`.
    ///
    /// Returns the status and the number of bytes written; the count is zero
    /// whenever the status is a failure.
    pub fn write(&self, buf: &[u8]) -> (Status, usize)
    {
        let result = match self.borrow_inner_mut() {
            Ok(mut inner) => inner.write(buf),
            Err(status) => Err(status),
        };
        finish("write", result)
    }

    /// Flush buffered writes on the backing object.
    pub fn flush(&self) -> Status
    {
        match self.borrow_inner_mut() {
            Ok(mut inner) => inner.flush(),
            Err(status) => status,
        }
    }

    /// Release the backing and invalidate the handle.
    ///
    /// Owned backings are closed; borrowed ones are flushed and left open.
    /// Closing an already-closed handle succeeds and does nothing.
    pub fn close(&self) -> Status
    {
        let Some(inner) = &self.inner else {
            return Status::success();
        };
        let backing = match inner.try_borrow_mut() {
            Ok(mut inner) => mem::replace(&mut inner.backing, Backing::Invalid),
            Err(_) => return in_use(),
        };
        close_backing(backing)
    }

    /// `true` while the handle has a backing.
    ///
    /// Also `false` while asked from inside one of the handle's own
    /// operations, when the backing cannot be inspected.
    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.borrow_inner().is_some_and(|inner| inner.is_valid())
    }

    /// Access rights of the handle.
    #[must_use]
    pub fn options(&self) -> OpenOptions
    {
        self.borrow_inner().map_or(OpenOptions::empty(), |inner| inner.options)
    }

    fn borrow_inner(&self) -> Option<Ref<'_, Inner>>
    {
        self.inner.as_ref()?.try_borrow().ok()
    }

    fn borrow_inner_mut(&self) -> std::result::Result<RefMut<'_, Inner>, Status>
    {
        let inner = self.inner.as_ref().ok_or_else(Status::invalid_handle)?;
        inner.try_borrow_mut().map_err(|_| in_use())
    }

    /// Ownership of a stream backing; `None` for descriptor and invalid backings.
    #[must_use]
    pub fn ownership(&self) -> Option<Ownership>
    {
        self.with_stream_backing(|s| s.ownership)
    }

    /// I/O path of a stream backing; `None` for descriptor and invalid backings.
    #[must_use]
    pub fn io_path(&self) -> Option<IoPath>
    {
        self.with_stream_backing(|s| s.io_path)
    }

    fn with_stream_backing<T>(&self, f: impl FnOnce(&StreamBacking) -> T) -> Option<T>
    {
        let inner = self.borrow_inner()?;
        match &inner.backing {
            Backing::Stream(s) => Some(f(s)),
            _ => None,
        }
    }

    /// The OS descriptor behind this handle, if there is one.
    #[must_use]
    pub fn descriptor(&self) -> Option<RawFd>
    {
        let inner = self.borrow_inner()?;
        match &inner.backing {
            Backing::Invalid => None,
            Backing::Descriptor(d) => d.is_valid().then(|| d.raw()),
            Backing::Stream(s) => match &s.native {
                Some(native) => Some(native.raw()),
                None => s.stream.try_borrow().ok().and_then(|object| object.descriptor()),
            },
        }
    }

    /// `true` if the handle writes to or reads from a terminal.
    #[must_use]
    pub fn is_interactive(&self) -> bool
    {
        self.descriptor()
            .is_some_and(|fd| NativeDescriptor::new(fd, false).is_terminal())
    }

    /// Smallest buffer a text-mode read accepts.
    #[must_use]
    pub fn text_read_margin(&self) -> usize
    {
        self.borrow_inner()
            .map_or(DEFAULT_TEXT_READ_MARGIN, |inner| inner.text_read_margin)
    }

    /// Change the text read margin for this handle and its clones.
    ///
    /// ## Errors
    ///
    /// - [`ConduitError::MarginTooSmall`] below [`MIN_TEXT_READ_MARGIN`]
    /// - [`ConduitError::InvalidHandle`] on an invalid handle
    /// - [`ConduitError::HandleInUse`] from inside one of the handle's own operations
    pub fn set_text_read_margin(&self, margin: usize) -> Result<()>
    {
        if margin < MIN_TEXT_READ_MARGIN {
            return Err(ConduitError::MarginTooSmall(margin));
        }
        let inner = self.inner.as_ref().ok_or(ConduitError::InvalidHandle)?;
        inner.try_borrow_mut().map_err(|_| ConduitError::HandleInUse)?.text_read_margin = margin;
        Ok(())
    }

    /// The file-like object behind this handle.
    ///
    /// Owned and forced-I/O handles return the very object they were built
    /// from. A borrowed handle on the native path, and a bare descriptor
    /// handle, return a fresh [`DescriptorStream`] over the same descriptor:
    /// same descriptor, different object.
    #[must_use]
    pub fn get_file(&self) -> Option<StreamRef>
    {
        let inner = self.borrow_inner()?;
        match &inner.backing {
            Backing::Invalid => None,
            Backing::Descriptor(d) => d.is_valid().then(|| descriptor_view(d.raw(), inner.options)),
            Backing::Stream(s) => match (s.ownership, s.io_path, &s.native) {
                (Ownership::Borrowed, IoPath::Native, Some(native)) => Some(descriptor_view(native.raw(), inner.options)),
                _ => Some(Rc::clone(&s.stream)),
            },
        }
    }

    /// Do `self` and `other` share one underlying file?
    #[must_use]
    pub fn same_file(&self, other: &FileHandle) -> bool
    {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Write all of `buf`, mapping the status to an `io::Result`.
    ///
    /// ## Errors
    ///
    /// The failure status as an `io::Error`.
    pub fn write_all_bytes(&self, buf: &[u8]) -> io::Result<()>
    {
        let mut rest = buf;
        while !rest.is_empty() {
            let (status, n) = self.write(rest);
            status.into_io_result()?;
            if n == 0 {
                return Err(io::Error::from(io::ErrorKind::WriteZero));
            }
            rest = &rest[n..];
        }
        Ok(())
    }
}

fn in_use() -> Status
{
    Status::error(StatusKind::Generic, ConduitError::HandleInUse.to_string())
}

fn descriptor_view(fd: RawFd, options: OpenOptions) -> StreamRef
{
    Rc::new(RefCell::new(DescriptorStream::new(fd, options)))
}

fn finish(operation: &'static str, result: std::result::Result<usize, Status>) -> (Status, usize)
{
    match result {
        Ok(n) => {
            trace!(operation, bytes = n, "file handle io");
            (Status::success(), n)
        }
        Err(status) => {
            warn!(operation, error = %status, "file handle io failed");
            (status, 0)
        }
    }
}

impl fmt::Debug for FileHandle
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let mut debug = f.debug_struct("FileHandle");
        match &self.inner {
            Some(inner) => match inner.try_borrow() {
                Ok(inner) => debug
                    .field("backing", &inner.backing.describe())
                    .field("options", &inner.options)
                    .finish(),
                Err(_) => debug.field("backing", &"<in use>").finish(),
            },
            None => debug.field("backing", &"invalid").finish(),
        }
    }
}

impl io::Read for FileHandle
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>
    {
        let (status, n) = FileHandle::read(self, buf);
        status.into_io_result()?;
        Ok(n)
    }
}

impl io::Write for FileHandle
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>
    {
        let (status, n) = FileHandle::write(self, buf);
        status.into_io_result()?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()>
    {
        FileHandle::flush(self).into_io_result()
    }
}

/// Anything that can be turned into a [`FileHandle`]
///
/// Lets redirection APIs accept either a ready handle or a raw file-like
/// object. A raw object becomes an owned handle.
pub trait IntoFileHandle
{
    /// Perform the conversion.
    ///
    /// ## Errors
    ///
    /// Whatever building the handle reports.
    fn into_file_handle(self) -> Result<FileHandle>;
}

impl IntoFileHandle for FileHandle
{
    fn into_file_handle(self) -> Result<FileHandle>
    {
        Ok(self)
    }
}

impl IntoFileHandle for &FileHandle
{
    fn into_file_handle(self) -> Result<FileHandle>
    {
        Ok(self.clone())
    }
}

impl IntoFileHandle for StreamRef
{
    fn into_file_handle(self) -> Result<FileHandle>
    {
        FileHandle::from_stream(self)
    }
}
