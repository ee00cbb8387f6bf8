//! Descriptor-backed file-like objects.
//!
//! - [`OsFile`] owns a `std::fs::File` and exposes its descriptor.
//! - [`DescriptorStream`] wraps a descriptor it does not own. This is what a
//!   handle hands back from `get_file` when it cannot give out the original
//!   object.

use std::fs;
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

use super::descriptor::NativeDescriptor;
use super::options::OpenOptions;
use super::stream::{closed_error, FileLike};
use crate::error::Result;

/// A regular OS file
///
/// Access rights are taken from the descriptor's status flags, so a `File`
/// opened read-only reports `writable() == false`.
#[derive(Debug)]
pub struct OsFile
{
    file: Option<fs::File>,
    options: OpenOptions,
}

impl OsFile
{
    /// Wrap an open file.
    ///
    /// ## Errors
    ///
    /// `Io` if the descriptor's status flags cannot be read.
    pub fn new(file: fs::File) -> Result<Self>
    {
        let flags = NativeDescriptor::new(file.as_raw_fd(), false).status_flags()?;
        Ok(Self {
            file: Some(file),
            options: OpenOptions::from_status_flags(flags),
        })
    }

    /// Open `path` with an `fopen`-style mode (`"r"`, `"w"`, `"a+"`, ...).
    ///
    /// ## Errors
    ///
    /// `InvalidMode` for a bad mode string, `Io` if opening fails.
    pub fn open(path: impl AsRef<Path>, mode: &str) -> Result<Self>
    {
        Self::open_with(path, OpenOptions::from_mode(mode)?)
    }

    /// Open `path` with explicit [`OpenOptions`].
    ///
    /// `DONT_FOLLOW_SYMLINKS` makes opening a trailing symlink fail.
    /// Without `CLOSE_ON_EXEC` the descriptor is inherited by child
    /// processes, as with `fopen`.
    ///
    /// ## Errors
    ///
    /// `Io` if opening fails or the descriptor flags cannot be set.
    pub fn open_with(path: impl AsRef<Path>, options: OpenOptions) -> Result<Self>
    {
        let mut custom_flags = 0;
        if options.contains(OpenOptions::DONT_FOLLOW_SYMLINKS) {
            custom_flags |= libc::O_NOFOLLOW;
        }
        if options.contains(OpenOptions::CLOSE_ON_EXEC) {
            custom_flags |= libc::O_CLOEXEC;
        }
        if options.contains(OpenOptions::NON_BLOCKING) {
            custom_flags |= libc::O_NONBLOCK;
        }

        let file = fs::OpenOptions::new()
            .read(options.is_readable())
            .write(options.is_writable() && !options.contains(OpenOptions::APPEND))
            .append(options.contains(OpenOptions::APPEND))
            .truncate(options.contains(OpenOptions::TRUNCATE))
            .create(options.contains(OpenOptions::CAN_CREATE) && !options.contains(OpenOptions::CAN_CREATE_NEW_ONLY))
            .create_new(options.contains(OpenOptions::CAN_CREATE_NEW_ONLY))
            .custom_flags(custom_flags)
            .open(path)?;

        // std always opens with O_CLOEXEC.
        if !options.contains(OpenOptions::CLOSE_ON_EXEC) {
            NativeDescriptor::new(file.as_raw_fd(), false).set_close_on_exec(false)?;
        }
        Self::new(file)
    }

    /// Access rights of the underlying descriptor.
    #[must_use]
    pub fn options(&self) -> OpenOptions
    {
        self.options
    }

    fn file(&mut self) -> io::Result<&mut fs::File>
    {
        self.file.as_mut().ok_or_else(closed_error)
    }
}

impl FileLike for OsFile
{
    fn readable(&self) -> io::Result<bool>
    {
        if self.file.is_none() {
            return Err(closed_error());
        }
        Ok(self.options.is_readable())
    }

    fn writable(&self) -> io::Result<bool>
    {
        if self.file.is_none() {
            return Err(closed_error());
        }
        Ok(self.options.is_writable())
    }

    fn descriptor(&self) -> Option<RawFd>
    {
        self.file.as_ref().map(AsRawFd::as_raw_fd)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>
    {
        self.file()?.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>
    {
        self.file()?.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()>
    {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()>
    {
        // Dropping the `File` closes the descriptor.
        self.file.take();
        Ok(())
    }

    fn is_closed(&self) -> bool
    {
        self.file.is_none()
    }
}

/// A non-owning file-like view of a raw descriptor
///
/// Closing it only detaches the view; the descriptor stays open for whoever
/// owns it.
#[derive(Debug)]
pub struct DescriptorStream
{
    descriptor: NativeDescriptor,
    options: OpenOptions,
}

impl DescriptorStream
{
    /// View `fd` with the given access rights.
    #[must_use]
    pub fn new(fd: RawFd, options: OpenOptions) -> Self
    {
        Self {
            descriptor: NativeDescriptor::new(fd, false),
            options,
        }
    }

    /// Access rights this view was created with.
    #[must_use]
    pub fn options(&self) -> OpenOptions
    {
        self.options
    }
}

impl FileLike for DescriptorStream
{
    fn readable(&self) -> io::Result<bool>
    {
        Ok(self.options.is_readable())
    }

    fn writable(&self) -> io::Result<bool>
    {
        Ok(self.options.is_writable())
    }

    fn descriptor(&self) -> Option<RawFd>
    {
        self.descriptor.is_valid().then(|| self.descriptor.raw())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>
    {
        if !self.descriptor.is_valid() {
            return Err(closed_error());
        }
        self.descriptor.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>
    {
        if !self.descriptor.is_valid() {
            return Err(closed_error());
        }
        self.descriptor.write(buf)
    }

    fn close(&mut self) -> io::Result<()>
    {
        self.descriptor.close()
    }

    fn is_closed(&self) -> bool
    {
        !self.descriptor.is_valid()
    }
}
