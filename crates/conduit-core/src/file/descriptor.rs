//! # Native Descriptors
//!
//! Thin wrapper over a raw POSIX file descriptor with an ownership bit.
//!
//! An owned descriptor is closed when the wrapper is closed or dropped. A
//! borrowed one is only forgotten: the caller that lent it stays responsible
//! for closing it.

use std::io;
use std::os::unix::io::RawFd;

use tracing::{trace, warn};

/// Sentinel for "no descriptor"
pub const INVALID_DESCRIPTOR: RawFd = -1;

/// A raw descriptor plus whether we are responsible for closing it
#[derive(Debug)]
pub struct NativeDescriptor
{
    fd: RawFd,
    owned: bool,
}

impl NativeDescriptor
{
    /// Wrap `fd`. When `owned` is true the descriptor is closed on
    /// [`close`](Self::close) or drop.
    #[must_use]
    pub fn new(fd: RawFd, owned: bool) -> Self
    {
        Self { fd, owned }
    }

    /// The raw descriptor number, or [`INVALID_DESCRIPTOR`] once closed.
    #[must_use]
    pub fn raw(&self) -> RawFd
    {
        self.fd
    }

    /// Whether closing this wrapper closes the descriptor.
    #[must_use]
    pub fn is_owned(&self) -> bool
    {
        self.owned
    }

    /// `true` until the descriptor has been released.
    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.fd >= 0
    }

    /// Read once into `buf`, retrying on `EINTR`.
    ///
    /// ## Errors
    ///
    /// The OS error reported by `read(2)`.
    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize>
    {
        self.check_valid()?;
        loop {
            // SAFETY: `buf` is a live, writable slice of `buf.len()` bytes.
            let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
            if n >= 0 {
                trace!(fd = self.fd, bytes = n, "descriptor read");
                return Ok(n.unsigned_abs());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    /// Write all of `buf`, retrying on `EINTR` and short writes.
    ///
    /// ## Errors
    ///
    /// The OS error reported by `write(2)`, or `WriteZero` if the descriptor
    /// stops accepting bytes.
    pub fn write(&self, buf: &[u8]) -> io::Result<usize>
    {
        self.check_valid()?;
        let mut written = 0;
        while written < buf.len() {
            let rest = &buf[written..];
            // SAFETY: `rest` is a live slice of `rest.len()` bytes.
            let n = unsafe { libc::write(self.fd, rest.as_ptr().cast(), rest.len()) };
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            if n == 0 {
                return Err(io::Error::from(io::ErrorKind::WriteZero));
            }
            written += n.unsigned_abs();
        }
        trace!(fd = self.fd, bytes = written, "descriptor write");
        Ok(written)
    }

    /// `fcntl(F_GETFL)` status flags.
    ///
    /// ## Errors
    ///
    /// `EBADF` and friends from `fcntl(2)`.
    pub fn status_flags(&self) -> io::Result<libc::c_int>
    {
        self.check_valid()?;
        // SAFETY: F_GETFL takes no pointer arguments.
        let flags = unsafe { libc::fcntl(self.fd, libc::F_GETFL) };
        if flags < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(flags)
        }
    }

    /// Whether the descriptor is closed across `exec`.
    ///
    /// ## Errors
    ///
    /// `EBADF` and friends from `fcntl(2)`.
    pub fn close_on_exec(&self) -> io::Result<bool>
    {
        Ok(self.descriptor_flags()? & libc::FD_CLOEXEC != 0)
    }

    /// Set or clear `FD_CLOEXEC`.
    ///
    /// ## Errors
    ///
    /// `EBADF` and friends from `fcntl(2)`.
    pub fn set_close_on_exec(&self, enabled: bool) -> io::Result<()>
    {
        let flags = self.descriptor_flags()?;
        let flags = if enabled {
            flags | libc::FD_CLOEXEC
        } else {
            flags & !libc::FD_CLOEXEC
        };
        // SAFETY: F_SETFD takes an integer argument.
        if unsafe { libc::fcntl(self.fd, libc::F_SETFD, flags) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn descriptor_flags(&self) -> io::Result<libc::c_int>
    {
        self.check_valid()?;
        // SAFETY: F_GETFD takes no pointer arguments.
        let flags = unsafe { libc::fcntl(self.fd, libc::F_GETFD) };
        if flags < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(flags)
        }
    }

    /// `true` if the descriptor refers to a terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool
    {
        // SAFETY: isatty only inspects the descriptor number.
        self.is_valid() && unsafe { libc::isatty(self.fd) } == 1
    }

    /// Release the descriptor, closing it only when owned.
    ///
    /// Calling this twice is harmless.
    ///
    /// ## Errors
    ///
    /// The OS error from `close(2)`. The wrapper is invalid afterwards even
    /// if closing failed.
    pub fn close(&mut self) -> io::Result<()>
    {
        let fd = std::mem::replace(&mut self.fd, INVALID_DESCRIPTOR);
        if fd < 0 || !self.owned {
            return Ok(());
        }
        trace!(fd, "closing owned descriptor");
        // SAFETY: we own `fd` and have just forgotten it, so it is closed once.
        if unsafe { libc::close(fd) } == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    fn check_valid(&self) -> io::Result<()>
    {
        if self.is_valid() {
            Ok(())
        } else {
            Err(io::Error::from_raw_os_error(libc::EBADF))
        }
    }
}

impl Drop for NativeDescriptor
{
    fn drop(&mut self)
    {
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to close descriptor on drop");
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::fs::File;
    use std::io::{Read, Seek, SeekFrom};
    use std::os::unix::io::{AsRawFd, IntoRawFd};

    use super::*;

    #[test]
    fn test_borrowed_descriptor_is_not_closed()
    {
        let mut file = tempfile::tempfile().unwrap();
        let mut descriptor = NativeDescriptor::new(file.as_raw_fd(), false);
        assert_eq!(descriptor.write(b"hello").unwrap(), 5);
        descriptor.close().unwrap();
        assert!(!descriptor.is_valid());

        // Still usable through the original owner.
        file.seek(SeekFrom::Start(0)).unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "hello");
    }

    #[test]
    fn test_owned_descriptor_is_closed()
    {
        let mut fds = [0 as RawFd; 2];
        // SAFETY: `fds` has room for the two descriptors pipe(2) writes.
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let reader = NativeDescriptor::new(fds[0], true);
        let mut writer = NativeDescriptor::new(fds[1], true);

        writer.write(b"ab").unwrap();
        writer.close().unwrap();

        // The only write end is gone, so the reader drains and then sees EOF.
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_closed_descriptor_reports_ebadf()
    {
        let mut descriptor = NativeDescriptor::new(File::open("/dev/null").unwrap().into_raw_fd(), true);
        descriptor.close().unwrap();
        descriptor.close().unwrap();

        let err = descriptor.write(b"x").unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }

    #[test]
    fn test_status_flags_follow_access_mode()
    {
        let file = File::open("/dev/null").unwrap();
        let descriptor = NativeDescriptor::new(file.as_raw_fd(), false);
        let flags = descriptor.status_flags().unwrap();
        assert_eq!(flags & libc::O_ACCMODE, libc::O_RDONLY);
    }
}
