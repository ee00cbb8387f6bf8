//! In-memory streams: [`MemoryStream`] for bytes and [`TextStream`] for text.

use std::io;

use super::stream::{closed_error, FileLike, StreamKind};

/// Growable in-memory byte stream with a cursor
///
/// Writes overwrite from the cursor and extend the buffer when they run past
/// its end; reads consume from the cursor.
#[derive(Debug, Clone, Default)]
pub struct MemoryStream
{
    data: Vec<u8>,
    position: usize,
    read_only: bool,
    closed: bool,
}

impl MemoryStream
{
    /// Empty read/write stream.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Read/write stream positioned at the start of `data`.
    pub fn with_contents(data: impl Into<Vec<u8>>) -> Self
    {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Stream that refuses writes.
    pub fn read_only(data: impl Into<Vec<u8>>) -> Self
    {
        Self {
            read_only: true,
            ..Self::with_contents(data)
        }
    }

    /// Everything written so far, regardless of the cursor.
    #[must_use]
    pub fn contents(&self) -> &[u8]
    {
        &self.data
    }

    /// Move the cursor back to the start.
    pub fn rewind(&mut self)
    {
        self.position = 0;
    }

    fn check_open(&self) -> io::Result<()>
    {
        if self.closed {
            Err(closed_error())
        } else {
            Ok(())
        }
    }
}

impl FileLike for MemoryStream
{
    fn readable(&self) -> io::Result<bool>
    {
        self.check_open()?;
        Ok(true)
    }

    fn writable(&self) -> io::Result<bool>
    {
        self.check_open()?;
        Ok(!self.read_only)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>
    {
        self.check_open()?;
        let available = &self.data[self.position.min(self.data.len())..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>
    {
        self.check_open()?;
        if self.read_only {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "stream is not writable"));
        }
        if self.position > self.data.len() {
            self.data.resize(self.position, 0);
        }
        let end = (self.position + buf.len()).min(self.data.len());
        self.data.splice(self.position..end, buf.iter().copied());
        self.position += buf.len();
        Ok(buf.len())
    }

    fn close(&mut self) -> io::Result<()>
    {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool
    {
        self.closed
    }
}

/// In-memory UTF-8 text stream with a character cursor
///
/// The text counterpart of [`MemoryStream`]: reads hand out whole
/// characters and writes take `&str`.
#[derive(Debug, Clone, Default)]
pub struct TextStream
{
    text: String,
    // Byte offset into `text`, always on a char boundary.
    position: usize,
    closed: bool,
}

impl TextStream
{
    /// Empty stream.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Stream positioned at the start of `text`.
    pub fn with_contents(text: impl Into<String>) -> Self
    {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> &str
    {
        &self.text
    }

    /// Move the cursor back to the start.
    pub fn rewind(&mut self)
    {
        self.position = 0;
    }

    // Byte offset `chars` characters past the cursor, clamped to the end.
    fn offset_after(&self, chars: usize) -> usize
    {
        self.text[self.position..]
            .char_indices()
            .nth(chars)
            .map_or(self.text.len(), |(i, _)| self.position + i)
    }

    fn check_open(&self) -> io::Result<()>
    {
        if self.closed {
            Err(closed_error())
        } else {
            Ok(())
        }
    }
}

impl FileLike for TextStream
{
    fn readable(&self) -> io::Result<bool>
    {
        self.check_open()?;
        Ok(true)
    }

    fn writable(&self) -> io::Result<bool>
    {
        self.check_open()?;
        Ok(true)
    }

    fn kind(&self) -> StreamKind
    {
        StreamKind::Text
    }

    fn read_text(&mut self, max_chars: usize) -> io::Result<String>
    {
        self.check_open()?;
        let end = self.offset_after(max_chars);
        let chunk = self.text[self.position..end].to_string();
        self.position = end;
        Ok(chunk)
    }

    fn write_text(&mut self, text: &str) -> io::Result<usize>
    {
        self.check_open()?;
        let count = text.chars().count();
        let end = self.offset_after(count);
        self.text.replace_range(self.position..end, text);
        self.position += text.len();
        Ok(count)
    }

    fn close(&mut self) -> io::Result<()>
    {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool
    {
        self.closed
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_memory_stream_overwrites_from_cursor()
    {
        let mut stream = MemoryStream::with_contents(b"hello world".to_vec());
        stream.write(b"HELLO").unwrap();
        assert_eq!(stream.contents(), b"HELLO world");

        let mut buf = [0u8; 3];
        assert_eq!(stream.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b" wo");
    }

    #[test]
    fn test_memory_stream_closed()
    {
        let mut stream = MemoryStream::new();
        stream.close().unwrap();
        assert!(stream.is_closed());
        assert!(stream.readable().is_err());
        assert!(stream.write(b"x").is_err());
    }

    #[test]
    fn test_read_only_stream()
    {
        let mut stream = MemoryStream::read_only(b"abc".to_vec());
        assert!(!stream.writable().unwrap());
        assert_eq!(stream.write(b"z").unwrap_err().kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_text_stream_reads_whole_characters()
    {
        let mut stream = TextStream::with_contents("\u{1F4A9}a\u{00E9}");
        assert_eq!(stream.read_text(1).unwrap(), "\u{1F4A9}");
        assert_eq!(stream.read_text(5).unwrap(), "a\u{00E9}");
        assert_eq!(stream.read_text(5).unwrap(), "");
    }

    #[test]
    fn test_text_stream_write_overwrites_characters()
    {
        let mut stream = TextStream::with_contents("\u{00E9}\u{00E9}\u{00E9}");
        assert_eq!(stream.write_text("ab").unwrap(), 2);
        assert_eq!(stream.contents(), "ab\u{00E9}");
        stream.write_text("cdef").unwrap();
        assert_eq!(stream.contents(), "abcdef");
    }
}
