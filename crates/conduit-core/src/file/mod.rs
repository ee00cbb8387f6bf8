//! # Files
//!
//! The polymorphic [`FileHandle`] and everything it can sit on top of.
//!
//! - [`options`]: access flags and `fopen`-style mode strings
//! - [`descriptor`]: raw POSIX descriptors with an ownership bit
//! - [`stream`]: the [`FileLike`] capability trait for host-side objects
//! - [`memory`]: in-memory byte and text streams
//! - [`os`]: descriptor-backed file-like objects
//! - [`handle`]: the handle itself

pub mod descriptor;
pub mod handle;
pub mod memory;
pub mod options;
pub mod os;
pub mod stream;

pub use descriptor::{NativeDescriptor, INVALID_DESCRIPTOR};
pub use handle::{FileHandle, IntoFileHandle, IoPath, Ownership};
pub use memory::{MemoryStream, TextStream};
pub use options::OpenOptions;
pub use os::{DescriptorStream, OsFile};
pub use stream::{closed_error, same_stream, stream_ref, FileLike, StreamKind, StreamRef};
