//! # conduit-core
//!
//! Polymorphic file handles and I/O redirection for a scriptable debugger.
//!
//! This crate provides:
//! - [`FileHandle`]: one read/write/flush/close contract over raw
//!   descriptors and host-side file-like objects
//! - ownership and I/O-path control for every backing ([`Ownership`], [`IoPath`])
//! - a [`Debugger`] session whose input, output and error files can be
//!   redirected to any handle
//! - a small [`CommandInterpreter`] and [`CommandReturnObject`] for running
//!   commands against those files
//! - a [`bridge`] for values arriving from a dynamically typed scripting layer
//!
//! ## Why unsafe code is needed
//!
//! Descriptor-backed handles call `read`, `write`, `close`, `fcntl` and
//! `isatty` through `libc`. Those calls are wrapped in
//! [`NativeDescriptor`](file::NativeDescriptor), which checks the descriptor
//! before every call and retries on `EINTR`.
//!
//! ## Threading
//!
//! Handles and sessions are single-threaded (`Rc` + `RefCell`). File-like
//! objects may be shared with the code that created them; a handle reports a
//! failed [`Status`] rather than panicking when the object is already in use.

#![allow(unsafe_code)] // Required for descriptor syscalls (read, write, fcntl, isatty)

pub mod bridge;
pub mod debugger;
pub mod error;
pub mod file;
pub mod interpreter;
pub mod prelude;
pub mod return_object;
pub mod status;

pub use debugger::Debugger;
// Re-export commonly used types
pub use error::{ConduitError, Result};
pub use file::{FileHandle, FileLike, IntoFileHandle, IoPath, OpenOptions, Ownership, StreamRef};
pub use interpreter::{CommandInterpreter, RunOptions, RunResult};
pub use return_object::{CommandReturnObject, ReturnStatus};
pub use status::{Status, StatusKind};
