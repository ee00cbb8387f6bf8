//! Common module for library exports

pub use crate::bridge::ScriptValue;
pub use crate::debugger::Debugger;
pub use crate::error::{ConduitError, Result};
pub use crate::file::{
    stream_ref, DescriptorStream, FileHandle, FileLike, IntoFileHandle, IoPath, MemoryStream, OpenOptions, OsFile,
    Ownership, StreamKind, StreamRef, TextStream,
};
pub use crate::interpreter::{CommandInterpreter, RunOptions, RunResult};
pub use crate::return_object::{CommandReturnObject, ReturnStatus};
pub use crate::status::{Status, StatusKind};
