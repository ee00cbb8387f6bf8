//! # Command Results
//!
//! [`CommandReturnObject`] collects what one command produced. Output and
//! error text are always buffered; when an immediate output or error file is
//! set, each piece is also written there as soon as it is produced, so a
//! long-running command shows progress before it finishes.
//!
//! Immediate files given as raw objects are borrowed: the return object
//! flushes them when it is dropped but never closes them.

use tracing::warn;

use crate::file::{FileHandle, StreamRef};
use crate::status::Status;

/// Final state of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReturnStatus
{
    /// Nothing has run yet
    #[default]
    Invalid,
    /// Succeeded without producing a result
    SuccessFinishNoResult,
    /// Succeeded and produced output
    SuccessFinishResult,
    /// The command asked the interpreter to stop
    Quit,
    /// Failed
    Failed,
}

impl ReturnStatus
{
    /// Is this a success state?
    #[must_use]
    pub fn is_success(self) -> bool
    {
        matches!(self, Self::SuccessFinishNoResult | Self::SuccessFinishResult | Self::Quit)
    }
}

/// Output, error text and status of one command
#[derive(Debug, Default)]
pub struct CommandReturnObject
{
    output: String,
    error: String,
    status: ReturnStatus,
    immediate_output: Option<FileHandle>,
    immediate_error: Option<FileHandle>,
}

impl CommandReturnObject
{
    /// Empty result.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Buffered output.
    #[must_use]
    pub fn output(&self) -> &str
    {
        &self.output
    }

    /// Buffered error text.
    #[must_use]
    pub fn error(&self) -> &str
    {
        &self.error
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> ReturnStatus
    {
        self.status
    }

    /// Overwrite the status.
    pub fn set_status(&mut self, status: ReturnStatus)
    {
        self.status = status;
    }

    /// Did the command succeed?
    #[must_use]
    pub fn succeeded(&self) -> bool
    {
        self.status.is_success()
    }

    /// Append `text` to the output, echoing it to the immediate output file.
    pub fn append_output(&mut self, text: &str)
    {
        self.output.push_str(text);
        emit(self.immediate_output.as_ref(), text);
    }

    /// Append `message` followed by a newline.
    pub fn append_message(&mut self, message: &str)
    {
        self.append_output(message);
        if !message.ends_with('\n') {
            self.append_output("\n");
        }
    }

    /// Append `error: <message>` to the error text and mark the command failed.
    pub fn append_error(&mut self, message: &str)
    {
        let line = if message.ends_with('\n') {
            format!("error: {message}")
        } else {
            format!("error: {message}\n")
        };
        self.error.push_str(&line);
        emit(self.immediate_error.as_ref(), &line);
        self.status = ReturnStatus::Failed;
    }

    /// Reset buffers and status. Immediate files stay in place.
    pub fn clear(&mut self)
    {
        self.output.clear();
        self.error.clear();
        self.status = ReturnStatus::Invalid;
    }

    /// Send output to `stream` while commands run, borrowing it.
    ///
    /// Returns a failure status if `stream` is not a usable file.
    pub fn set_immediate_output_file(&mut self, stream: StreamRef) -> Status
    {
        match FileHandle::borrowed(stream) {
            Ok(handle) => self.set_immediate_output_handle(handle),
            Err(err) => Status::from(err),
        }
    }

    /// Send error text to `stream` while commands run, borrowing it.
    pub fn set_immediate_error_file(&mut self, stream: StreamRef) -> Status
    {
        match FileHandle::borrowed(stream) {
            Ok(handle) => self.set_immediate_error_handle(handle),
            Err(err) => Status::from(err),
        }
    }

    /// Send output to an existing handle while commands run.
    pub fn set_immediate_output_handle(&mut self, handle: FileHandle) -> Status
    {
        if !handle.is_valid() {
            return Status::invalid_handle();
        }
        self.immediate_output = Some(handle);
        Status::success()
    }

    /// Send error text to an existing handle while commands run.
    pub fn set_immediate_error_handle(&mut self, handle: FileHandle) -> Status
    {
        if !handle.is_valid() {
            return Status::invalid_handle();
        }
        self.immediate_error = Some(handle);
        Status::success()
    }

    /// The immediate output handle, if any.
    #[must_use]
    pub fn immediate_output_file(&self) -> Option<&FileHandle>
    {
        self.immediate_output.as_ref()
    }

    /// The immediate error handle, if any.
    #[must_use]
    pub fn immediate_error_file(&self) -> Option<&FileHandle>
    {
        self.immediate_error.as_ref()
    }
}

fn emit(handle: Option<&FileHandle>, text: &str)
{
    if let Some(handle) = handle {
        if let Err(err) = handle.write_all_bytes(text.as_bytes()) {
            warn!(error = %err, "failed to write immediate command output");
        }
    }
}

impl Drop for CommandReturnObject
{
    fn drop(&mut self)
    {
        for handle in [&self.immediate_output, &self.immediate_error].into_iter().flatten() {
            let status = handle.flush();
            if status.fail() && handle.is_valid() {
                warn!(error = %status, "failed to flush immediate file");
            }
        }
    }
}
