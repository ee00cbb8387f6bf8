//! # Debugger Session
//!
//! A [`Debugger`] owns three redirectable files (input, output and error)
//! and a [`CommandInterpreter`] that reads from the first and reports on the
//! other two.
//!
//! A new session starts on the process's standard streams, borrowed, so
//! dropping the session never closes stdin, stdout or stderr.
//!
//! ## Redirection
//!
//! Each `set_*_file` method accepts anything that implements
//! [`IntoFileHandle`]: a ready [`FileHandle`] (shared, so its ownership flags
//! decide what happens on close) or a raw [`StreamRef`], which the session
//! takes ownership of. The legacy `set_*_file_handle` methods take a raw
//! object plus an explicit `transfer_ownership` flag.
//!
//! ## Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use conduit_core::debugger::Debugger;
//! use conduit_core::file::{FileHandle, MemoryStream};
//!
//! let output = Rc::new(RefCell::new(MemoryStream::new()));
//! let mut debugger = Debugger::create();
//! let status = debugger.set_output_file(FileHandle::borrowed(output.clone())?);
//! assert!(status.succeeded());
//!
//! debugger.handle_command("help help");
//! let text = String::from_utf8_lossy(output.borrow().contents()).into_owned();
//! assert!(text.contains("Show a list of all debugger commands"));
//! # Ok::<(), conduit_core::error::ConduitError>(())
//! ```

use conduit_utils::config::{Settings, DEFAULT_TEXT_READ_MARGIN};
use libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use tracing::{debug, info, warn};

use crate::file::{FileHandle, IntoFileHandle, StreamRef};
use crate::interpreter::{CommandInterpreter, RunOptions, RunResult};
use crate::return_object::{CommandReturnObject, ReturnStatus};
use crate::status::Status;

/// One debugger session with redirectable standard files
#[derive(Debug)]
pub struct Debugger
{
    input: FileHandle,
    output: FileHandle,
    error: FileHandle,
    interpreter: CommandInterpreter,
    settings: Settings,
}

impl Default for Debugger
{
    fn default() -> Self
    {
        Self::with_settings(Settings::default())
    }
}

impl Debugger
{
    /// A session on the process's standard streams with default settings.
    #[must_use]
    pub fn create() -> Self
    {
        Self::default()
    }

    /// A session on the process's standard streams.
    #[must_use]
    pub fn with_settings(settings: Settings) -> Self
    {
        let input = stdio_handle(STDIN_FILENO, "r");
        let output = stdio_handle(STDOUT_FILENO, "w");
        let error = stdio_handle(STDERR_FILENO, "w");
        info!(text_read_margin = settings.text_read_margin, "debugger created");
        Self {
            input,
            output,
            error,
            interpreter: CommandInterpreter::new(settings.prompt.clone()),
            settings,
        }
    }

    /// End the session, flushing its files.
    ///
    /// Dropping the session does the same; this makes the end explicit.
    pub fn destroy(self)
    {
        drop(self);
    }

    /// Settings the session was created with.
    #[must_use]
    pub fn settings(&self) -> &Settings
    {
        &self.settings
    }

    /// Redirect command output.
    ///
    /// Returns a failure status, and leaves the current file in place, when
    /// `file` cannot be turned into a valid handle.
    pub fn set_output_file(&mut self, file: impl IntoFileHandle) -> Status
    {
        let settings = &self.settings;
        install("output", &mut self.output, file, settings)
    }

    /// Redirect error messages.
    pub fn set_error_file(&mut self, file: impl IntoFileHandle) -> Status
    {
        let settings = &self.settings;
        install("error", &mut self.error, file, settings)
    }

    /// Redirect command input.
    pub fn set_input_file(&mut self, file: impl IntoFileHandle) -> Status
    {
        let settings = &self.settings;
        install("input", &mut self.input, file, settings)
    }

    /// Redirect command output to a raw object, owning it if `transfer_ownership`.
    pub fn set_output_file_handle(&mut self, stream: StreamRef, transfer_ownership: bool) -> Status
    {
        match FileHandle::create(stream, !transfer_ownership) {
            Ok(handle) => self.set_output_file(handle),
            Err(err) => Status::from(err),
        }
    }

    /// Redirect error messages to a raw object, owning it if `transfer_ownership`.
    pub fn set_error_file_handle(&mut self, stream: StreamRef, transfer_ownership: bool) -> Status
    {
        match FileHandle::create(stream, !transfer_ownership) {
            Ok(handle) => self.set_error_file(handle),
            Err(err) => Status::from(err),
        }
    }

    /// Read commands from a raw object, owning it if `transfer_ownership`.
    pub fn set_input_file_handle(&mut self, stream: StreamRef, transfer_ownership: bool) -> Status
    {
        match FileHandle::create(stream, !transfer_ownership) {
            Ok(handle) => self.set_input_file(handle),
            Err(err) => Status::from(err),
        }
    }

    /// The current output handle.
    #[must_use]
    pub fn output_file(&self) -> FileHandle
    {
        self.output.clone()
    }

    /// The current error handle.
    #[must_use]
    pub fn error_file(&self) -> FileHandle
    {
        self.error.clone()
    }

    /// The current input handle.
    #[must_use]
    pub fn input_file(&self) -> FileHandle
    {
        self.input.clone()
    }

    /// The object behind the output handle. See [`FileHandle::get_file`].
    #[must_use]
    pub fn output_file_handle(&self) -> Option<StreamRef>
    {
        self.output.get_file()
    }

    /// The object behind the error handle.
    #[must_use]
    pub fn error_file_handle(&self) -> Option<StreamRef>
    {
        self.error.get_file()
    }

    /// The object behind the input handle.
    #[must_use]
    pub fn input_file_handle(&self) -> Option<StreamRef>
    {
        self.input.get_file()
    }

    /// The session's command interpreter.
    pub fn command_interpreter(&mut self) -> &mut CommandInterpreter
    {
        &mut self.interpreter
    }

    /// Run one command, writing its output and errors to the session's files.
    pub fn handle_command(&mut self, command: &str) -> ReturnStatus
    {
        let status = {
            let mut ret = CommandReturnObject::new();
            ret.set_immediate_output_handle(self.output.clone());
            ret.set_immediate_error_handle(self.error.clone());
            self.interpreter.handle_command(command, &mut ret)
        };
        self.flush();
        status
    }

    /// Read and run commands from the input file until end of file or `quit`.
    pub fn run_command_interpreter(&mut self, options: &RunOptions) -> RunResult
    {
        let options = RunOptions {
            echo_commands: options.echo_commands || self.settings.echo_commands,
            ..*options
        };
        self.interpreter.run(&self.input, &self.output, &self.error, &options)
    }

    fn flush(&self)
    {
        for (name, handle) in [("output", &self.output), ("error", &self.error)] {
            let status = handle.flush();
            if status.fail() && handle.is_valid() {
                warn!(file = name, error = %status, "failed to flush debugger file");
            }
        }
    }
}

fn stdio_handle(fd: i32, mode: &str) -> FileHandle
{
    FileHandle::from_descriptor(fd, mode, false).unwrap_or_else(|err| {
        warn!(fd, error = %err, "failed to wrap standard stream");
        FileHandle::new()
    })
}

fn install(name: &'static str, slot: &mut FileHandle, file: impl IntoFileHandle, settings: &Settings) -> Status
{
    let handle = match file.into_file_handle() {
        Ok(handle) => handle,
        Err(err) => {
            warn!(file = name, error = %err, "rejected redirection");
            return Status::from(err);
        }
    };
    if !handle.is_valid() {
        return Status::from_message("invalid file");
    }
    // A margin already customized on the handle wins over the session default.
    if handle.text_read_margin() == DEFAULT_TEXT_READ_MARGIN && settings.text_read_margin != DEFAULT_TEXT_READ_MARGIN {
        if let Err(err) = handle.set_text_read_margin(settings.text_read_margin) {
            return Status::from(err);
        }
    }
    debug!(file = name, handle = ?handle, "debugger file redirected");
    *slot = handle;
    Status::success()
}

impl Drop for Debugger
{
    fn drop(&mut self)
    {
        self.flush();
        info!("debugger destroyed");
    }
}

#[cfg(test)]
mod tests
{
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::file::{stream_ref, FileLike, MemoryStream};

    #[test]
    fn test_defaults_to_stdio()
    {
        let debugger = Debugger::create();
        assert_eq!(debugger.input_file().descriptor(), Some(STDIN_FILENO));
        assert_eq!(debugger.output_file().descriptor(), Some(STDOUT_FILENO));
        assert_eq!(debugger.error_file().descriptor(), Some(STDERR_FILENO));
    }

    #[test]
    fn test_invalid_handle_is_rejected()
    {
        let mut debugger = Debugger::create();
        let status = debugger.set_output_file(FileHandle::new());
        assert!(status.fail());
        assert_eq!(status.message(), Some("invalid file"));
        assert_eq!(debugger.output_file().descriptor(), Some(STDOUT_FILENO));
    }

    #[test]
    fn test_raw_stream_is_owned()
    {
        let sink = Rc::new(RefCell::new(MemoryStream::new()));
        {
            let mut debugger = Debugger::create();
            let stream: StreamRef = sink.clone();
            assert!(debugger.set_output_file(stream).succeeded());
            debugger.handle_command("echo hi");
            assert_eq!(sink.borrow().contents(), b"hi\n");
        }
        assert!(sink.borrow().is_closed());
    }

    #[test]
    fn test_legacy_setter_borrows()
    {
        let sink = Rc::new(RefCell::new(MemoryStream::new()));
        let mut debugger = Debugger::create();
        assert!(debugger.set_error_file_handle(sink.clone(), false).succeeded());
        debugger.handle_command("lolwut");
        debugger.destroy();

        assert!(!sink.borrow().is_closed());
        let text = String::from_utf8(sink.borrow().contents().to_vec()).unwrap();
        assert!(text.contains("error: 'lolwut' is not a valid command."));
    }

    #[test]
    fn test_settings_margin_applies_to_new_files()
    {
        let settings = Settings {
            text_read_margin: 8,
            ..Settings::default()
        };
        let mut debugger = Debugger::with_settings(settings);
        assert!(debugger.set_input_file(stream_ref(MemoryStream::new())).succeeded());
        assert_eq!(debugger.input_file().text_read_margin(), 8);
    }
}
