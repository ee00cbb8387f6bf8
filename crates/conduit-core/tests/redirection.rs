//! Tests for redirecting a debugger session's input, output and error files

use std::cell::RefCell;
use std::fs;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::rc::Rc;

use conduit_core::bridge::ScriptValue;
use conduit_core::file::{same_stream, stream_ref, FileHandle, FileLike, MemoryStream, OsFile, StreamRef};
use conduit_core::{CommandReturnObject, Debugger, RunOptions};

fn input_file(dir: &Path, commands: &str) -> StreamRef
{
    let path = dir.join("input");
    fs::write(&path, commands).unwrap();
    stream_ref(OsFile::open(&path, "r").unwrap())
}

#[test]
fn test_legacy_output_handle()
{
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output");
    let stream: StreamRef = stream_ref(OsFile::open(&path, "w").unwrap());

    let mut debugger = Debugger::create();
    assert!(debugger.set_output_file_handle(stream.clone(), false).succeeded());
    assert!(debugger.handle_command("help help").is_success());
    debugger.destroy();

    assert!(!stream.borrow().is_closed());
    let output = fs::read_to_string(&path).unwrap();
    assert!(output.contains("Show a list of all debugger commands"));
}

#[test]
fn test_legacy_error_handle()
{
    let errors = Rc::new(RefCell::new(MemoryStream::new()));
    let stream: StreamRef = errors.clone();

    let mut debugger = Debugger::create();
    assert!(debugger.set_error_file_handle(stream.clone(), false).succeeded());
    assert!(!debugger.handle_command("lolwut").is_success());

    // No descriptor to share, so the legacy getter hands back the same object.
    assert!(same_stream(&debugger.error_file_handle().unwrap(), &stream));

    let text = String::from_utf8(errors.borrow().contents().to_vec()).unwrap();
    assert!(text.starts_with("error:"));
    assert!(text.contains("lolwut"));
}

#[test]
fn test_legacy_handles_with_ownership_transfer()
{
    let output = stream_ref(MemoryStream::new());
    let errors = stream_ref(MemoryStream::new());
    let input = stream_ref(MemoryStream::with_contents(b"quit\n".to_vec()));

    let mut debugger = Debugger::create();
    assert!(debugger.set_output_file_handle(output.clone(), true).succeeded());
    assert!(debugger.set_error_file_handle(errors.clone(), true).succeeded());
    assert!(debugger.set_input_file_handle(input.clone(), true).succeeded());
    debugger.handle_command("echo owned");

    assert!(!output.borrow().is_closed());
    debugger.destroy();

    assert!(output.borrow().is_closed());
    assert!(errors.borrow().is_closed());
    assert!(input.borrow().is_closed());
}

#[test]
fn test_error_file_from_descriptor()
{
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("errors");
    let file = fs::File::create(&path).unwrap();

    let mut debugger = Debugger::create();
    let handle = FileHandle::from_descriptor(file.as_raw_fd(), "w", false).unwrap();
    assert!(debugger.set_error_file(handle).succeeded());
    debugger.handle_command("lolwut");
    debugger.destroy();
    drop(file);

    let errors = fs::read_to_string(&path).unwrap();
    assert_eq!(errors, "error: 'lolwut' is not a valid command.\n");
}

#[test]
fn test_output_handle_is_shared()
{
    let output = Rc::new(RefCell::new(MemoryStream::new()));
    let handle = FileHandle::borrowed(output.clone()).unwrap();

    let mut debugger = Debugger::create();
    assert!(debugger.set_output_file(&handle).succeeded());
    assert!(debugger.output_file().same_file(&handle));

    debugger.handle_command("echo one");
    handle.write(b"two\n");
    debugger.handle_command("echo three");
    assert_eq!(output.borrow().contents(), b"one\ntwo\nthree\n");
}

#[test]
fn test_rejected_redirections_keep_current_file()
{
    let output = Rc::new(RefCell::new(MemoryStream::new()));
    let mut debugger = Debugger::create();
    assert!(debugger.set_output_file(FileHandle::borrowed(output.clone()).unwrap()).succeeded());

    let status = debugger.set_output_file(FileHandle::new());
    assert!(status.fail());

    let status = debugger.set_output_file(ScriptValue::from("not a file"));
    assert!(status.fail());
    assert!(status.message().unwrap().contains("TypeError"));

    debugger.handle_command("echo still here");
    assert_eq!(output.borrow().contents(), b"still here\n");
}

#[test]
fn test_raw_object_is_owned_by_session()
{
    let stream = stream_ref(MemoryStream::new());
    let mut debugger = Debugger::create();
    assert!(debugger.set_output_file(stream.clone()).succeeded());
    debugger.destroy();
    assert!(stream.borrow().is_closed());
}

#[test]
fn test_immediate_output_file_stays_open()
{
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("immediate");
    let stream: StreamRef = stream_ref(OsFile::open(&path, "w").unwrap());

    let mut debugger = Debugger::create();
    {
        let mut ret = CommandReturnObject::new();
        assert!(ret.set_immediate_output_file(stream.clone()).succeeded());
        debugger.command_interpreter().handle_command("help help", &mut ret);
        assert!(ret.succeeded());
    }

    // Dropping the result flushed the file but did not close it.
    assert!(!stream.borrow().is_closed());
    assert_eq!(stream.borrow_mut().write(b"after\n").unwrap(), 6);
    drop(stream);

    let output = fs::read_to_string(&path).unwrap();
    assert!(output.contains("Show a list of all debugger commands"));
    assert!(output.ends_with("after\n"));
}

#[test]
fn test_run_command_interpreter_help()
{
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("output");

    let mut debugger = Debugger::create();
    let input = FileHandle::create(input_file(dir.path(), "help help\n"), true).unwrap();
    assert!(debugger.set_input_file(input).succeeded());
    assert!(debugger.set_output_file(stream_ref(OsFile::open(&output_path, "w").unwrap())).succeeded());

    let result = debugger.run_command_interpreter(&RunOptions::default());
    assert_eq!(result.n_errors, 0);
    assert!(!result.quit_requested);
    debugger.output_file().flush();

    let output = fs::read_to_string(&output_path).unwrap();
    assert!(output.contains("Show a list of all debugger commands"));
}

#[test]
fn test_run_session_with_error_and_quit()
{
    let dir = tempfile::tempdir().unwrap();
    let errors = Rc::new(RefCell::new(MemoryStream::new()));

    let mut debugger = Debugger::create();
    let input = FileHandle::create(input_file(dir.path(), "nonexistingcommand\nquit\n"), true).unwrap();
    assert!(debugger.set_input_file(input).succeeded());
    assert!(debugger.set_output_file(stream_ref(MemoryStream::new())).succeeded());
    assert!(debugger.set_error_file(FileHandle::borrowed(errors.clone()).unwrap()).succeeded());

    let result = debugger.run_command_interpreter(&RunOptions::default());
    assert!(!result.has_crashed);
    assert!(result.quit_requested);
    assert!(result.n_errors > 0);

    let text = String::from_utf8(errors.borrow().contents().to_vec()).unwrap();
    assert!(text.contains("nonexistingcommand"));
}

#[test]
fn test_echo_commands()
{
    let dir = tempfile::tempdir().unwrap();
    let output = Rc::new(RefCell::new(MemoryStream::new()));

    let mut debugger = Debugger::create();
    debugger.command_interpreter().set_prompt("> ");
    debugger.set_input_file(input_file(dir.path(), "echo hi\n"));
    debugger.set_output_file(FileHandle::borrowed(output.clone()).unwrap());

    let options = RunOptions {
        echo_commands: true,
        ..RunOptions::default()
    };
    debugger.run_command_interpreter(&options);
    assert_eq!(output.borrow().contents(), b"> echo hi\nhi\n");
}
