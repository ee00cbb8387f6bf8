//! Tests for error handling

use std::io;

use conduit_core::error::{ConduitError, Result};
use conduit_core::status::{Status, StatusKind};

#[test]
fn test_type_error_message()
{
    let error = ConduitError::type_error("a bytes-like object is required, not 'str'");
    assert_eq!(format!("{}", error), "TypeError: a bytes-like object is required, not 'str'");
}

#[test]
fn test_inspection_error_is_transparent()
{
    let error = ConduitError::Inspection(io::Error::other("OH NOE"));
    assert_eq!(error.to_string(), "OH NOE");
}

#[test]
fn test_invalid_mode_message()
{
    let error = ConduitError::InvalidMode("rw".to_string());
    let message = format!("{}", error);
    assert!(message.contains("invalid mode"));
    assert!(message.contains("\"rw\""));
}

#[test]
fn test_io_error_conversion()
{
    let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
    let error: ConduitError = io_err.into();

    match error {
        ConduitError::Io(ref e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
        _ => panic!("Expected Io error"),
    }
    assert!(error.to_string().contains("missing"));
}

#[test]
fn test_result_type_alias()
{
    fn test_function() -> Result<i32>
    {
        Ok(42)
    }

    fn failing_function() -> Result<i32>
    {
        Err(ConduitError::InvalidHandle)
    }

    assert_eq!(test_function().unwrap(), 42);
    assert!(failing_function().is_err());
}

#[test]
fn test_status_from_errors()
{
    let status = Status::from(ConduitError::InvalidHandle);
    assert_eq!(status.kind(), Some(StatusKind::InvalidHandle));
    assert_eq!(status.message(), Some("invalid file handle"));

    let status = Status::from(ConduitError::Inspection(io::Error::other("inspection failed")));
    assert_eq!(status.kind(), Some(StatusKind::Io));
    assert_eq!(status.message(), Some("inspection failed"));
}

#[test]
fn test_status_into_io_result()
{
    assert!(Status::success().into_io_result().is_ok());

    let err = Status::from_message("nope").into_io_result().unwrap_err();
    assert_eq!(err.to_string(), "nope");
}

#[test]
fn test_handle_errors_map_to_generic_status()
{
    let status = Status::from(ConduitError::HandleInUse);
    assert_eq!(status.kind(), Some(StatusKind::Generic));
    assert_eq!(status.message(), Some("file handle is already in use"));

    let error = ConduitError::MarginTooSmall(2);
    assert_eq!(error.to_string(), "text read margin must be at least 4 bytes, got 2");
}
