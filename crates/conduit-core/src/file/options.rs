//! Open options and `fopen`-style mode strings.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::{ConduitError, Result};

bitflags! {
    /// How a file handle may be used.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OpenOptions: u32 {
        /// Open for reading
        const READ = 1 << 0;
        /// Open for writing
        const WRITE = 1 << 1;
        /// Writes go to the end of the file
        const APPEND = 1 << 2;
        /// Truncate on open
        const TRUNCATE = 1 << 3;
        /// Non-blocking reads
        const NON_BLOCKING = 1 << 4;
        /// Create the file if missing
        const CAN_CREATE = 1 << 5;
        /// Create the file, failing if it already exists
        const CAN_CREATE_NEW_ONLY = 1 << 6;
        /// Do not follow a trailing symlink
        const DONT_FOLLOW_SYMLINKS = 1 << 7;
        /// Close the descriptor across `exec`
        const CLOSE_ON_EXEC = 1 << 8;
    }
}

impl OpenOptions
{
    /// Parse an `fopen`-style mode string.
    ///
    /// Accepts `r`, `w`, `a`, each optionally followed by `+`, with a `b`
    /// anywhere after the first character. `x` (exclusive create) and `e`
    /// (close-on-exec) modifiers are honoured.
    ///
    /// ```rust
    /// use conduit_core::file::OpenOptions;
    ///
    /// let options = OpenOptions::from_mode("r+b").unwrap();
    /// assert!(options.is_readable() && options.is_writable());
    /// assert!(OpenOptions::from_mode("q").is_err());
    /// ```
    ///
    /// ## Errors
    ///
    /// [`ConduitError::InvalidMode`] for anything else.
    pub fn from_mode(mode: &str) -> Result<Self>
    {
        let invalid = || ConduitError::InvalidMode(mode.to_string());

        let mut chars = mode.chars();
        let mut options = match chars.next() {
            Some('r') => Self::READ,
            Some('w') => Self::WRITE | Self::CAN_CREATE | Self::TRUNCATE,
            Some('a') => Self::WRITE | Self::APPEND | Self::CAN_CREATE,
            _ => return Err(invalid()),
        };

        let mut seen_plus = false;
        let mut seen_binary = false;
        for c in chars {
            match c {
                '+' if !seen_plus => {
                    seen_plus = true;
                    options |= Self::READ | Self::WRITE;
                }
                'b' if !seen_binary => seen_binary = true,
                'x' if options.contains(Self::CAN_CREATE) && !options.contains(Self::APPEND) => {
                    options |= Self::CAN_CREATE_NEW_ONLY;
                }
                'e' => options |= Self::CLOSE_ON_EXEC,
                _ => return Err(invalid()),
            }
        }

        Ok(options)
    }

    /// Derive options from the `fcntl(F_GETFL)` status flags of a descriptor.
    #[must_use]
    pub fn from_status_flags(flags: libc::c_int) -> Self
    {
        let mut options = match flags & libc::O_ACCMODE {
            libc::O_RDONLY => Self::READ,
            libc::O_WRONLY => Self::WRITE,
            libc::O_RDWR => Self::READ | Self::WRITE,
            _ => Self::empty(),
        };
        if flags & libc::O_APPEND != 0 {
            options |= Self::APPEND;
        }
        if flags & libc::O_NONBLOCK != 0 {
            options |= Self::NON_BLOCKING;
        }
        options
    }

    /// Readable handle?
    #[must_use]
    pub fn is_readable(self) -> bool
    {
        self.contains(Self::READ)
    }

    /// Writable handle?
    #[must_use]
    pub fn is_writable(self) -> bool
    {
        self.contains(Self::WRITE)
    }

    /// The shortest mode string describing the access part of these options.
    ///
    /// Returns `None` when the options grant neither read nor write.
    #[must_use]
    pub fn mode(self) -> Option<&'static str>
    {
        let rw = self.is_readable() && self.is_writable();
        if self.contains(Self::APPEND) {
            return Some(if rw { "a+" } else { "a" });
        }
        match (self.is_readable(), self.is_writable()) {
            (true, true) if self.contains(Self::TRUNCATE) => Some("w+"),
            (true, true) => Some("r+"),
            (true, false) => Some("r"),
            (false, true) => Some("w"),
            (false, false) => None,
        }
    }
}

impl FromStr for OpenOptions
{
    type Err = ConduitError;

    fn from_str(s: &str) -> Result<Self>
    {
        Self::from_mode(s)
    }
}

impl fmt::Display for OpenOptions
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.mode().unwrap_or("-"))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_basic_modes()
    {
        assert_eq!(OpenOptions::from_mode("r").unwrap(), OpenOptions::READ);
        assert_eq!(
            OpenOptions::from_mode("w").unwrap(),
            OpenOptions::WRITE | OpenOptions::CAN_CREATE | OpenOptions::TRUNCATE
        );
        assert_eq!(
            OpenOptions::from_mode("ab").unwrap(),
            OpenOptions::WRITE | OpenOptions::APPEND | OpenOptions::CAN_CREATE
        );
    }

    #[test]
    fn test_plus_modes()
    {
        for mode in ["r+", "rb+", "r+b"] {
            let options = OpenOptions::from_mode(mode).unwrap();
            assert_eq!(options, OpenOptions::READ | OpenOptions::WRITE, "mode {mode}");
        }
        let options = OpenOptions::from_mode("w+").unwrap();
        assert!(options.is_readable());
        assert!(options.contains(OpenOptions::TRUNCATE));
    }

    #[test]
    fn test_modifiers()
    {
        assert!(OpenOptions::from_mode("wx").unwrap().contains(OpenOptions::CAN_CREATE_NEW_ONLY));
        assert!(OpenOptions::from_mode("re").unwrap().contains(OpenOptions::CLOSE_ON_EXEC));
        assert!(OpenOptions::from_mode("rx").is_err());
    }

    #[test]
    fn test_invalid_modes()
    {
        for mode in ["", "q", "rr", "r++", "wbb", "+r"] {
            assert!(
                matches!(OpenOptions::from_mode(mode), Err(ConduitError::InvalidMode(_))),
                "mode {mode:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_status_flags()
    {
        assert_eq!(OpenOptions::from_status_flags(libc::O_RDONLY), OpenOptions::READ);
        assert_eq!(OpenOptions::from_status_flags(libc::O_WRONLY | libc::O_APPEND).mode(), Some("a"));
        assert_eq!(OpenOptions::from_status_flags(libc::O_RDWR).mode(), Some("r+"));
    }

    #[test]
    fn test_mode_string_round_trip()
    {
        for mode in ["r", "w", "a", "r+", "w+", "a+"] {
            assert_eq!(OpenOptions::from_mode(mode).unwrap().to_string(), mode);
        }
    }
}
