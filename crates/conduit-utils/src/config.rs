//! # Configuration
//!
//! Runtime settings shared by the debugger session and the CLI.
//!
//! Values come from [`Settings::default`] and may be overridden through the
//! environment with [`Settings::from_env`]. The CLI layers its own flags on
//! top of whatever this returns.
//!
//! ## Environment Variables
//!
//! - `CONDUIT_TEXT_READ_MARGIN`: minimum buffer size, in bytes, accepted when
//!   reading from a text stream (default: `6`, at least `4`)
//! - `CONDUIT_PROMPT`: prompt printed before each interactive command (default: `(conduit) `)
//! - `CONDUIT_ECHO_COMMANDS`: echo each command read from the input file (`true`/`false`)

use std::env;

/// Worst-case number of bytes a UTF-8 encoder may need to hand back one
/// character, counting the round-trip slack of surrogate-escaping codecs.
pub const DEFAULT_TEXT_READ_MARGIN: usize = 6;

/// Smallest accepted text read margin: the widest UTF-8 encoding of one
/// character. With a smaller margin one character could overflow the buffer.
pub const MIN_TEXT_READ_MARGIN: usize = 4;

/// Default interactive prompt
pub const DEFAULT_PROMPT: &str = "(conduit) ";

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings
{
    /// Smallest read buffer accepted for text-mode streams.
    ///
    /// A text stream can only hand out whole characters, so a read asks for
    /// `buffer.len() / text_read_margin` characters. Buffers smaller than the
    /// margin fail instead of truncating a character.
    pub text_read_margin: usize,
    /// Prompt written before each command when the interpreter is interactive.
    pub prompt: String,
    /// Echo commands read from a non-interactive input.
    pub echo_commands: bool,
}

impl Default for Settings
{
    fn default() -> Self
    {
        Self {
            text_read_margin: DEFAULT_TEXT_READ_MARGIN,
            prompt: DEFAULT_PROMPT.to_string(),
            echo_commands: false,
        }
    }
}

impl Settings
{
    /// Build settings from defaults plus any `CONDUIT_*` overrides.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to a value that does not
    /// parse, or when the text read margin is zero.
    pub fn from_env() -> Result<Self, ConfigError>
    {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] with an arbitrary variable source.
    ///
    /// ## Errors
    ///
    /// See [`Settings::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(raw) = lookup("CONDUIT_TEXT_READ_MARGIN") {
            let margin = raw.trim().parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                key: "CONDUIT_TEXT_READ_MARGIN",
                value: raw.clone(),
            })?;
            settings.set_text_read_margin(margin)?;
        }

        if let Some(prompt) = lookup("CONDUIT_PROMPT") {
            settings.prompt = prompt;
        }

        if let Some(raw) = lookup("CONDUIT_ECHO_COMMANDS") {
            settings.echo_commands = parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                key: "CONDUIT_ECHO_COMMANDS",
                value: raw,
            })?;
        }

        Ok(settings)
    }

    /// Change the text read margin.
    ///
    /// ## Errors
    ///
    /// [`ConfigError::TextReadMarginTooSmall`] if `margin` is below
    /// [`MIN_TEXT_READ_MARGIN`].
    pub fn set_text_read_margin(&mut self, margin: usize) -> Result<(), ConfigError>
    {
        if margin < MIN_TEXT_READ_MARGIN {
            return Err(ConfigError::TextReadMarginTooSmall(margin));
        }
        self.text_read_margin = margin;
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool>
{
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError
{
    /// A variable held a value that does not parse
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue
    {
        /// Variable name
        key: &'static str,
        /// Raw value found
        value: String,
    },

    /// The margin cannot hold one UTF-8 character
    #[error("Text read margin must be at least {min} bytes, got {0}", min = MIN_TEXT_READ_MARGIN)]
    TextReadMarginTooSmall(usize),
}

#[cfg(test)]
mod tests
{
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String>
    {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults()
    {
        let settings = Settings::default();
        assert_eq!(settings.text_read_margin, 6);
        assert_eq!(settings.prompt, "(conduit) ");
        assert!(!settings.echo_commands);
    }

    #[test]
    fn test_overrides()
    {
        let settings = Settings::from_lookup(lookup_from(&[
            ("CONDUIT_TEXT_READ_MARGIN", "4"),
            ("CONDUIT_PROMPT", "> "),
            ("CONDUIT_ECHO_COMMANDS", "yes"),
        ]))
        .unwrap();

        assert_eq!(settings.text_read_margin, 4);
        assert_eq!(settings.prompt, "> ");
        assert!(settings.echo_commands);
    }

    #[test]
    fn test_invalid_margin()
    {
        let err = Settings::from_lookup(lookup_from(&[("CONDUIT_TEXT_READ_MARGIN", "six")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "CONDUIT_TEXT_READ_MARGIN", .. }));

        let err = Settings::from_lookup(lookup_from(&[("CONDUIT_TEXT_READ_MARGIN", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::TextReadMarginTooSmall(0));

        let err = Settings::from_lookup(lookup_from(&[("CONDUIT_TEXT_READ_MARGIN", "3")])).unwrap_err();
        assert_eq!(err, ConfigError::TextReadMarginTooSmall(3));
        assert_eq!(err.to_string(), "Text read margin must be at least 4 bytes, got 3");
    }

    #[test]
    fn test_invalid_bool()
    {
        let err = Settings::from_lookup(lookup_from(&[("CONDUIT_ECHO_COMMANDS", "maybe")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for CONDUIT_ECHO_COMMANDS: \"maybe\"");
    }
}
