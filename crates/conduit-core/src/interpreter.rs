//! # Command Interpreter
//!
//! A line-oriented command loop over three [`FileHandle`]s.
//!
//! The interpreter knows a small fixed set of built-in commands:
//!
//! | Command | Effect |
//! |---|---|
//! | `help [command]` | list commands, or show one command's help |
//! | `echo <text>` | print `text` |
//! | `version` | print the library version |
//! | `quit` | stop the interactive loop |
//!
//! A command name may be abbreviated to any unique prefix. Anything else is
//! reported on the error stream as `error: '<name>' is not a valid command.`
//!
//! ## Example
//!
//! ```rust
//! use conduit_core::interpreter::CommandInterpreter;
//! use conduit_core::return_object::CommandReturnObject;
//!
//! let mut interpreter = CommandInterpreter::default();
//! let mut ret = CommandReturnObject::new();
//! interpreter.handle_command("help help", &mut ret);
//!
//! assert!(ret.succeeded());
//! assert!(ret.output().contains("Show a list of all debugger commands"));
//! ```

use std::io::{BufRead, BufReader};

use conduit_utils::config::DEFAULT_PROMPT;
use tracing::{debug, info, warn};

use crate::file::FileHandle;
use crate::return_object::{CommandReturnObject, ReturnStatus};

type Handler = fn(&mut CommandInterpreter, &str, &mut CommandReturnObject);

/// A built-in command
#[derive(Debug, Clone, Copy)]
pub struct CommandEntry
{
    /// Full command name
    pub name: &'static str,
    /// One-line description
    pub help: &'static str,
    /// Usage line
    pub syntax: &'static str,
    handler: Handler,
}

const COMMANDS: &[CommandEntry] = &[
    CommandEntry {
        name: "echo",
        help: "Print the arguments back to the output stream.",
        syntax: "echo <text>",
        handler: cmd_echo,
    },
    CommandEntry {
        name: "help",
        help: "Show a list of all debugger commands, or give details about a specific command.",
        syntax: "help [<command>]",
        handler: cmd_help,
    },
    CommandEntry {
        name: "quit",
        help: "Quit the debugger session.",
        syntax: "quit",
        handler: cmd_quit,
    },
    CommandEntry {
        name: "version",
        help: "Show the version of this debugger.",
        syntax: "version",
        handler: cmd_version,
    },
];

/// Options for [`CommandInterpreter::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions
{
    /// Stop at the first command that fails
    pub stop_on_error: bool,
    /// Write each command, after the prompt, to the output stream before running it
    pub echo_commands: bool,
    /// Stream command output and errors to the session's files
    pub print_results: bool,
}

impl Default for RunOptions
{
    fn default() -> Self
    {
        Self {
            stop_on_error: false,
            echo_commands: false,
            print_results: true,
        }
    }
}

/// Outcome of an interactive run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunResult
{
    /// Number of commands that failed
    pub n_errors: usize,
    /// Did a command ask to quit?
    pub quit_requested: bool,
    /// Did a debugged process crash? No process runs under this host, so
    /// this is always `false`.
    pub has_crashed: bool,
}

/// Parses and runs commands
#[derive(Debug, Clone)]
pub struct CommandInterpreter
{
    prompt: String,
    quit_requested: bool,
}

impl Default for CommandInterpreter
{
    fn default() -> Self
    {
        Self::new(DEFAULT_PROMPT)
    }
}

impl CommandInterpreter
{
    /// An interpreter printing `prompt` before each interactive command.
    pub fn new(prompt: impl Into<String>) -> Self
    {
        Self {
            prompt: prompt.into(),
            quit_requested: false,
        }
    }

    /// The interactive prompt.
    #[must_use]
    pub fn prompt(&self) -> &str
    {
        &self.prompt
    }

    /// Change the interactive prompt.
    pub fn set_prompt(&mut self, prompt: impl Into<String>)
    {
        self.prompt = prompt.into();
    }

    /// Has a `quit` command run since the last [`CommandInterpreter::run`]?
    #[must_use]
    pub fn quit_requested(&self) -> bool
    {
        self.quit_requested
    }

    /// All built-in commands, sorted by name.
    #[must_use]
    pub fn commands(&self) -> &'static [CommandEntry]
    {
        COMMANDS
    }

    /// Look up a command by name or unique prefix.
    #[must_use]
    pub fn find_command(&self, name: &str) -> Option<&'static CommandEntry>
    {
        if name.is_empty() {
            return None;
        }
        if let Some(exact) = COMMANDS.iter().find(|c| c.name == name) {
            return Some(exact);
        }
        let mut matches = COMMANDS.iter().filter(|c| c.name.starts_with(name));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// Run one command line, filling `ret` with its output and status.
    ///
    /// Blank lines succeed without doing anything.
    pub fn handle_command(&mut self, line: &str, ret: &mut CommandReturnObject) -> ReturnStatus
    {
        let line = line.trim();
        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim_start()),
            None => (line, ""),
        };

        if name.is_empty() {
            ret.set_status(ReturnStatus::SuccessFinishNoResult);
            return ret.status();
        }

        match self.find_command(name) {
            Some(entry) => {
                debug!(command = entry.name, args, "running command");
                (entry.handler)(self, args, ret);
            }
            None => {
                debug!(command = name, "unknown command");
                ret.append_error(&format!("'{name}' is not a valid command."));
            }
        }
        ret.status()
    }

    /// Read commands from `input` until end of file or `quit`.
    ///
    /// Output goes to `output` and errors to `error` when
    /// [`RunOptions::print_results`] is set. The prompt is only printed when
    /// `input` is a terminal. Both output handles are flushed before
    /// returning.
    pub fn run(&mut self, input: &FileHandle, output: &FileHandle, error: &FileHandle, options: &RunOptions) -> RunResult
    {
        self.quit_requested = false;
        let mut result = RunResult::default();
        let interactive = input.is_interactive();
        let mut reader = BufReader::new(input.clone());
        let mut line = String::new();

        info!(interactive, ?options, "command interpreter started");
        loop {
            if interactive {
                write_text(output, &self.prompt);
                output.flush();
            }

            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "failed to read command input");
                    break;
                }
            }

            let command = line.trim();
            if command.is_empty() {
                continue;
            }
            if options.echo_commands {
                write_text(output, &format!("{}{command}\n", self.prompt));
            }

            let mut ret = CommandReturnObject::new();
            if options.print_results {
                ret.set_immediate_output_handle(output.clone());
                ret.set_immediate_error_handle(error.clone());
            }

            if !self.handle_command(command, &mut ret).is_success() {
                result.n_errors += 1;
                if options.stop_on_error {
                    debug!(command, "stopping on error");
                    break;
                }
            }
            if self.quit_requested {
                break;
            }
        }

        output.flush();
        error.flush();
        result.quit_requested = self.quit_requested;
        info!(
            n_errors = result.n_errors,
            quit_requested = result.quit_requested,
            "command interpreter finished"
        );
        result
    }
}

fn write_text(handle: &FileHandle, text: &str)
{
    if let Err(err) = handle.write_all_bytes(text.as_bytes()) {
        warn!(error = %err, "failed to write to session output");
    }
}

fn cmd_echo(_: &mut CommandInterpreter, args: &str, ret: &mut CommandReturnObject)
{
    ret.append_message(args);
    ret.set_status(ReturnStatus::SuccessFinishResult);
}

fn cmd_help(interpreter: &mut CommandInterpreter, args: &str, ret: &mut CommandReturnObject)
{
    if args.is_empty() {
        ret.append_message("Debugger commands:");
        let width = COMMANDS.iter().map(|c| c.name.len()).max().unwrap_or(0);
        for entry in COMMANDS {
            ret.append_message(&format!("  {:<width$} -- {}", entry.name, entry.help));
        }
        ret.set_status(ReturnStatus::SuccessFinishResult);
        return;
    }

    let name = args.split_whitespace().next().unwrap_or(args);
    match interpreter.find_command(name) {
        Some(entry) => {
            ret.append_message(entry.help);
            ret.append_message("");
            ret.append_message(&format!("Syntax: {}", entry.syntax));
            ret.set_status(ReturnStatus::SuccessFinishResult);
        }
        None => ret.append_error(&format!("'{name}' is not a known command.")),
    }
}

fn cmd_quit(interpreter: &mut CommandInterpreter, _: &str, ret: &mut CommandReturnObject)
{
    interpreter.quit_requested = true;
    ret.set_status(ReturnStatus::Quit);
}

fn cmd_version(_: &mut CommandInterpreter, _: &str, ret: &mut CommandReturnObject)
{
    ret.append_message(&format!("conduit version {}", env!("CARGO_PKG_VERSION")));
    ret.set_status(ReturnStatus::SuccessFinishResult);
}
