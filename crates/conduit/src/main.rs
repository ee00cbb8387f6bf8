use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use conduit_core::file::{stream_ref, OsFile};
use conduit_core::{Debugger, RunOptions, Status};
use conduit_utils::{debug, info, init_logging, init_logging_with_level, LogFormat, LogLevel, Settings};

/// Run debugger commands over redirected input, output and error files.
#[derive(Parser, Debug)]
#[command(name = "conduit")]
#[command(version)]
#[command(about = "Run debugger commands over redirected input, output and error files", long_about = None)]
struct Cli
{
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,
    /// Smallest buffer accepted when reading from a text stream
    #[arg(long, global = true)]
    text_margin: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Read commands from the input file until end of file or `quit`
    Run
    {
        /// Read commands from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
        /// Write command output to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write errors to this file instead of stderr
        #[arg(long)]
        error: Option<PathBuf>,
        /// Stop at the first failing command
        #[arg(long, default_value_t = false)]
        stop_on_error: bool,
        /// Echo each command before running it
        #[arg(long, default_value_t = false)]
        echo: bool,
    },
    /// Run each argument as one command
    Exec
    {
        /// Commands to run, in order
        #[arg(required = true)]
        commands: Vec<String>,
    },
}

fn main()
{
    let cli = Cli::parse();

    let logging = match cli.log_level {
        Some(level) => {
            let format = env::var("CONDUIT_LOG_FORMAT")
                .ok()
                .and_then(|value| LogFormat::from_str(&value).ok())
                .unwrap_or(LogFormat::Pretty);
            init_logging_with_level(level, format)
        }
        None => init_logging(),
    };
    if let Err(e) = logging {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    match run_command(cli) {
        Ok(0) => {}
        Ok(failures) => {
            debug!(failures, "some commands failed");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Run the selected subcommand and return the number of failed commands.
fn run_command(cli: Cli) -> Result<usize, Box<dyn std::error::Error>>
{
    let mut settings = Settings::from_env()?;
    if let Some(margin) = cli.text_margin {
        settings.set_text_read_margin(margin)?;
    }

    let mut debugger = Debugger::with_settings(settings);
    match cli.command {
        Commands::Run {
            input,
            output,
            error,
            stop_on_error,
            echo,
        } => {
            if let Some(path) = input {
                redirect(&path, "r", |file| debugger.set_input_file(file))?;
            }
            if let Some(path) = output {
                redirect(&path, "w", |file| debugger.set_output_file(file))?;
            }
            if let Some(path) = error {
                redirect(&path, "w", |file| debugger.set_error_file(file))?;
            }

            let options = RunOptions {
                stop_on_error,
                echo_commands: echo,
                ..RunOptions::default()
            };
            let result = debugger.run_command_interpreter(&options);
            info!(
                n_errors = result.n_errors,
                quit_requested = result.quit_requested,
                "session finished"
            );
            debugger.destroy();
            Ok(result.n_errors)
        }
        Commands::Exec { commands } => {
            let failures = commands
                .iter()
                .filter(|command| !debugger.handle_command(command).is_success())
                .count();
            debugger.destroy();
            Ok(failures)
        }
    }
}

/// Open `path` and hand it to one of the debugger's `set_*_file` methods.
fn redirect<F>(path: &Path, mode: &str, install: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(conduit_core::StreamRef) -> Status,
{
    let file = OsFile::open(path, mode)?;
    let status = install(stream_ref(file));
    if status.fail() {
        return Err(format!("cannot redirect to {}: {}", path.display(), status).into());
    }
    info!(path = %path.display(), mode, "redirected");
    Ok(())
}
