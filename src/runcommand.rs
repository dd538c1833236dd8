//! External command execution
//!
//! [`CommandRunner`] runs a [`CommandSpec`], logging the command line and
//! (when verbose) every line the child prints, and turns an exit code outside
//! the command's success set into [`Error::ProcessFailed`] once the retry budget
//! is spent. Spawning is delegated to a [`Launcher`] so the retry and
//! directory handling can be exercised without real processes.

use crate::dirscope::with_directory;
use crate::error::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, SyncSender};
use std::thread::JoinHandle;
use std::time::Duration;

/// An environment change applied to a single child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvVar {
    /// Set `name` to `value` in the child's environment
    Set(String, String),
    /// Remove `name` from the child's environment
    Remove(String),
}

impl EnvVar {
    pub fn set(name: impl Into<String>, value: impl Into<String>) -> Self {
        EnvVar::Set(name.into(), value.into())
    }

    pub fn remove(name: impl Into<String>) -> Self {
        EnvVar::Remove(name.into())
    }

    /// Name of the variable this change applies to
    pub fn name(&self) -> &str {
        match self {
            EnvVar::Set(name, _) | EnvVar::Remove(name) => name,
        }
    }
}

/// Description of a command to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    cmdline: Vec<String>,
    success_exit_codes: Vec<i32>,
    retry: u32,
    verbose: bool,
    echo: bool,
    env: Vec<EnvVar>,
}

impl CommandSpec {
    /// Create a spec for `cmdline` (program followed by its arguments).
    ///
    /// Defaults: success exit codes `{0}`, no retry, not verbose, echo on.
    pub fn new<I, S>(cmdline: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec {
            cmdline: cmdline.into_iter().map(Into::into).collect(),
            success_exit_codes: vec![0],
            retry: 0,
            verbose: false,
            echo: true,
            env: Vec::new(),
        }
    }

    pub fn with_success_exit_codes(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.success_exit_codes = codes.into_iter().collect();
        self
    }

    /// Number of additional attempts after a failing run
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    /// Capture the child's output (and log it line by line when echo is on)
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Add an environment change for the child process
    pub fn with_env(mut self, var: EnvVar) -> Self {
        self.env.retain(|existing| existing.name() != var.name());
        self.env.push(var);
        self
    }

    pub fn cmdline(&self) -> &[String] {
        &self.cmdline
    }

    pub fn success_exit_codes(&self) -> &[i32] {
        &self.success_exit_codes
    }

    pub fn retry(&self) -> u32 {
        self.retry
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_echo(&self) -> bool {
        self.echo
    }

    pub fn env(&self) -> &[EnvVar] {
        &self.env
    }

    /// Whether `exit_code` counts as success; a signal-terminated child never does
    pub fn is_success(&self, exit_code: Option<i32>) -> bool {
        exit_code.is_some_and(|code| self.success_exit_codes.contains(&code))
    }

    /// Shell-quoted command line, as logged and reported in errors
    pub fn quoted(&self) -> Result<String> {
        if self.cmdline.is_empty() {
            return Err(Error::InvalidArgument(
                "Specified command line is empty".to_string(),
            ));
        }
        shlex::try_join(self.cmdline.iter().map(String::as_str)).map_err(|e| {
            Error::InvalidArgument(format!("Cannot quote command line {:?}: {}", self.cmdline, e))
        })
    }
}

/// Outcome of a single process launch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Launch {
    /// Exit code, or None when the child was terminated by a signal
    pub exit_code: Option<i32>,
    /// Merged stdout/stderr; empty unless the spec is verbose
    pub output: String,
}

/// Spawns one process for a spec and waits for it
pub trait Launcher {
    /// Run `spec` once. `cmdline` is the quoted form used for diagnostics.
    fn launch(&self, spec: &CommandSpec, cmdline: &str) -> Result<Launch>;
}

/// Result of a command that met its success contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Merged stdout/stderr of the last attempt (empty unless verbose)
    pub output: String,
    /// Exit code of the last attempt
    pub exit_code: i32,
    /// Quoted command line that was executed
    pub cmdline: String,
    /// Number of times the process was started
    pub attempts: u32,
}

/// Executes command specs with logging and retry
pub struct CommandRunner {
    launcher: Box<dyn Launcher>,
}

impl CommandRunner {
    /// Runner backed by real child processes
    pub fn new() -> Self {
        CommandRunner {
            launcher: Box::new(SystemLauncher),
        }
    }

    pub fn with_launcher(launcher: Box<dyn Launcher>) -> Self {
        CommandRunner { launcher }
    }

    /// Run `spec`, optionally inside `working_directory`.
    ///
    /// The working directory is entered once for all attempts and restored
    /// before this returns.
    pub fn run(&self, spec: &CommandSpec, working_directory: Option<&Path>) -> Result<CommandResult> {
        let cmdline = spec.quoted()?;

        with_directory(working_directory, || {
            let mut attempts = 1;
            let mut launch = self.attempt(spec, &cmdline)?;

            while !spec.is_success(launch.exit_code) && attempts <= spec.retry() {
                tracing::warn!(
                    "Retrying ({}/{}) after exit status {:?}",
                    attempts,
                    spec.retry(),
                    launch.exit_code
                );
                launch = self.attempt(spec, &cmdline)?;
                attempts += 1;
            }

            if spec.is_success(launch.exit_code) {
                return Ok(CommandResult {
                    output: launch.output,
                    exit_code: launch.exit_code.unwrap_or_default(),
                    cmdline: cmdline.clone(),
                    attempts,
                });
            }

            match launch.exit_code {
                Some(code) => tracing::error!("Process exited with status {}", code),
                None => tracing::error!("Process was terminated by a signal"),
            }
            Err(Error::ProcessFailed {
                exit_code: launch.exit_code,
                cmdline: cmdline.clone(),
            })
        })
    }

    fn attempt(&self, spec: &CommandSpec, cmdline: &str) -> Result<Launch> {
        tracing::info!("$ {}", cmdline);
        self.launcher.launch(spec, cmdline)
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Launcher that starts real processes through `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, spec: &CommandSpec, cmdline: &str) -> Result<Launch> {
        let (program, args) = spec
            .cmdline()
            .split_first()
            .ok_or_else(|| Error::InvalidArgument("Specified command line is empty".to_string()))?;

        let mut command = Command::new(program);
        command.args(args);
        for var in spec.env() {
            match var {
                EnvVar::Set(name, value) => command.env(name, value),
                EnvVar::Remove(name) => command.env_remove(name),
            };
        }

        if spec.is_verbose() {
            // stderr shares the stdout pipe, so lines arrive in the order
            // the child wrote them
            let (reader, writer) = io::pipe()?;
            command.stdout(writer.try_clone()?).stderr(writer);
            let mut child = command.spawn().map_err(|source| Error::Spawn {
                cmdline: cmdline.to_string(),
                source,
            })?;
            // The write ends held by `command` must close for the reader to see EOF
            drop(command);

            let (tx, rx) = mpsc::sync_channel::<String>(256);
            let reader = spawn_line_reader(reader, tx);

            let mut output = String::new();
            for line in rx {
                if spec.is_echo() {
                    tracing::info!("{}", line.trim_end());
                }
                output.push_str(&line);
            }

            match reader.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("Error reading output of '{}': {}", cmdline, e),
                Err(_) => tracing::warn!("Output reader for '{}' panicked", cmdline),
            }
            let status = child.wait()?;
            return Ok(Launch {
                exit_code: status.code(),
                output,
            });
        }

        command.stdout(Stdio::null()).stderr(Stdio::null());
        let mut child = command.spawn().map_err(|source| Error::Spawn {
            cmdline: cmdline.to_string(),
            source,
        })?;

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {wide_msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(cmdline.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        let status = child.wait();
        spinner.finish_and_clear();

        Ok(Launch {
            exit_code: status?.code(),
            output: String::new(),
        })
    }
}

/// Read `pipe` line by line, forwarding lossily decoded lines to `tx`
fn spawn_line_reader<R: Read + Send + 'static>(
    pipe: R,
    tx: SyncSender<String>,
) -> JoinHandle<std::io::Result<()>> {
    std::thread::spawn(move || -> std::io::Result<()> {
        let mut reader = BufReader::new(pipe);
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buffer).into_owned();
            if tx.send(line).is_err() {
                // Receiver gone; nothing left to forward to
                break;
            }
        }
        Ok(())
    })
}
