//! Logging configuration
//!
//! Every run logs to two sinks: the console (stderr) and a per-run log file
//! under `<output>/logs`. The console shows INFO and above when verbose and
//! only warnings otherwise; the file always receives INFO and above.

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    filter::LevelFilter, fmt, fmt::time::ChronoLocal, layer::SubscriberExt,
    util::SubscriberInitExt, Layer,
};

const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Tracks whether logging has been set up for this process
///
/// Created once in `main` and handed to whoever needs to initialise
/// logging; initialisation after the first successful call is a no-op.
#[derive(Debug, Default)]
pub struct LoggingContext {
    initialized: bool,
    log_file: Option<PathBuf>,
}

impl LoggingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Log file of this run, once initialised
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Install the console and file sinks, returning the log file path
    pub fn init(&mut self, verbose: bool, log_dir: &Path) -> Result<PathBuf> {
        if let Some(path) = &self.log_file {
            return Ok(path.clone());
        }

        let launched = Local::now();
        fs::create_dir_all(log_dir)?;
        let file_name = log_file_name(launched, &program_name(), std::process::id());
        let file_appender = tracing_appender::rolling::never(log_dir, &file_name);

        let console_level = if verbose {
            LevelFilter::INFO
        } else {
            LevelFilter::WARN
        };

        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
            .with_target(false)
            .with_filter(console_level);

        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
            .with_target(false)
            .with_filter(LevelFilter::INFO);

        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| Error::Logging(e.to_string()))?;

        let log_file = log_dir.join(file_name);
        self.initialized = true;
        self.log_file = Some(log_file.clone());

        let start_msg = format!("Initializing logger {}", launched.format(TIME_FORMAT));
        tracing::info!("{}", "-".repeat(start_msg.len()));
        tracing::info!("{}", start_msg);
        tracing::info!("{}", "-".repeat(start_msg.len()));

        Ok(log_file)
    }
}

fn program_name() -> String {
    program_name_from(std::env::args_os().next().as_deref())
}

/// File stem of `argv[0]`, which need not be valid UTF-8
fn program_name_from(arg0: Option<&OsStr>) -> String {
    arg0.map(Path::new)
        .and_then(Path::file_stem)
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "gcit".to_string())
}

/// `<YYYYmmddHHMMSS>-<program>-pid<pid>.log`
pub fn log_file_name(launched: DateTime<Local>, program: &str, pid: u32) -> String {
    format!(
        "{}-{}-pid{}.log",
        launched.format("%Y%m%d%H%M%S"),
        program,
        pid
    )
}
