//! Tracing setup: compact stderr output plus an error log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default error log, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "log.txt";

/// Appends to a file that is only created on first write, so runs
/// without errors leave nothing behind.
#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
    file: Option<File>,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.file = Some(file);
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("error log unavailable"))
    }
}

impl Write for ErrorLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }
}

/// Stderr level from `-v` count and `-q`.
pub fn level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, overrides `level`
/// for stderr. `ERROR` events also go to `log_file`.
pub fn init(level: Level, log_file: impl Into<PathBuf>) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let stderr = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(filter);

    let errors = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(ErrorLog::new(log_file)))
        .with_filter(LevelFilter::ERROR);

    tracing_subscriber::registry()
        .with(stderr)
        .with(errors)
        .init();
}
