use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::Config;

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
const FILE_BUFFER_CAPACITY: usize = 65536;

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Line logger writing `[PREFIX] timestamp message`.
///
/// Clones and loggers derived with [`Logger::with_prefix`] share the same
/// sink, so worker threads can log without interleaving partial lines.
#[derive(Clone)]
pub struct Logger {
    prefix: String,
    sink: Sink,
}

impl Logger {
    pub fn stdout(prefix: &str) -> Self {
        Self::to_writer(prefix, io::stdout())
    }

    /// Appends to `path`, creating it if needed.
    pub fn file(prefix: &str, path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::to_writer(
            prefix,
            BufWriter::with_capacity(FILE_BUFFER_CAPACITY, file),
        ))
    }

    pub fn to_writer(prefix: &str, writer: impl Write + Send + 'static) -> Self {
        Logger {
            prefix: prefix.to_string(),
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Logs to `LOG_FILE` when configured, stdout otherwise.
    pub fn from_config(config: &Config, prefix: &str) -> io::Result<Self> {
        match &config.log_file {
            Some(path) => Self::file(prefix, path),
            None => Ok(Self::stdout(prefix)),
        }
    }

    pub fn with_prefix(&self, prefix: &str) -> Self {
        Logger {
            prefix: prefix.to_string(),
            sink: Arc::clone(&self.sink),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn log(&self, message: &str) {
        let line = format_line(&self.prefix, &Local::now(), message);
        let written = match self.sink.lock() {
            Ok(mut w) => w.write_all(line.as_bytes()).and_then(|_| w.flush()),
            Err(_) => Err(io::Error::new(io::ErrorKind::Other, "log sink poisoned")),
        };
        if let Err(e) = written {
            eprintln!("[{}] ✗ Log write error: {}", self.prefix, e);
        }
    }
}

pub fn format_line(prefix: &str, timestamp: &DateTime<Local>, message: &str) -> String {
    format!(
        "[{}] {} {}\n",
        prefix,
        timestamp.format(TIMESTAMP_FORMAT),
        message
    )
}
