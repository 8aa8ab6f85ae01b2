//! Append-only tab-separated file sink

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use hostscope_api::ActionLogEntry;

use super::sink::{LogSink, SinkError, SinkMeta};

/// Appends one line per entry to a file
///
/// The file is opened and closed for every line so that everything written
/// before a crash is on disk. Missing parent directories are created on the
/// first failed open.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> std::io::Result<fs::File> {
        let open = || OpenOptions::new().create(true).append(true).open(&self.path);
        match open() {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                open()
            }
            other => other,
        }
    }
}

impl LogSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn write(&self, entry: &ActionLogEntry, _meta: &SinkMeta) -> Result<(), SinkError> {
        let mut file = self.open()?;
        writeln!(file, "{}", entry.to_tsv_line())?;
        file.flush()?;
        Ok(())
    }
}
