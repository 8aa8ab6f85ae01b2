//! Log reader over plain-text files in `/var/log`

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hostscope_core::{LogReader, LogSummary, ReaderError};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Default log directory
pub const VAR_LOG: &str = "/var/log";

/// Summarizes line-oriented log files; one line counts as one record
#[derive(Debug, Clone)]
pub struct VarLogReader {
    root: PathBuf,
}

impl VarLogReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for VarLogReader {
    fn default() -> Self {
        Self::new(VAR_LOG)
    }
}

async fn count_lines(file: &mut File) -> std::io::Result<u64> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut lines = 0u64;
    let mut last = b'\n';
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        lines += buf[..n].iter().filter(|b| **b == b'\n').count() as u64;
        last = buf[n - 1];
    }
    // unterminated last line
    if last != b'\n' {
        lines += 1;
    }
    Ok(lines)
}

#[async_trait]
impl LogReader for VarLogReader {
    async fn summary(&self, log_name: &str) -> Result<Option<LogSummary>, ReaderError> {
        let relative = Path::new(log_name);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(ReaderError::QueryFailed(format!("invalid log name: {log_name}")));
        }

        let mut file = match File::open(self.root.join(relative)).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let metadata = file.metadata().await?;
        let last_write_time_utc = metadata.modified().ok().map(DateTime::<Utc>::from);
        let count = count_lines(&mut file).await?;

        Ok(Some(LogSummary {
            count,
            last_write_time_utc,
        }))
    }
}
