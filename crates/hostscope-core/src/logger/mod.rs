//! Multi-sink action logger
//!
//! Every diagnostic event of a run goes through [`ActionLogger`]. Under one
//! mutex the entry is appended to the in-memory log, the area's rolling
//! sequence number is advanced and the entry is handed to each sink. Sinks
//! are isolated from each other and from the caller: an error or a panic in a
//! sink is swallowed, so logging can never fail a run.

mod events;
mod file;
mod sink;
mod syslog;
mod trace;

use std::collections::HashMap;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use hostscope_api::{ActionLogEntry, LogLevel};
use tracing::debug;
use uuid::Uuid;

use crate::config::SinkConfig;

pub use events::{AreaCodes, EventSink};
pub use file::FileSink;
pub use sink::{LogSink, SinkError, SinkMeta};
pub use syslog::SyslogSink;
pub use trace::TraceSink;

/// Sequence numbers wrap at this value
pub const SEQUENCE_MODULUS: u8 = 100;

#[derive(Default)]
struct LoggerState {
    entries: Vec<ActionLogEntry>,
    /// Next sequence number per lowercased area
    sequences: HashMap<String, u8>,
}

/// Fan-out logger owning a fixed list of sinks
pub struct ActionLogger {
    session_id: Uuid,
    state: Mutex<LoggerState>,
    sinks: Vec<Box<dyn LogSink>>,
}

impl ActionLogger {
    /// Create a logger for a new session with the given sinks
    #[must_use]
    pub fn new(sinks: Vec<Box<dyn LogSink>>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: Mutex::new(LoggerState::default()),
            sinks,
        }
    }

    /// Logger that only keeps the in-memory record
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Vec::new())
    }

    /// Build the standard sink list from `config`
    ///
    /// Order is fixed: trace, file, events, syslog.
    #[must_use]
    pub fn from_config(config: &SinkConfig, codes: AreaCodes) -> Self {
        let mut sinks: Vec<Box<dyn LogSink>> = Vec::new();
        if config.trace {
            sinks.push(Box::new(TraceSink));
        }
        if let Some(ref path) = config.action_log_file {
            sinks.push(Box::new(FileSink::new(path.clone())));
        }
        if config.events {
            sinks.push(Box::new(EventSink::new(codes)));
        }
        if config.syslog {
            sinks.push(Box::new(SyslogSink::new(config.syslog_socket.clone())));
        }
        Self::new(sinks)
    }

    /// Correlation id of this session
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn info(&self, area: &str, action: &str, message: impl Into<String>) {
        self.log(LogLevel::Information, area, action, message.into(), None);
    }

    pub fn warn(&self, area: &str, action: &str, message: impl Into<String>) {
        self.log(LogLevel::Warning, area, action, message.into(), None);
    }

    pub fn error(&self, area: &str, action: &str, message: impl Into<String>, error: &dyn Display) {
        self.log(
            LogLevel::Error,
            area,
            action,
            message.into(),
            Some(error.to_string()),
        );
    }

    /// Record an entry and dispatch it to every sink
    pub fn log(
        &self,
        level: LogLevel,
        area: &str,
        action: &str,
        message: String,
        exception: Option<String>,
    ) {
        let entry = ActionLogEntry {
            timestamp_utc: Utc::now(),
            area: area.to_string(),
            action: action.to_string(),
            level,
            message,
            exception,
        };

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.entries.push(entry.clone());

        let counter = state.sequences.entry(area.to_lowercase()).or_insert(0);
        let sequence = *counter;
        *counter = (sequence + 1) % SEQUENCE_MODULUS;

        let meta = SinkMeta {
            session_id: self.session_id,
            sequence,
        };
        for sink in &self.sinks {
            dispatch(sink.as_ref(), &entry, &meta);
        }
    }

    /// Copy of every entry recorded so far
    #[must_use]
    pub fn snapshot(&self) -> Vec<ActionLogEntry> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clone()
    }

    /// Number of entries recorded so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ActionLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionLogger")
            .field("session_id", &self.session_id)
            .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn dispatch(sink: &dyn LogSink, entry: &ActionLogEntry, meta: &SinkMeta) {
    match panic::catch_unwind(AssertUnwindSafe(|| sink.write(entry, meta))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(sink = sink.name(), error = %e, "action log sink failed"),
        Err(_) => debug!(sink = sink.name(), "action log sink panicked"),
    }
}
