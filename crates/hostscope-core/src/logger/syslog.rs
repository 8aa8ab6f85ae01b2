//! OS-level syslog sink
//!
//! Writes RFC 3164 style datagrams to the local syslog socket. On platforms
//! without Unix domain sockets the sink reports itself unavailable.

use std::path::PathBuf;

use hostscope_api::{ActionLogEntry, LogLevel};

use super::sink::{LogSink, SinkError, SinkMeta};

/// `user` facility
const FACILITY_USER: u8 = 1;

/// Syslog priority value for an entry level
fn priority(level: LogLevel) -> u8 {
    let severity = match level {
        LogLevel::Information => 6,
        LogLevel::Warning => 4,
        LogLevel::Error => 3,
    };
    FACILITY_USER * 8 + severity
}

/// Format one syslog datagram
fn format_datagram(entry: &ActionLogEntry, meta: &SinkMeta) -> String {
    let mut message = format!(
        "<{}>hostscope[{}]: [{}] {}/{}: {}",
        priority(entry.level),
        std::process::id(),
        meta.session_id,
        entry.area,
        entry.action,
        entry.message
    );
    if let Some(ref exception) = entry.exception {
        message.push_str(" | ");
        message.push_str(exception);
    }
    message
}

/// Redundant copy of the action log in the system log
pub struct SyslogSink {
    path: PathBuf,
    #[cfg(unix)]
    socket: Option<std::os::unix::net::UnixDatagram>,
}

impl SyslogSink {
    /// Create a sink writing to the socket at `path` (usually `/dev/log`)
    ///
    /// The socket never blocks. A full receive queue drops the datagram and
    /// reports `WouldBlock`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            #[cfg(unix)]
            socket: std::os::unix::net::UnixDatagram::unbound()
                .and_then(|socket| socket.set_nonblocking(true).map(|()| socket))
                .ok(),
        }
    }
}

impl std::fmt::Debug for SyslogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyslogSink").field("path", &self.path).finish()
    }
}

impl LogSink for SyslogSink {
    fn name(&self) -> &'static str {
        "syslog"
    }

    #[cfg(unix)]
    fn write(&self, entry: &ActionLogEntry, meta: &SinkMeta) -> Result<(), SinkError> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| SinkError::Unavailable("could not create socket".to_string()))?;
        socket.send_to(format_datagram(entry, meta).as_bytes(), &self.path)?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn write(&self, _entry: &ActionLogEntry, _meta: &SinkMeta) -> Result<(), SinkError> {
        Err(SinkError::Unavailable(
            "syslog is only supported on unix".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn entry(level: LogLevel) -> ActionLogEntry {
        ActionLogEntry {
            timestamp_utc: Utc::now(),
            area: "Firewall".to_string(),
            action: "Rules".to_string(),
            level,
            message: "listing rules".to_string(),
            exception: Some("exit status 1".to_string()),
        }
    }

    #[test]
    fn test_priority_values() {
        assert_eq!(priority(LogLevel::Information), 14);
        assert_eq!(priority(LogLevel::Warning), 12);
        assert_eq!(priority(LogLevel::Error), 11);
    }

    #[test]
    fn test_datagram_format() {
        let meta = SinkMeta {
            session_id: Uuid::nil(),
            sequence: 3,
        };
        let datagram = format_datagram(&entry(LogLevel::Error), &meta);
        assert!(datagram.starts_with("<11>hostscope["));
        assert!(datagram.contains("Firewall/Rules: listing rules | exit status 1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_sends_to_socket() {
        use std::os::unix::net::UnixDatagram;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.sock");
        let receiver = UnixDatagram::bind(&path).unwrap();

        let sink = SyslogSink::new(&path);
        let meta = SinkMeta {
            session_id: Uuid::new_v4(),
            sequence: 0,
        };
        sink.write(&entry(LogLevel::Information), &meta).unwrap();

        let mut buf = [0u8; 512];
        let n = receiver.recv(&mut buf).unwrap();
        let received = String::from_utf8_lossy(&buf[..n]);
        assert!(received.starts_with("<14>"));
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_socket_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SyslogSink::new(dir.path().join("absent.sock"));
        let meta = SinkMeta {
            session_id: Uuid::new_v4(),
            sequence: 0,
        };
        assert!(sink.write(&entry(LogLevel::Warning), &meta).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_stalled_receiver_does_not_block_logger() {
        use std::os::unix::net::UnixDatagram;
        use std::sync::mpsc;
        use std::time::Duration;

        use crate::logger::ActionLogger;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.sock");
        let _receiver = UnixDatagram::bind(&path).unwrap();

        let sink = SyslogSink::new(&path);
        let meta = SinkMeta {
            session_id: Uuid::new_v4(),
            sequence: 0,
        };
        let mut dropped = false;
        for _ in 0..1000 {
            if sink.write(&entry(LogLevel::Information), &meta).is_err() {
                dropped = true;
                break;
            }
        }
        assert!(dropped, "queue never filled");

        let logger = ActionLogger::new(vec![Box::new(SyslogSink::new(&path))]);
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for i in 0..1000 {
                logger.info("System", "Collect", format!("entry {i}"));
            }
            tx.send(logger.len()).unwrap();
        });
        let logged = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(logged, 1000);
    }
}
