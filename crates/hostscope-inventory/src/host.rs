//! Host reader for the local Linux machine

use std::fs;

use hostscope_core::HostReader;

/// Snapshot of the local host identity, taken once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalHost {
    machine_name: String,
    os_version: String,
    bitness: u32,
    user_name: String,
    privileged: bool,
}

impl LocalHost {
    pub fn new(
        machine_name: impl Into<String>,
        os_version: impl Into<String>,
        bitness: u32,
        user_name: impl Into<String>,
        privileged: bool,
    ) -> Self {
        Self {
            machine_name: machine_name.into(),
            os_version: os_version.into(),
            bitness,
            user_name: user_name.into(),
            privileged,
        }
    }

    /// Read identity from procfs, `/etc/os-release` and the environment
    pub fn detect() -> Self {
        let machine_name = fs::read_to_string("/proc/sys/kernel/hostname")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| std::env::var("HOSTNAME").ok())
            .unwrap_or_else(|| "localhost".to_string());

        let os_version = fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|content| pretty_name(&content))
            .unwrap_or_else(|| std::env::consts::OS.to_string());

        let user_name = std::env::var("USER")
            .or_else(|_| std::env::var("LOGNAME"))
            .unwrap_or_else(|_| "unknown".to_string());

        let privileged = fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|status| effective_uid(&status))
            .is_some_and(|uid| uid == 0);

        Self::new(machine_name, os_version, pointer_width(), user_name, privileged)
    }
}

const fn pointer_width() -> u32 {
    if cfg!(target_pointer_width = "64") {
        64
    } else if cfg!(target_pointer_width = "16") {
        16
    } else {
        32
    }
}

/// `PRETTY_NAME` from an os-release file
fn pretty_name(os_release: &str) -> Option<String> {
    os_release.lines().find_map(|line| {
        line.strip_prefix("PRETTY_NAME=")
            .map(|v| v.trim().trim_matches('"').to_string())
    })
}

/// Effective uid from `/proc/self/status` (`Uid: real effective saved fs`)
fn effective_uid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))
        .and_then(|ids| ids.split_whitespace().nth(1))
        .and_then(|euid| euid.parse().ok())
}

impl HostReader for LocalHost {
    fn machine_name(&self) -> String {
        self.machine_name.clone()
    }

    fn os_version(&self) -> String {
        self.os_version.clone()
    }

    fn bitness(&self) -> u32 {
        self.bitness
    }

    fn user_name(&self) -> String {
        self.user_name.clone()
    }

    fn is_privileged(&self) -> bool {
        self.privileged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_name() {
        let release = "NAME=\"Debian GNU/Linux\"\n\
            PRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"\n\
            ID=debian\n";
        assert_eq!(
            pretty_name(release),
            Some("Debian GNU/Linux 12 (bookworm)".to_string())
        );
        assert_eq!(pretty_name("ID=alpine\n"), None);
    }

    #[test]
    fn test_effective_uid() {
        let status = "Name:\tbash\nUid:\t1000\t0\t0\t0\nGid:\t1000\t1000\t1000\t1000\n";
        assert_eq!(effective_uid(status), Some(0));
        assert_eq!(effective_uid("Name:\tbash\n"), None);
    }

    #[test]
    fn test_detect_is_populated() {
        let host = LocalHost::detect();
        assert!(!host.machine_name().is_empty());
        assert!(!host.os_version().is_empty());
        assert!(matches!(host.bitness(), 16 | 32 | 64));
    }
}
