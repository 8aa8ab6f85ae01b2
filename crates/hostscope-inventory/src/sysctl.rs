//! Registry-like reader over the `/proc/sys` tree
//!
//! Keys are directories, values are files. Paths may use `/` or `.` as
//! separator (`net/ipv4` and `net.ipv4` are the same key).

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use hostscope_core::{ReaderError, RegistryReader};
use tokio::fs;

/// Default sysctl root
pub const PROC_SYS: &str = "/proc/sys";

#[derive(Debug, Clone)]
pub struct SysctlRegistry {
    root: PathBuf,
}

impl SysctlRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn key_path(&self, path: &str) -> Result<PathBuf, ReaderError> {
        let relative: PathBuf = path
            .split(['/', '.'])
            .filter(|segment| !segment.is_empty())
            .collect();
        reject_escape(&relative, path)?;
        Ok(self.root.join(relative))
    }

    async fn list(&self, path: &str, want_dirs: bool) -> Result<Vec<String>, ReaderError> {
        let dir = self.key_path(path)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let is_dir = entry.file_type().await?.is_dir();
            if is_dir == want_dirs {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl Default for SysctlRegistry {
    fn default() -> Self {
        Self::new(PROC_SYS)
    }
}

fn reject_escape(relative: &Path, original: &str) -> Result<(), ReaderError> {
    if relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        Ok(())
    } else {
        Err(ReaderError::QueryFailed(format!("invalid key path: {original}")))
    }
}

#[async_trait]
impl RegistryReader for SysctlRegistry {
    async fn get_value(&self, path: &str, name: &str) -> Result<Option<String>, ReaderError> {
        let file = self.key_path(path)?.join(name);
        reject_escape(Path::new(name), name)?;

        match fs::read_to_string(&file).await {
            Ok(value) => Ok(Some(value.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn enumerate_sub_keys(&self, path: &str) -> Result<Vec<String>, ReaderError> {
        self.list(path, true).await
    }

    async fn enumerate_value_names(&self, path: &str) -> Result<Vec<String>, ReaderError> {
        self.list(path, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, SysctlRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let ipv4 = dir.path().join("net/ipv4");
        std::fs::create_dir_all(ipv4.join("conf")).unwrap();
        std::fs::write(ipv4.join("ip_forward"), "1\n").unwrap();
        std::fs::write(ipv4.join("tcp_syncookies"), "1\n").unwrap();
        let registry = SysctlRegistry::new(dir.path());
        (dir, registry)
    }

    #[tokio::test]
    async fn test_get_value_trims() {
        let (_dir, registry) = fixture();
        assert_eq!(
            registry.get_value("net.ipv4", "ip_forward").await.unwrap(),
            Some("1".to_string())
        );
        assert_eq!(
            registry.get_value("net/ipv4", "ip_forward").await.unwrap(),
            Some("1".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_value_is_none() {
        let (_dir, registry) = fixture();
        assert_eq!(registry.get_value("net.ipv6", "forwarding").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_enumeration() {
        let (_dir, registry) = fixture();
        assert_eq!(registry.enumerate_sub_keys("net").await.unwrap(), vec!["ipv4"]);
        assert_eq!(
            registry.enumerate_value_names("net.ipv4").await.unwrap(),
            vec!["ip_forward", "tcp_syncookies"]
        );
        assert_eq!(
            registry.enumerate_sub_keys("net.ipv4").await.unwrap(),
            vec!["conf"]
        );
    }

    #[tokio::test]
    async fn test_parent_escape_rejected() {
        let (_dir, registry) = fixture();
        assert!(registry.get_value("net", "../../etc/passwd").await.is_err());
    }
}
