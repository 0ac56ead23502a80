mod config;
mod error;
mod namespace;
mod reap;
mod record;

pub use config::{
    config_path, StoreConfig, DEFAULT_MAX_CONTEXT_CHARS, DEFAULT_PEER_LIMIT,
    DEFAULT_RETENTION_HOURS,
};
pub use error::{StoreError, StoreResult};
pub use namespace::{resolve, resolve_cwd, Namespace, NamespaceMode, SessionKey, HOME_NAMESPACE};
pub use reap::{is_expired, ReapReport, DEFAULT_RETENTION};
pub use record::{Record, RecordMeta, Store};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Return the per-user store root.
///
/// `BATON_STORE_DIR` wins; otherwise `<data_dir>/baton`, falling back to
/// `~/.baton` and finally a relative `.baton-store`.
pub fn store_root() -> PathBuf {
    if let Some(dir) = std::env::var_os("BATON_STORE_DIR").filter(|v| !v.is_empty()) {
        PathBuf::from(dir)
    } else if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("baton")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".baton")
    } else {
        PathBuf::from(".baton-store")
    }
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    let parent = path.parent().ok_or_else(|| {
        StoreError::io(
            path,
            std::io::Error::other("record path has no parent directory"),
        )
    })?;
    fs::create_dir_all(parent).map_err(|e| StoreError::unavailable(parent, e))?;
    let mut tmp =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| StoreError::io(parent, e))?;
    tmp.write_all(data).map_err(|e| StoreError::io(path, e))?;
    tmp.flush().map_err(|e| StoreError::io(path, e))?;
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_root_is_not_empty() {
        let root = store_root();
        assert!(!root.as_os_str().is_empty());
    }

    #[test]
    fn write_atomic_creates_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("test.txt");
        write_atomic(&path, b"hello world").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello world");
    }

    #[test]
    fn write_atomic_replaces_and_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.md");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }
}
