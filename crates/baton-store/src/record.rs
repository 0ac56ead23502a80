//! Filesystem-backed record store: `<root>/<namespace>/<session_key>.md`.
//!
//! One file per session key, so concurrent writers never contend. Every scan
//! tolerates files appearing or vanishing mid-iteration.

use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::namespace::{Namespace, SessionKey};
use crate::write_atomic;

const RECORD_EXT: &str = "md";

/// One session's state document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub session_key: SessionKey,
    pub body: String,
    /// Last write time; doubles as the record's version and TTL clock.
    pub modified_at: SystemTime,
}

/// Record identity and timestamp without the body (a single `stat`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMeta {
    pub session_key: SessionKey,
    pub modified_at: SystemTime,
}

/// Handle to a storage root. Cheap to clone; holds no open files.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store at [`crate::store_root`].
    pub fn open_default() -> Self {
        Self::new(crate::store_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn namespace_dir(&self, ns: &Namespace) -> PathBuf {
        self.root.join(ns.as_str())
    }

    pub fn record_path(&self, ns: &Namespace, key: &SessionKey) -> PathBuf {
        self.namespace_dir(ns)
            .join(format!("{}.{RECORD_EXT}", key.as_str()))
    }

    /// Fail with `Unavailable` if the root exists but cannot be used as a
    /// directory. A root that does not exist yet is fine.
    pub fn check_root(&self) -> StoreResult<()> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::unavailable(
                &self.root,
                std::io::Error::other("store root is not a directory"),
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::unavailable(&self.root, e)),
        }
    }

    /// Like [`Store::check_root`], for one namespace directory.
    pub fn check_namespace(&self, ns: &Namespace) -> StoreResult<()> {
        self.check_root()?;
        let dir = self.namespace_dir(ns);
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::unavailable(
                &dir,
                std::io::Error::other("namespace path is not a directory"),
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::unavailable(&dir, e)),
        }
    }

    /// Create or overwrite a record. The namespace directory is created on
    /// demand and the body lands through a temp file + rename.
    pub fn put(&self, ns: &Namespace, key: &SessionKey, body: &str) -> StoreResult<()> {
        let dir = self.namespace_dir(ns);
        fs::create_dir_all(&dir).map_err(|e| StoreError::unavailable(&dir, e))?;
        let path = self.record_path(ns, key);
        write_atomic(&path, body.as_bytes())?;
        debug!(namespace = %ns, session = %key, bytes = body.len(), "record written");
        Ok(())
    }

    /// Read a record. A missing record is `Ok(None)`; bodies that are not
    /// valid UTF-8 are decoded lossily.
    pub fn get(&self, ns: &Namespace, key: &SessionKey) -> StoreResult<Option<Record>> {
        let path = self.record_path(ns, key);
        match read_record(&path) {
            Ok((body, modified_at)) => Ok(Some(Record {
                session_key: key.clone(),
                body,
                modified_at,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Remove a record. Idempotent.
    pub fn delete(&self, ns: &Namespace, key: &SessionKey) -> StoreResult<()> {
        let path = self.record_path(ns, key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Stat every live record in a namespace without reading bodies.
    pub fn list_meta(&self, ns: &Namespace) -> StoreResult<Vec<RecordMeta>> {
        self.check_namespace(ns)?;
        let dir = self.namespace_dir(ns);
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::unavailable(&dir, e)),
        };

        let mut out = Vec::new();
        for entry in entries.flatten() {
            let Some(session_key) = key_from_file_name(&entry.file_name().to_string_lossy())
            else {
                continue;
            };
            // The entry may have been reaped or replaced since read_dir.
            let meta = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    debug!(namespace = %ns, session = %session_key, error = %e, "skipping record");
                    continue;
                }
            };
            let Ok(modified_at) = meta.modified() else {
                continue;
            };
            out.push(RecordMeta {
                session_key,
                modified_at,
            });
        }
        Ok(out)
    }

    /// Read every live record in a namespace. Records that disappear or fail
    /// to read between listing and reading are left out.
    pub fn list(&self, ns: &Namespace) -> StoreResult<Vec<Record>> {
        let metas = self.list_meta(ns)?;
        let mut records = Vec::with_capacity(metas.len());
        for meta in metas {
            match self.get(ns, &meta.session_key) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => debug!(namespace = %ns, error = %e, "skipping unreadable record"),
            }
        }
        Ok(records)
    }

    /// All namespaces currently present under the root.
    pub fn namespaces(&self) -> StoreResult<Vec<Namespace>> {
        self.check_root()?;
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::unavailable(&self.root, e)),
        };
        let mut out: Vec<Namespace> = entries
            .flatten()
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|e| Namespace::new(e.file_name().to_string_lossy().to_string()).ok())
            .collect();
        out.sort();
        Ok(out)
    }
}

/// `<key>.md` → key. Temp files and foreign files yield `None`.
fn key_from_file_name(name: &str) -> Option<SessionKey> {
    let stem = name.strip_suffix(RECORD_EXT)?.strip_suffix('.')?;
    SessionKey::new(stem).ok()
}

/// Body and mtime from one open handle, so both describe the same file even
/// if it is replaced concurrently.
fn read_record(path: &Path) -> std::io::Result<(String, SystemTime)> {
    let mut file = fs::File::open(path)?;
    let modified_at = file.metadata()?.modified()?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    let body = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    Ok((body, modified_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ns(name: &str) -> Namespace {
        Namespace::new(name).unwrap()
    }

    fn key(k: &str) -> SessionKey {
        SessionKey::new(k).unwrap()
    }

    #[test]
    fn put_then_get_returns_body() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(tmp.path());
        let before = SystemTime::now() - Duration::from_secs(1);

        store.put(&ns("proj"), &key("s1"), "hello").unwrap();
        let rec = store.get(&ns("proj"), &key("s1")).unwrap().unwrap();

        assert_eq!(rec.body, "hello");
        assert_eq!(rec.session_key.as_str(), "s1");
        assert!(rec.modified_at >= before);
    }

    #[test]
    fn put_is_idempotent_and_last_write_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(tmp.path());

        store.put(&ns("proj"), &key("s1"), "v1").unwrap();
        store.put(&ns("proj"), &key("s1"), "v1").unwrap();
        store.put(&ns("proj"), &key("s1"), "v2").unwrap();

        let all = store.list(&ns("proj")).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].body, "v2");
    }

    #[test]
    fn get_missing_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(tmp.path());
        assert!(store.get(&ns("proj"), &key("nobody")).unwrap().is_none());
    }

    #[test]
    fn list_missing_namespace_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(tmp.path().join("not-created-yet"));
        assert!(store.list(&ns("proj")).unwrap().is_empty());
        assert!(store.namespaces().unwrap().is_empty());
    }

    #[test]
    fn delete_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(tmp.path());
        store.put(&ns("proj"), &key("s1"), "x").unwrap();

        store.delete(&ns("proj"), &key("s1")).unwrap();
        store.delete(&ns("proj"), &key("s1")).unwrap();
        assert!(store.get(&ns("proj"), &key("s1")).unwrap().is_none());
    }

    #[test]
    fn namespaces_are_isolated() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(tmp.path());
        store.put(&ns("a"), &key("s1"), "in a").unwrap();
        store.put(&ns("b"), &key("s2"), "in b").unwrap();

        let a = store.list(&ns("a")).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].body, "in a");
        assert!(store.get(&ns("a"), &key("s2")).unwrap().is_none());
        assert_eq!(store.namespaces().unwrap(), vec![ns("a"), ns("b")]);
    }

    #[test]
    fn list_ignores_temp_and_foreign_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(tmp.path());
        store.put(&ns("proj"), &key("s1"), "x").unwrap();

        let dir = store.namespace_dir(&ns("proj"));
        fs::write(dir.join(".tmpABC123"), "partial").unwrap();
        fs::write(dir.join("notes.txt"), "other").unwrap();
        fs::write(dir.join(".md"), "no key").unwrap();
        fs::create_dir(dir.join("sub.md")).unwrap();

        let metas = store.list_meta(&ns("proj")).unwrap();
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].session_key.as_str(), "s1");
    }

    #[test]
    fn binary_body_is_read_lossily() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(tmp.path());
        store.put(&ns("proj"), &key("s1"), "seed").unwrap();
        fs::write(store.record_path(&ns("proj"), &key("s1")), [0xff, 0xfe, b'o', b'k']).unwrap();

        let rec = store.get(&ns("proj"), &key("s1")).unwrap().unwrap();
        assert!(rec.body.ends_with("ok"));
    }

    #[test]
    fn root_that_is_a_file_is_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root-file");
        fs::write(&root, "not a dir").unwrap();
        let store = Store::new(&root);

        let err = store.list(&ns("proj")).unwrap_err();
        assert!(err.is_unavailable());
        let err = store.put(&ns("proj"), &key("s1"), "x").unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn namespace_that_is_a_file_is_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(tmp.path());
        fs::write(store.namespace_dir(&ns("proj")), "not a dir").unwrap();

        assert!(store.check_namespace(&ns("proj")).unwrap_err().is_unavailable());
        assert!(store.list_meta(&ns("proj")).unwrap_err().is_unavailable());
        assert!(store.check_namespace(&ns("other")).is_ok());
    }

    #[test]
    fn concurrent_puts_from_distinct_keys_do_not_interfere() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(tmp.path());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let k = SessionKey::new(format!("session-{i}")).unwrap();
                    for round in 0..20 {
                        store
                            .put(&ns("shared"), &k, &format!("body of {i} round {round}"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let records = store.list(&ns("shared")).unwrap();
        assert_eq!(records.len(), 8);
        for rec in records {
            let i = rec.session_key.as_str().strip_prefix("session-").unwrap();
            assert_eq!(rec.body, format!("body of {i} round 19"));
        }
    }
}
