//! Project namespaces and session keys.
//!
//! Both are used verbatim as single path segments under the store root, so
//! their constructors reject anything that could escape that root.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Namespace used for sessions started in the user's home directory.
pub const HOME_NAMESPACE: &str = "home";

/// Namespace used for the filesystem root (no final component).
const ROOT_NAMESPACE: &str = "root";

/// Longest accepted session key, leaving room for the `.md` suffix.
const MAX_KEY_LEN: usize = 200;

/// True if `s` is usable as exactly one path segment.
fn is_safe_segment(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\', '\0'])
}

/// A logical partition of the store, one per project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();
        if is_safe_segment(&name) {
            Ok(Self(name))
        } else {
            Err(StoreError::InvalidNamespace(name))
        }
    }

    pub fn home() -> Self {
        Self(HOME_NAMESPACE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of one running session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(String);

impl SessionKey {
    /// Validate a caller-supplied key. Dot-prefixed keys are rejected because
    /// the store reserves them for in-flight temp files.
    pub fn new(key: impl Into<String>) -> StoreResult<Self> {
        let key = key.into();
        if is_safe_segment(&key) && !key.starts_with('.') && key.len() <= MAX_KEY_LEN {
            Ok(Self(key))
        } else {
            Err(StoreError::InvalidSessionKey(key))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 chars, for compact display.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a working directory maps onto a namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceMode {
    /// Final path component only. Unrelated checkouts with the same
    /// directory name share a namespace.
    #[default]
    Basename,
    /// Final path component plus a short hash of the full path.
    Hashed,
}

impl NamespaceMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basename" => Some(Self::Basename),
            "hashed" | "hash" => Some(Self::Hashed),
            _ => None,
        }
    }
}

/// Canonical form when the path exists, otherwise the lexical one
/// (trailing separators and `.` segments dropped). Forward slashes only.
fn normalize_path(path: &Path) -> String {
    let normalized = path
        .canonicalize()
        .unwrap_or_else(|_| path.components().collect::<PathBuf>());
    normalized.to_string_lossy().replace('\\', "/")
}

/// First 8 hex chars of blake3 over the normalized path.
fn short_hash(path: &Path) -> String {
    let hash = blake3::hash(normalize_path(path).as_bytes());
    hash.to_hex()[..8].to_string()
}

/// Derive the namespace for `path`.
///
/// Exact match on `home` yields `home`. Otherwise the final path component,
/// with separator and NUL characters replaced. Paths without a final
/// component resolve to `root` (for `/`) or `path-<hash>`.
pub fn resolve(path: &Path, home: Option<&Path>, mode: NamespaceMode) -> Namespace {
    if home.is_some_and(|h| h == path) {
        return Namespace::home();
    }

    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().replace(['/', '\\', '\0'], "_"))
        .filter(|name| is_safe_segment(name))
        .unwrap_or_else(|| {
            if path.parent().is_none() {
                ROOT_NAMESPACE.to_string()
            } else {
                format!("path-{}", short_hash(path))
            }
        });

    let name = match mode {
        NamespaceMode::Basename => base,
        NamespaceMode::Hashed => format!("{base}-{}", short_hash(path)),
    };
    Namespace(name)
}

/// Resolve a namespace from a hook-supplied cwd string, falling back to the
/// process working directory when it is empty.
pub fn resolve_cwd(cwd: &str, mode: NamespaceMode) -> Namespace {
    let path = if cwd.is_empty() {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        PathBuf::from(cwd)
    };
    let home = dirs::home_dir();
    resolve(&path, home.as_deref(), mode)
}
