//! Store-level settings: env var → `<root>/config.json` → default.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::namespace::NamespaceMode;

pub const DEFAULT_RETENTION_HOURS: u64 = 48;
pub const DEFAULT_PEER_LIMIT: usize = 3;
/// Default max context chars (~2000 tokens).
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 8000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub retention_hours: u64,
    pub peer_limit: usize,
    pub max_context_chars: usize,
    pub namespace_mode: NamespaceMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            retention_hours: DEFAULT_RETENTION_HOURS,
            peer_limit: DEFAULT_PEER_LIMIT,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            namespace_mode: NamespaceMode::Basename,
        }
    }
}

/// `<root>/config.json`
pub fn config_path(root: &Path) -> PathBuf {
    root.join("config.json")
}

impl StoreConfig {
    /// Field names as they appear in `config.json`.
    pub const KEYS: &'static [&'static str] = &[
        "retention_hours",
        "peer_limit",
        "max_context_chars",
        "namespace_mode",
    ];

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours.saturating_mul(3600))
    }

    /// Read `config.json` under `root`. Missing file → defaults; malformed
    /// file → `StoreError::Config`.
    pub fn load(root: &Path) -> StoreResult<Self> {
        let path = config_path(root);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        serde_json::from_str(&content).map_err(|e| StoreError::Config {
            path,
            details: e.to_string(),
        })
    }

    /// Config file plus process env overrides. Never fails; a bad file is
    /// logged and replaced by defaults.
    pub fn resolve(root: &Path) -> Self {
        let base = Self::load(root).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring store config");
            Self::default()
        });
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `BATON_*` overrides from `lookup`. Unparseable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(v: Option<String>) -> Option<T> {
            v.and_then(|s| s.trim().parse().ok())
        }
        if let Some(h) = parsed(lookup("BATON_RETENTION_HOURS")) {
            self.retention_hours = h;
        }
        if let Some(n) = parsed(lookup("BATON_PEER_LIMIT")) {
            self.peer_limit = n;
        }
        if let Some(n) = parsed(lookup("BATON_MAX_CONTEXT_CHARS")) {
            self.max_context_chars = n;
        }
        if let Some(mode) = lookup("BATON_NAMESPACE_MODE").and_then(|v| NamespaceMode::parse(&v)) {
            self.namespace_mode = mode;
        }
        self
    }
}
