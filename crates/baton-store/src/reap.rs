//! Time-based retention: records whose mtime is older than `max_age` are
//! deleted. Best effort; a failed delete never aborts the scan.

use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::namespace::{Namespace, SessionKey};
use crate::record::{RecordMeta, Store};

/// Default retention window (48 hours).
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(48 * 60 * 60);

/// Outcome of one reap pass over a namespace.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReapReport {
    pub removed: Vec<SessionKey>,
    /// Expired records that could not be deleted.
    pub failed: usize,
}

impl ReapReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.failed == 0
    }
}

/// True if `modified_at` is strictly older than `now - max_age`.
/// Timestamps in the future are never expired.
pub fn is_expired(modified_at: SystemTime, now: SystemTime, max_age: Duration) -> bool {
    now.duration_since(modified_at)
        .is_ok_and(|age| age > max_age)
}

impl Store {
    /// Delete every record in `ns` older than `max_age`.
    pub fn reap(&self, ns: &Namespace, max_age: Duration) -> ReapReport {
        self.reap_at(ns, max_age, SystemTime::now())
    }

    /// [`Store::reap`] against an explicit clock.
    pub fn reap_at(&self, ns: &Namespace, max_age: Duration, now: SystemTime) -> ReapReport {
        self.reap_with(ns, max_age, now, |key| self.delete(ns, key))
    }

    fn reap_with(
        &self,
        ns: &Namespace,
        max_age: Duration,
        now: SystemTime,
        mut delete: impl FnMut(&SessionKey) -> StoreResult<()>,
    ) -> ReapReport {
        let mut report = ReapReport::default();
        for meta in self.expired_at(ns, max_age, now) {
            match delete(&meta.session_key) {
                Ok(()) => report.removed.push(meta.session_key),
                Err(e) => {
                    warn!(namespace = %ns, error = %e, "failed to reap record");
                    report.failed += 1;
                }
            }
        }
        if !report.is_empty() {
            debug!(
                namespace = %ns,
                removed = report.removed.len(),
                failed = report.failed,
                "reaped expired records"
            );
        }
        report
    }

    /// Records that a reap at `now` would delete. An unreadable namespace
    /// yields nothing.
    pub fn expired_at(&self, ns: &Namespace, max_age: Duration, now: SystemTime) -> Vec<RecordMeta> {
        match self.list_meta(ns) {
            Ok(metas) => metas
                .into_iter()
                .filter(|m| is_expired(m.modified_at, now, max_age))
                .collect(),
            Err(e) => {
                warn!(namespace = %ns, error = %e, "cannot scan namespace for reaping");
                Vec::new()
            }
        }
    }

    /// Reap every namespace under the root. Only the root listing can fail.
    pub fn reap_all(&self, max_age: Duration) -> StoreResult<Vec<(Namespace, ReapReport)>> {
        let now = SystemTime::now();
        let namespaces = self.namespaces()?;
        Ok(namespaces
            .into_iter()
            .map(|ns| {
                let report = self.reap_at(&ns, max_age, now);
                (ns, report)
            })
            .collect())
    }
}
