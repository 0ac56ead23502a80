use std::cmp::Ordering;
use std::time::SystemTime;

use baton_store::{Record, RecordMeta, SessionKey};

use crate::extract::{extract_activity, extract_branch};

// ── Recency Ranking ──

/// Anything that can be ordered by last write.
pub trait Recency {
    fn session_key(&self) -> &SessionKey;
    fn modified_at(&self) -> SystemTime;
}

impl Recency for Record {
    fn session_key(&self) -> &SessionKey {
        &self.session_key
    }
    fn modified_at(&self) -> SystemTime {
        self.modified_at
    }
}

impl Recency for RecordMeta {
    fn session_key(&self) -> &SessionKey {
        &self.session_key
    }
    fn modified_at(&self) -> SystemTime {
        self.modified_at
    }
}

/// Most recent first; equal timestamps fall back to session key so the
/// order is stable for identical inputs.
fn by_recency<T: Recency>(a: &T, b: &T) -> Ordering {
    b.modified_at()
        .cmp(&a.modified_at())
        .then_with(|| a.session_key().cmp(b.session_key()))
}

/// Sort in place, most recent first.
pub fn rank<T: Recency>(records: &mut [T]) {
    records.sort_by(by_recency);
}

/// Up to `limit` most recent records, excluding `exclude`.
pub fn top_peers<T: Recency>(mut records: Vec<T>, exclude: &SessionKey, limit: usize) -> Vec<T> {
    records.retain(|r| r.session_key() != exclude);
    rank(&mut records);
    records.truncate(limit);
    records
}

// ── Age ──

/// Whole minutes between `modified_at` and `now`. Negative when the record
/// claims to be from the future.
pub fn elapsed_minutes(now: SystemTime, modified_at: SystemTime) -> i64 {
    match now.duration_since(modified_at) {
        Ok(d) => i64::try_from(d.as_secs() / 60).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_secs() / 60).unwrap_or(i64::MAX),
    }
}

/// `"N min ago"` under an hour, whole hours after that.
pub fn format_age(minutes: i64) -> String {
    let minutes = minutes.max(0);
    if minutes < 60 {
        format!("{minutes} min ago")
    } else {
        format!("{}h ago", minutes / 60)
    }
}

// ── Summaries ──

/// Summary of a peer session for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSummary {
    pub session_key: SessionKey,
    pub age_minutes: i64,
    pub activity: Option<String>,
    pub branch: Option<String>,
}

impl PeerSummary {
    pub fn from_record(record: &Record, now: SystemTime) -> Self {
        Self {
            session_key: record.session_key.clone(),
            age_minutes: elapsed_minutes(now, record.modified_at),
            activity: extract_activity(&record.body),
            branch: extract_branch(&record.body),
        }
    }

    pub fn age(&self) -> String {
        format_age(self.age_minutes)
    }
}
