//! Session-start context assembly: recovery or awareness read path.

use std::time::SystemTime;

use baton_store::{Namespace, Record, SessionKey, Store, StoreConfig, StoreResult};
use tracing::{debug, warn};

use crate::mode::Mode;
use crate::peers::{top_peers, PeerSummary};
use crate::render;

const SECTION_SEPARATOR: &str = "\n\n";

/// Everything gathered for one invocation, before rendering.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub own: Option<Record>,
    pub peers: Vec<PeerSummary>,
}

impl SessionContext {
    pub fn is_empty(&self) -> bool {
        self.own.is_none() && self.peers.is_empty()
    }

    /// Compose the output block, or `None` when there is nothing to show.
    ///
    /// The peer section is sized first; the own record is truncated to
    /// whatever budget remains.
    pub fn render(&self, ns: &Namespace, budget: usize) -> Option<String> {
        let peers = render::peers_section(ns, &self.peers);
        let reserved = peers
            .as_ref()
            .map_or(0, |p| p.len() + SECTION_SEPARATOR.len());
        let own = self
            .own
            .as_ref()
            .and_then(|r| render::resume_section(&r.body))
            .map(|s| render::apply_budget(&s, budget.saturating_sub(reserved)));

        let sections: Vec<String> = [own, peers].into_iter().flatten().collect();
        if sections.is_empty() {
            return None;
        }
        Some(render::apply_budget(&sections.join(SECTION_SEPARATOR), budget))
    }
}

/// Read the caller's own record; per-record failures read as absent.
fn read_own(store: &Store, ns: &Namespace, session: &SessionKey) -> Option<Record> {
    match store.get(ns, session) {
        Ok(rec) => rec,
        Err(e) => {
            warn!(namespace = %ns, session = %session, error = %e, "own record unreadable");
            None
        }
    }
}

/// Summarize up to `peer_limit` most recent peers.
///
/// Ranking uses `stat` data only; bodies are read for the winners. A peer
/// that vanishes before its body is read is skipped in favour of the next.
fn gather_peers(
    store: &Store,
    cfg: &StoreConfig,
    ns: &Namespace,
    session: &SessionKey,
    now: SystemTime,
) -> StoreResult<Vec<PeerSummary>> {
    let candidates = top_peers(store.list_meta(ns)?, session, usize::MAX);
    let mut peers = Vec::with_capacity(cfg.peer_limit);
    for meta in candidates {
        if peers.len() >= cfg.peer_limit {
            break;
        }
        match store.get(ns, &meta.session_key) {
            Ok(Some(record)) => peers.push(PeerSummary::from_record(&record, now)),
            Ok(None) => debug!(session = %meta.session_key, "peer vanished before read"),
            Err(e) => debug!(session = %meta.session_key, error = %e, "skipping unreadable peer"),
        }
    }
    Ok(peers)
}

/// Gather the context for `session` in `ns` under `mode`.
///
/// Only storage-root problems are errors. Reap failures and unreadable
/// individual records are logged and skipped.
pub fn gather(
    store: &Store,
    cfg: &StoreConfig,
    ns: &Namespace,
    session: &SessionKey,
    mode: Mode,
    now: SystemTime,
) -> StoreResult<SessionContext> {
    store.check_namespace(ns)?;
    store.reap_at(ns, cfg.retention(), now);
    let own = read_own(store, ns, session);

    let peers = match mode {
        Mode::Recovery => Vec::new(),
        Mode::Awareness => gather_peers(store, cfg, ns, session, now)?,
    };
    Ok(SessionContext { own, peers })
}

/// Gather and render in one step.
pub fn assemble(
    store: &Store,
    cfg: &StoreConfig,
    ns: &Namespace,
    session: &SessionKey,
    mode: Mode,
) -> StoreResult<Option<String>> {
    let ctx = gather(store, cfg, ns, session, mode, SystemTime::now())?;
    debug!(
        namespace = %ns,
        %mode,
        own = ctx.own.is_some(),
        peers = ctx.peers.len(),
        "assembled session context"
    );
    Ok(ctx.render(ns, cfg.max_context_chars))
}
