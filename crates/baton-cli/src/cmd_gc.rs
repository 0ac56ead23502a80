use std::path::Path;
use std::time::{Duration, SystemTime};

use baton_store::{resolve_cwd, Namespace, SessionKey, Store, StoreConfig};

pub struct GcParams<'a> {
    pub cwd: &'a Path,
    pub max_age_hours: Option<u64>,
    pub all: bool,
    pub dry_run: bool,
}

/// What one gc pass did (or, for a dry run, would do).
#[derive(Debug, Default)]
pub struct GcOutcome {
    pub namespaces: usize,
    pub expired: Vec<(Namespace, SessionKey)>,
    pub failed: usize,
}

pub fn execute(params: &GcParams) -> anyhow::Result<()> {
    let store = Store::open_default();
    let cfg = StoreConfig::resolve(store.root());
    let max_age = max_age(params, &cfg);
    let outcome = collect(&store, &cfg, params, SystemTime::now())?;

    if params.dry_run {
        for (ns, key) in &outcome.expired {
            println!("[dry-run] would remove {ns}/{key}");
        }
        println!(
            "[dry-run] {} record(s) older than {}h",
            outcome.expired.len(),
            max_age.as_secs() / 3600
        );
        return Ok(());
    }

    for (ns, key) in &outcome.expired {
        println!("removed {ns}/{key}");
    }
    println!(
        "Done: {} removed, {} failed across {} namespace(s).",
        outcome.expired.len(),
        outcome.failed,
        outcome.namespaces
    );
    Ok(())
}

/// `--max-age-hours` wins over the configured retention.
fn max_age(params: &GcParams, cfg: &StoreConfig) -> Duration {
    params
        .max_age_hours
        .map(|h| Duration::from_secs(h.saturating_mul(3600)))
        .unwrap_or_else(|| cfg.retention())
}

/// Reap (or list, for a dry run) every target namespace at `now`.
pub fn collect(
    store: &Store,
    cfg: &StoreConfig,
    params: &GcParams,
    now: SystemTime,
) -> anyhow::Result<GcOutcome> {
    store.check_root()?;
    let max_age = max_age(params, cfg);
    let namespaces = if params.all {
        store.namespaces()?
    } else {
        vec![resolve_cwd(&params.cwd.to_string_lossy(), cfg.namespace_mode)]
    };

    let mut outcome = GcOutcome {
        namespaces: namespaces.len(),
        ..GcOutcome::default()
    };
    for ns in namespaces {
        if params.dry_run {
            outcome.expired.extend(
                store
                    .expired_at(&ns, max_age, now)
                    .into_iter()
                    .map(|meta| (ns.clone(), meta.session_key)),
            );
        } else {
            let report = store.reap_at(&ns, max_age, now);
            outcome.failed += report.failed;
            outcome
                .expired
                .extend(report.removed.into_iter().map(|key| (ns.clone(), key)));
        }
    }
    outcome.expired.sort();
    Ok(outcome)
}
