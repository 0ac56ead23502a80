use std::io::Read;
use std::path::Path;
use std::time::SystemTime;

use baton_bridge_claude::extract::{extract_activity, extract_branch};
use baton_bridge_claude::peers::{elapsed_minutes, format_age, rank};
use baton_bridge_claude::Mode;
use baton_store::{resolve_cwd, Namespace, Record, SessionKey, Store, StoreConfig, StoreResult};

/// Store, resolved config and namespace for one CLI invocation.
struct Scope {
    store: Store,
    cfg: StoreConfig,
    ns: Namespace,
}

impl Scope {
    fn for_dir(cwd: &Path) -> Self {
        let store = Store::open_default();
        let cfg = StoreConfig::resolve(store.root());
        let ns = resolve_cwd(&cwd.to_string_lossy(), cfg.namespace_mode);
        Self { store, cfg, ns }
    }

    /// Reap, then every live record newest first.
    fn live_records(&self) -> StoreResult<Vec<Record>> {
        self.store.check_namespace(&self.ns)?;
        self.store.reap(&self.ns, self.cfg.retention());
        let mut records = self.store.list(&self.ns)?;
        rank(&mut records);
        Ok(records)
    }
}

fn format_timestamp(t: SystemTime) -> String {
    time::OffsetDateTime::from(t)
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

/// `baton write --session <id>`
pub fn write(cwd: &Path, session: &str, file: Option<&Path>) -> anyhow::Result<()> {
    let key = SessionKey::new(session)?;
    let body = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let scope = Scope::for_dir(cwd);
    scope.store.put(&scope.ns, &key, &body)?;
    println!(
        "Wrote {} bytes for session {} in {}",
        body.len(),
        key.short(),
        scope.ns
    );
    Ok(())
}

/// `baton show --session <id>`
pub fn show(cwd: &Path, session: &str) -> anyhow::Result<()> {
    let key = SessionKey::new(session)?;
    let scope = Scope::for_dir(cwd);
    match scope.store.get(&scope.ns, &key)? {
        Some(record) => print!("{}", record.body),
        None => println!("No state recorded for session {key} in {}.", scope.ns),
    }
    Ok(())
}

fn session_json(record: &Record, now: SystemTime) -> serde_json::Value {
    serde_json::json!({
        "session_id": record.session_key.as_str(),
        "modified_at": format_timestamp(record.modified_at),
        "age_minutes": elapsed_minutes(now, record.modified_at).max(0),
        "activity": extract_activity(&record.body),
        "branch": extract_branch(&record.body),
    })
}

/// `baton sessions`: every live record, newest first.
pub fn sessions(cwd: &Path, json: bool) -> anyhow::Result<()> {
    let scope = Scope::for_dir(cwd);
    let records = scope.live_records()?;
    let now = SystemTime::now();

    if json {
        let rows: Vec<_> = records.iter().map(|r| session_json(r, now)).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No active sessions in {}.", scope.ns);
        return Ok(());
    }

    println!("Sessions in {} ({}):\n", scope.ns, records.len());
    for r in &records {
        let age = format_age(elapsed_minutes(now, r.modified_at));
        let branch = extract_branch(&r.body)
            .map(|b| format!(" [branch: {b}]"))
            .unwrap_or_default();
        println!("  {} ({age}){branch}", r.session_key.short());
        if let Some(activity) = extract_activity(&r.body) {
            println!("    {activity}");
        }
    }
    Ok(())
}

/// `baton context --session <id>`: plain-text preview of the hook output.
pub fn context(cwd: &Path, session: &str, source: &str) -> anyhow::Result<()> {
    let key = SessionKey::new(session)?;
    let scope = Scope::for_dir(cwd);
    let mode = Mode::from_source(source);
    if let Some(block) =
        baton_bridge_claude::assemble(&scope.store, &scope.cfg, &scope.ns, &key, mode)?
    {
        println!("{block}");
    }
    Ok(())
}

/// `baton namespace`
pub fn namespace(cwd: &Path) -> anyhow::Result<()> {
    let scope = Scope::for_dir(cwd);
    println!("{}", scope.ns);
    Ok(())
}
