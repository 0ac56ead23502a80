//! Hook registration in a repository's `.claude/settings.local.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::{json, Map, Value};

use crate::parse::now_rfc3339;

const BATON_HOOK_COMMAND: &str = "baton hook claude";

/// Hook events baton registers for.
const HOOK_EVENTS: &[&str] = &["SessionStart"];

type Settings = Map<String, Value>;

fn settings_path(repo_root: &Path) -> PathBuf {
    repo_root.join(".claude").join("settings.local.json")
}

fn is_baton_command(cmd: &str) -> bool {
    cmd.trim_start().starts_with("baton hook")
}

/// A matcher group `{ "matcher": "", "hooks": [{ "command": ... }] }` that
/// runs baton, or a bare command string.
fn is_baton_group(group: &Value) -> bool {
    match group {
        Value::String(cmd) => is_baton_command(cmd),
        _ => group
            .get("hooks")
            .and_then(Value::as_array)
            .is_some_and(|hooks| {
                hooks
                    .iter()
                    .filter_map(|hook| hook.get("command").and_then(Value::as_str))
                    .any(is_baton_command)
            }),
    }
}

fn baton_group() -> Value {
    json!({
        "matcher": "",
        "hooks": [{ "type": "command", "command": BATON_HOOK_COMMAND }]
    })
}

/// `None` when the file does not exist. Refuses to touch a file that is not
/// a JSON object rather than overwrite it.
fn load_settings(path: &Path) -> anyhow::Result<Option<Settings>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    match serde_json::from_str::<Value>(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?
    {
        Value::Object(map) => Ok(Some(map)),
        _ => anyhow::bail!("{} is not a JSON object", path.display()),
    }
}

fn store_settings(path: &Path, settings: Settings) -> anyhow::Result<()> {
    let output = serde_json::to_string_pretty(&Value::Object(settings))?;
    baton_store::write_atomic(path, output.as_bytes())?;
    Ok(())
}

/// Drop baton's groups from every managed event, then append `add` if given.
/// Foreign groups keep their order; events and a `hooks` object left empty
/// are removed.
fn rewrite_hooks(settings: &mut Settings, add: Option<Value>) -> anyhow::Result<()> {
    let mut hooks = match settings.remove("hooks") {
        Some(Value::Object(hooks)) => hooks,
        Some(_) => anyhow::bail!("`hooks` in settings is not an object"),
        None => Map::new(),
    };
    for event in HOOK_EVENTS {
        let mut groups: Vec<Value> = match hooks.remove(*event) {
            Some(Value::Array(groups)) => {
                groups.into_iter().filter(|g| !is_baton_group(g)).collect()
            }
            Some(_) => anyhow::bail!("`hooks.{event}` in settings is not an array"),
            None => Vec::new(),
        };
        groups.extend(add.clone());
        if !groups.is_empty() {
            hooks.insert(event.to_string(), Value::Array(groups));
        }
    }
    if !hooks.is_empty() {
        settings.insert("hooks".to_string(), Value::Object(hooks));
    }
    Ok(())
}

/// Register the `baton hook claude` SessionStart hook, backing up any
/// existing settings file first. Returns the settings path.
pub fn install(repo_root: &Path) -> anyhow::Result<PathBuf> {
    let path = settings_path(repo_root);
    let mut settings = match load_settings(&path)? {
        Some(existing) => {
            let ts = now_rfc3339().replace(':', "-");
            fs::copy(&path, path.with_extension(format!("json.baton.bak.{ts}")))?;
            existing
        }
        None => Settings::new(),
    };
    rewrite_hooks(&mut settings, Some(baton_group()))?;
    store_settings(&path, settings)?;
    Ok(path)
}

/// Remove baton's hooks. `None` when there was no settings file.
pub fn uninstall(repo_root: &Path) -> anyhow::Result<Option<PathBuf>> {
    let path = settings_path(repo_root);
    let Some(mut settings) = load_settings(&path)? else {
        return Ok(None);
    };
    rewrite_hooks(&mut settings, None)?;
    store_settings(&path, settings)?;
    Ok(Some(path))
}
