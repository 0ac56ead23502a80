use baton_store::{resolve_cwd, SessionKey, Store, StoreConfig, StoreError};
use tracing::{debug, warn};

use crate::context;
use crate::mode::Mode;
use crate::parse::*;
use crate::render;

// ── Hook Result ──

/// Result from a hook dispatch.
///
/// - `stdout`: JSON string to print to stdout (consumed by Claude Code)
/// - `stderr`: warning message to print to stderr (shown to user, exit 1)
#[derive(Debug, Default, Clone)]
pub struct HookResult {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl HookResult {
    /// Construct a result with stdout only (normal output, exit 0).
    pub fn output(stdout: String) -> Self {
        Self {
            stdout: Some(stdout),
            stderr: None,
        }
    }

    /// Construct a result with stderr warning (exit 1).
    pub fn warning(msg: String) -> Self {
        Self {
            stdout: None,
            stderr: Some(msg),
        }
    }

    /// Construct an empty result (no output, exit 0).
    pub fn empty() -> Self {
        Self::default()
    }
}

// ── Hook dispatch ──

/// Main hook entrypoint against the default store and resolved config.
pub fn hook_entrypoint_from_stdin(stdin: &str) -> anyhow::Result<HookResult> {
    let store = Store::open_default();
    let cfg = StoreConfig::resolve(store.root());
    dispatch(&store, &cfg, stdin)
}

/// Parse stdin, dispatch by `hook_event_name`. Only `SessionStart` produces
/// output; every other event is a no-op.
pub fn dispatch(store: &Store, cfg: &StoreConfig, stdin: &str) -> anyhow::Result<HookResult> {
    if stdin.trim().is_empty() {
        return Ok(HookResult::empty());
    }
    let raw = parse_hook_stdin(stdin)?;
    let hook_event_name = get_str(&raw, "hook_event_name");

    match hook_event_name.as_str() {
        "SessionStart" => dispatch_session_start(store, cfg, &raw),
        other => {
            debug!(event = other, "ignoring hook event");
            Ok(HookResult::empty())
        }
    }
}

fn dispatch_session_start(
    store: &Store,
    cfg: &StoreConfig,
    raw: &serde_json::Value,
) -> anyhow::Result<HookResult> {
    let session_id = get_str(raw, "session_id");
    if session_id.is_empty() {
        debug!("SessionStart without session id, nothing to inject");
        return Ok(HookResult::empty());
    }
    let session = match SessionKey::new(session_id) {
        Ok(k) => k,
        Err(e) => {
            warn!(error = %e, "rejecting session id");
            return Ok(HookResult::empty());
        }
    };

    let ns = resolve_cwd(&get_str(raw, "cwd"), cfg.namespace_mode);
    let mode = Mode::from_source(&get_str(raw, "source"));

    match context::assemble(store, cfg, &ns, &session, mode) {
        Ok(Some(content)) => {
            let output = serde_json::json!({
                "hookSpecificOutput": {
                    "hookEventName": "SessionStart",
                    "additionalContext": render::wrap_boundary(&content)
                }
            });
            Ok(HookResult::output(serde_json::to_string(&output)?))
        }
        Ok(None) => Ok(HookResult::empty()),
        Err(e @ StoreError::Unavailable { .. }) => {
            debug!(error = %e, "session state store unavailable");
            Ok(HookResult::warning(format!("baton: {e}")))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_store::Namespace;
    use std::path::Path;

    fn setup() -> (tempfile::TempDir, Store, StoreConfig) {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(tmp.path().join("store"));
        (tmp, store, StoreConfig::default())
    }

    fn stdin(session: &str, cwd: &Path, source: &str) -> String {
        serde_json::json!({
            "session_id": session,
            "hook_event_name": "SessionStart",
            "cwd": cwd.to_string_lossy(),
            "source": source,
        })
        .to_string()
    }

    fn context_of(result: &HookResult) -> String {
        let output: serde_json::Value =
            serde_json::from_str(result.stdout.as_ref().unwrap()).unwrap();
        output["hookSpecificOutput"]["additionalContext"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn put(store: &Store, ns: &str, key: &str, body: &str) {
        store
            .put(
                &Namespace::new(ns).unwrap(),
                &SessionKey::new(key).unwrap(),
                body,
            )
            .unwrap();
    }

    #[test]
    fn empty_stdin_is_noop() {
        let (_tmp, store, cfg) = setup();
        let result = dispatch(&store, &cfg, "  \n").unwrap();
        assert!(result.stdout.is_none());
        assert!(result.stderr.is_none());
    }

    #[test]
    fn malformed_stdin_is_error() {
        let (_tmp, store, cfg) = setup();
        assert!(dispatch(&store, &cfg, "{not json").is_err());
    }

    #[test]
    fn other_events_are_ignored() {
        let (_tmp, store, cfg) = setup();
        let input = r#"{"session_id":"s1","hook_event_name":"PreToolUse","cwd":"/w/app"}"#;
        let result = dispatch(&store, &cfg, input).unwrap();
        assert!(result.stdout.is_none());
    }

    #[test]
    fn missing_or_invalid_session_is_noop() {
        let (_tmp, store, cfg) = setup();
        put(&store, "app", "peer", "## Current Activity\nworking");

        let input = r#"{"hook_event_name":"SessionStart","cwd":"/w/app"}"#;
        assert!(dispatch(&store, &cfg, input).unwrap().stdout.is_none());

        let input = stdin("../escape", Path::new("/w/app"), "startup");
        assert!(dispatch(&store, &cfg, &input).unwrap().stdout.is_none());
    }

    #[test]
    fn session_start_injects_peers_with_boundary() {
        let (_tmp, store, cfg) = setup();
        put(
            &store,
            "app",
            "peer-session",
            "## Current Activity\nFixing flaky test\nBranch: ci",
        );

        let result = dispatch(&store, &cfg, &stdin("me", Path::new("/w/app"), "startup")).unwrap();
        let ctx = context_of(&result);
        assert!(ctx.starts_with(render::BOUNDARY_START));
        assert!(ctx.ends_with(render::BOUNDARY_END));
        assert!(ctx.contains("## Other Sessions in app"));
        assert!(ctx.contains("Fixing flaky test"));
        assert!(ctx.contains("[branch: ci]"));
        assert!(result.stderr.is_none());
    }

    #[test]
    fn compact_source_recovers_own_state_only() {
        let (_tmp, store, cfg) = setup();
        put(&store, "app", "me", "## Current Activity\nmy task");
        put(&store, "app", "peer", "## Current Activity\npeer task");

        let result = dispatch(&store, &cfg, &stdin("me", Path::new("/w/app"), "compact")).unwrap();
        let ctx = context_of(&result);
        assert!(ctx.contains(render::RESUME_HEADING));
        assert!(ctx.contains("my task"));
        assert!(!ctx.contains("peer task"));
    }

    #[test]
    fn camel_case_input_is_accepted() {
        let (_tmp, store, cfg) = setup();
        put(&store, "app", "me", "state");
        let input = r#"{"sessionId":"me","hookEventName":"SessionStart","cwd":"/w/app","source":"compact"}"#;
        let result = dispatch(&store, &cfg, input).unwrap();
        assert!(context_of(&result).contains("state"));
    }

    #[test]
    fn nothing_stored_is_silent() {
        let (_tmp, store, cfg) = setup();
        let result = dispatch(&store, &cfg, &stdin("me", Path::new("/w/app"), "startup")).unwrap();
        assert!(result.stdout.is_none());
        assert!(result.stderr.is_none());
    }

    #[test]
    fn unavailable_store_warns_without_stdout() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root-is-a-file");
        std::fs::write(&root, "x").unwrap();
        let store = Store::new(&root);
        let cfg = StoreConfig::default();

        let result = dispatch(&store, &cfg, &stdin("me", Path::new("/w/app"), "startup")).unwrap();
        assert!(result.stdout.is_none());
        assert!(result.stderr.unwrap().contains("unavailable"));
    }

    #[test]
    fn unusable_namespace_warns_in_every_mode() {
        let (_tmp, store, cfg) = setup();
        std::fs::create_dir_all(store.root()).unwrap();
        std::fs::write(store.namespace_dir(&Namespace::new("app").unwrap()), "x").unwrap();

        for source in ["compact", "startup"] {
            let result =
                dispatch(&store, &cfg, &stdin("me", Path::new("/w/app"), source)).unwrap();
            assert!(result.stdout.is_none(), "{source}");
            assert!(result.stderr.is_some(), "{source}");
        }
    }

    #[test]
    fn hook_result_constructors() {
        let out = HookResult::output("x".into());
        assert_eq!(out.stdout.as_deref(), Some("x"));
        assert!(out.stderr.is_none());
        let warn = HookResult::warning("w".into());
        assert!(warn.stdout.is_none());
        assert_eq!(warn.stderr.as_deref(), Some("w"));
        let empty = HookResult::empty();
        assert!(empty.stdout.is_none() && empty.stderr.is_none());
    }
}
