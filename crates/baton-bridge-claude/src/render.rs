//! Text rendering for the injected context block.

use baton_store::Namespace;

use crate::peers::PeerSummary;

// ── Context Boundary ──

/// Baton context boundary start marker.
pub const BOUNDARY_START: &str = "<!-- baton:start -->";

/// Baton context boundary end marker.
pub const BOUNDARY_END: &str = "<!-- baton:end -->";

pub const RESUME_HEADING: &str = "## Resuming Session State";

const NO_ACTIVITY: &str = "(no current activity)";

/// Wrap context content with boundary markers for multi-plugin coexistence.
pub fn wrap_boundary(content: &str) -> String {
    format!("{BOUNDARY_START}\n{content}\n{BOUNDARY_END}")
}

/// Largest char boundary at or below `idx`.
fn floor_boundary(s: &str, idx: usize) -> usize {
    let mut i = idx.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Truncate content to fit within the char budget, preserving UTF-8 boundaries.
pub fn apply_budget(content: &str, budget: usize) -> String {
    if content.len() <= budget {
        return content.to_string();
    }
    let safe = floor_boundary(content, budget.saturating_sub(50));
    format!(
        "{}\n\n... (truncated to {} char budget)",
        &content[..safe],
        budget
    )
}

// ── Sections ──

/// The caller's own record under the resume heading.
pub fn resume_section(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    Some(format!("{RESUME_HEADING}\n{body}"))
}

/// One line per peer: `- <key8> (<age>) [branch: <b>]: <activity>`.
pub fn peer_line(peer: &PeerSummary) -> String {
    let branch = peer
        .branch
        .as_deref()
        .map(|b| format!(" [branch: {b}]"))
        .unwrap_or_default();
    let activity = peer.activity.as_deref().unwrap_or(NO_ACTIVITY);
    format!(
        "- {} ({}){branch}: {activity}",
        peer.session_key.short(),
        peer.age()
    )
}

pub fn peers_section(ns: &Namespace, peers: &[PeerSummary]) -> Option<String> {
    if peers.is_empty() {
        return None;
    }
    let mut lines = vec![format!("## Other Sessions in {ns}")];
    lines.extend(peers.iter().map(peer_line));
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_store::SessionKey;

    fn peer(key: &str, mins: i64, activity: Option<&str>, branch: Option<&str>) -> PeerSummary {
        PeerSummary {
            session_key: SessionKey::new(key).unwrap(),
            age_minutes: mins,
            activity: activity.map(String::from),
            branch: branch.map(String::from),
        }
    }

    #[test]
    fn wrap_boundary_adds_markers() {
        let wrapped = wrap_boundary("hello");
        assert!(wrapped.starts_with(BOUNDARY_START));
        assert!(wrapped.ends_with(BOUNDARY_END));
        assert!(wrapped.contains("\nhello\n"));
    }

    #[test]
    fn apply_budget_no_truncation() {
        assert_eq!(apply_budget("short", 100), "short");
    }

    #[test]
    fn apply_budget_truncates_on_char_boundary() {
        let content = "ü".repeat(200);
        let out = apply_budget(&content, 101);
        assert!(out.contains("truncated to 101 char budget"));
        assert!(out.len() < content.len());
    }

    #[test]
    fn resume_section_skips_blank_body() {
        assert_eq!(resume_section("  \n\n"), None);
        assert_eq!(
            resume_section("\nstate\n").as_deref(),
            Some("## Resuming Session State\nstate")
        );
    }

    #[test]
    fn peer_line_formats() {
        let full = peer("abcdef0123456789", 10, Some("Writing docs"), Some("main"));
        assert_eq!(
            peer_line(&full),
            "- abcdef01 (10 min ago) [branch: main]: Writing docs"
        );
        let bare = peer("s2", 130, None, None);
        assert_eq!(peer_line(&bare), "- s2 (2h ago): (no current activity)");
    }

    #[test]
    fn peers_section_empty_is_none() {
        let ns = Namespace::new("proj").unwrap();
        assert!(peers_section(&ns, &[]).is_none());
        let out = peers_section(&ns, &[peer("s1", 5, None, None)]).unwrap();
        assert!(out.starts_with("## Other Sessions in proj\n- s1"));
    }
}
