//! Best-effort field extraction from free-text state documents.
//!
//! Authoring convention (the store cannot enforce it):
//!
//! ```markdown
//! ## Current Activity
//! Wiring the reaper into the read path
//!
//! Branch: feat/reaper
//! ```
//!
//! `Current Task` and `Current Focus` headings are accepted too, at any
//! heading level. The branch line may carry a list marker or bold markup
//! (`- **Branch:** main`). Both extractors are total: any input yields a
//! value or `None`.

use regex::Regex;
use std::sync::LazyLock;

static ACTIVITY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s{0,3}#{1,6}\s*current\s+(?:activity|task|focus)\s*:?\s*#*\s*$").unwrap()
});

static BRANCH_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:[-*+][ \t]+)?(?:\*\*|__)?branch(?:\*\*|__)?[ \t]*:(?:\*\*|__)?[ \t]*(.*)$",
    )
    .unwrap()
});

fn is_heading(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// First non-empty line under the current-activity heading, trimmed.
///
/// `None` when there is no such heading, or the section is empty (the next
/// non-empty line is another heading, or the body ends).
pub fn extract_activity(body: &str) -> Option<String> {
    let mut lines = body.lines();
    lines.by_ref().find(|line| ACTIVITY_HEADING.is_match(line))?;
    let line = lines.map(str::trim).find(|line| !line.is_empty())?;
    if is_heading(line) {
        return None;
    }
    Some(line.to_string())
}

/// Markup that may wrap a branch value, longest first.
const VALUE_MARKUP: &[&str] = &["**", "__", "`", "*", "_"];

/// Remove whitespace and matched markup pairs around `value`. An unpaired
/// `_` or `*` is part of the name, and code spans are taken literally.
fn strip_markup(mut value: &str) -> &str {
    loop {
        value = value.trim();
        let stripped = VALUE_MARKUP.iter().find_map(|m| {
            let inner = value.strip_prefix(m)?.strip_suffix(m)?;
            Some((*m, inner))
        });
        match stripped {
            Some(("`", inner)) => return inner.trim(),
            Some((_, inner)) => value = inner,
            None => return value,
        }
    }
}

/// Value of the first non-empty `Branch:` line.
pub fn extract_branch(body: &str) -> Option<String> {
    BRANCH_LINE.captures_iter(body).find_map(|caps| {
        let value = strip_markup(caps.get(1)?.as_str());
        (!value.is_empty()).then(|| value.to_string())
    })
}
