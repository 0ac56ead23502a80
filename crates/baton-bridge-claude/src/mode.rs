//! Run mode selection from the SessionStart `source` signal.

use std::fmt;

use tracing::debug;

/// What the session-start trigger reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSource {
    Startup,
    Resume,
    Clear,
    /// Context was compacted inside a running session.
    Compact,
    /// Anything this version does not know about, kept verbatim.
    Other(String),
}

impl SessionSource {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "startup" => Self::Startup,
            "resume" => Self::Resume,
            "clear" => Self::Clear,
            "compact" => Self::Compact,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Compact => Mode::Recovery,
            Self::Startup | Self::Resume | Self::Clear => Mode::Awareness,
            Self::Other(raw) => {
                debug!(source = %raw, "unrecognized session source, using awareness mode");
                Mode::Awareness
            }
        }
    }
}

/// Read path selected once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Own record only, after an internal context reset.
    Recovery,
    /// Own record plus the most recent peers.
    Awareness,
}

impl Mode {
    pub fn from_source(source: &str) -> Self {
        SessionSource::parse(source).mode()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Recovery => f.write_str("recovery"),
            Mode::Awareness => f.write_str("awareness"),
        }
    }
}
