pub mod context;
pub mod extract;
pub mod mode;
pub mod peers;
pub mod render;

mod admin;
mod dispatch;
mod parse;

// Re-export public API (CLI consumers)
pub use admin::{install, uninstall};
pub use context::{assemble, gather, SessionContext};
pub use dispatch::{dispatch, hook_entrypoint_from_stdin, HookResult};
pub use mode::{Mode, SessionSource};
