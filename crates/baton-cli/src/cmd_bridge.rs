use std::io::Read;
use std::path::Path;

use tracing::{debug, error};

/// `baton bridge claude install`
pub fn install(repo_root: &Path) -> anyhow::Result<()> {
    let path = baton_bridge_claude::install(repo_root)?;
    println!("Installed baton SessionStart hook into {}", path.display());
    Ok(())
}

/// `baton bridge claude uninstall`
pub fn uninstall(repo_root: &Path) -> anyhow::Result<()> {
    match baton_bridge_claude::uninstall(repo_root)? {
        Some(path) => println!("Uninstalled baton hooks from {}", path.display()),
        None => println!("No settings file found in {}", repo_root.display()),
    }
    Ok(())
}

/// `baton hook claude`: read stdin, dispatch hook.
///
/// Never fails the host: internal errors are logged and the process exits 0
/// with no stdout. Only an unavailable store exits 1 with a stderr warning.
pub fn hook_claude() -> anyhow::Result<()> {
    let mut stdin_buf = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut stdin_buf) {
        debug!(error = %e, "stdin read error");
        return Ok(());
    }
    debug!(bytes = stdin_buf.len(), "hook stdin received");

    match baton_bridge_claude::hook_entrypoint_from_stdin(&stdin_buf) {
        Ok(result) => {
            if let Some(output) = &result.stdout {
                debug!(bytes = output.len(), "hook output");
                print!("{output}");
            }
            if let Some(warning) = &result.stderr {
                eprintln!("{warning}");
                // Exit 1 = non-blocking warning; Claude Code shows stderr to user
                // but does not feed it to the model or block the conversation.
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "hook dispatch failed");
            Ok(())
        }
    }
}
