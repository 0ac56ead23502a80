mod cmd_bridge;
mod cmd_config;
mod cmd_gc;
mod cmd_state;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "baton",
    version,
    about = "Session state handoff between concurrent coding-agent sessions"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hook entrypoint (called by Claude Code hooks)
    Hook {
        #[command(subcommand)]
        cmd: HookCmd,
    },
    /// Bridge operations (install/uninstall hooks for Claude Code)
    Bridge {
        #[command(subcommand)]
        cmd: BridgeCmd,
    },
    /// Write this session's state document (body from --file or stdin)
    Write {
        /// Session ID
        #[arg(long)]
        session: String,
        /// Project directory (defaults to the current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Read the body from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print this session's stored state document
    Show {
        /// Session ID
        #[arg(long)]
        session: String,
        /// Project directory (defaults to the current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
    /// List live sessions for the project, most recent first
    Sessions {
        /// Project directory (defaults to the current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the context block a SessionStart hook would inject
    Context {
        /// Session ID
        #[arg(long)]
        session: String,
        /// Project directory (defaults to the current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// SessionStart source: startup, resume, clear or compact
        #[arg(long, default_value = "startup")]
        source: String,
    },
    /// Print the namespace a directory resolves to
    Namespace {
        /// Project directory (defaults to the current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
    /// Delete expired session records
    Gc {
        /// Retention window in hours (defaults to config, 48)
        #[arg(long)]
        max_age_hours: Option<u64>,
        /// Reap every project namespace, not just the current one
        #[arg(long)]
        all: bool,
        /// Show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
        /// Project directory (defaults to the current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
    /// Manage store configuration
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

#[derive(Subcommand)]
enum HookCmd {
    /// Claude Code hook entrypoint (reads stdin JSON)
    Claude,
}

#[derive(Subcommand)]
enum BridgeCmd {
    /// Claude Code bridge
    Claude {
        #[command(subcommand)]
        cmd: BridgeClaudeCmd,
    },
}

#[derive(Subcommand)]
enum BridgeClaudeCmd {
    /// Install the SessionStart hook into .claude/settings.local.json
    Install {
        /// Repository root (defaults to the current directory)
        #[arg(long)]
        repo: Option<PathBuf>,
    },
    /// Remove the SessionStart hook
    Uninstall {
        /// Repository root (defaults to the current directory)
        #[arg(long)]
        repo: Option<PathBuf>,
    },
}

/// Logs go to stderr only; stdout is reserved for hook output.
fn init_tracing() {
    let debug_enabled = std::env::var("BATON_DEBUG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("BATON_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let current_dir = std::env::current_dir()?;
    let dir_or_current = |dir: Option<PathBuf>| dir.unwrap_or_else(|| current_dir.clone());

    match cli.cmd {
        Command::Hook { cmd } => match cmd {
            HookCmd::Claude => cmd_bridge::hook_claude(),
        },
        Command::Bridge { cmd } => match cmd {
            BridgeCmd::Claude { cmd } => match cmd {
                BridgeClaudeCmd::Install { repo } => cmd_bridge::install(&dir_or_current(repo)),
                BridgeClaudeCmd::Uninstall { repo } => {
                    cmd_bridge::uninstall(&dir_or_current(repo))
                }
            },
        },
        Command::Write { session, cwd, file } => {
            cmd_state::write(&dir_or_current(cwd), &session, file.as_deref())
        }
        Command::Show { session, cwd } => cmd_state::show(&dir_or_current(cwd), &session),
        Command::Sessions { cwd, json } => cmd_state::sessions(&dir_or_current(cwd), json),
        Command::Context {
            session,
            cwd,
            source,
        } => cmd_state::context(&dir_or_current(cwd), &session, &source),
        Command::Namespace { cwd } => cmd_state::namespace(&dir_or_current(cwd)),
        Command::Gc {
            max_age_hours,
            all,
            dry_run,
            cwd,
        } => cmd_gc::execute(&cmd_gc::GcParams {
            cwd: &dir_or_current(cwd),
            max_age_hours,
            all,
            dry_run,
        }),
        Command::Config { cmd } => cmd_config::run(cmd),
    }
}

fn main() {
    init_tracing();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        let unavailable = e
            .downcast_ref::<baton_store::StoreError>()
            .is_some_and(|se| se.is_unavailable());
        std::process::exit(if unavailable { 2 } else { 1 });
    }
}
