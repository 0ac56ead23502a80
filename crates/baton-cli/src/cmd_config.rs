use std::path::Path;

use anyhow::Context;
use clap::Subcommand;

use baton_store::{config_path, NamespaceMode, StoreConfig};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value in the store's config.json
    Set {
        /// Config key (retention_hours, peer_limit, max_context_chars, namespace_mode)
        key: String,
        /// Config value
        value: String,
    },
    /// Print the effective value of a key (config.json + BATON_* env)
    Get {
        /// Config key
        key: String,
    },
    /// Print every effective config value
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd) -> anyhow::Result<()> {
    let root = baton_store::store_root();
    match cmd {
        ConfigCmd::Set { key, value } => {
            set(&root, &key, &value)?;
            println!("{key} = {value}");
            Ok(())
        }
        ConfigCmd::Get { key } => {
            println!("{}", effective(&root, &key)?);
            Ok(())
        }
        ConfigCmd::List => {
            for (key, value) in entries(&StoreConfig::resolve(&root))? {
                println!("{key} = {value}");
            }
            Ok(())
        }
    }
}

// ── Command Implementations ──

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> anyhow::Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{key} expects a non-negative integer, got {value:?}"))
}

/// Assign one field by name.
fn apply(cfg: &mut StoreConfig, key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "retention_hours" => cfg.retention_hours = parse_number(key, value)?,
        "peer_limit" => cfg.peer_limit = parse_number(key, value)?,
        "max_context_chars" => cfg.max_context_chars = parse_number(key, value)?,
        "namespace_mode" => {
            cfg.namespace_mode = NamespaceMode::parse(value).ok_or_else(|| {
                anyhow::anyhow!("namespace_mode is `basename` or `hashed`, got {value:?}")
            })?
        }
        _ => anyhow::bail!(
            "Unknown config key {key:?}. Known keys: {}",
            StoreConfig::KEYS.join(", ")
        ),
    }
    Ok(())
}

/// Field name → JSON value, in declaration order.
fn entries(cfg: &StoreConfig) -> anyhow::Result<Vec<(&'static str, serde_json::Value)>> {
    let value = serde_json::to_value(cfg)?;
    Ok(StoreConfig::KEYS
        .iter()
        .map(|key| (*key, value[*key].clone()))
        .collect())
}

/// `baton config set <key> <value>`: rewrite `config.json` with the
/// updated field. A malformed existing file is an error, not overwritten.
pub fn set(root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let mut cfg = StoreConfig::load(root)?;
    apply(&mut cfg, key, value)?;
    let json = serde_json::to_string_pretty(&cfg)?;
    baton_store::write_atomic(&config_path(root), json.as_bytes())
        .context("writing store config")?;
    Ok(())
}

/// `baton config get <key>`
pub fn effective(root: &Path, key: &str) -> anyhow::Result<serde_json::Value> {
    entries(&StoreConfig::resolve(root))?
        .into_iter()
        .find_map(|(k, v)| (k == key).then_some(v))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown config key {key:?}. Known keys: {}",
                StoreConfig::KEYS.join(", ")
            )
        })
}
