//! Command handler modules for pdk-cli.
//!
//! Shared utilities used by multiple command paths live here.

pub mod check;
pub mod report;

use anyhow::Result;
use pdk_config::{LoadedConfig, Settings};
use tracing::warn;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    pdk_config::load_layered_yaml(&path_refs)
}

/// Load and type the config; unused keys only warn.
pub fn load_settings(paths: &[String]) -> Result<Settings> {
    let loaded = load_config(paths)?;
    let unused =
        pdk_config::report_unused_keys(&loaded.config_json, pdk_config::UnusedKeyPolicy::Warn)?;
    if !unused.is_clean() {
        warn!(unused = ?unused.unused_leaf_pointers, "config has unused keys");
    }
    loaded.settings()
}
