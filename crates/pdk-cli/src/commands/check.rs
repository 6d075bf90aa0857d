use anyhow::Result;

use pdk_config::secrets::discover_accounts_from_env;
use pdk_config::UnusedKeyPolicy;

use super::load_config;

/// Print a `key=value` summary of the effective config. Fails on invalid
/// settings, secret literals, or (with `fail_unused`) unconsumed keys.
pub fn run_config_check(config_paths: &[String], fail_unused: bool) -> Result<()> {
    let loaded = load_config(config_paths)?;
    let policy = if fail_unused {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let unused = pdk_config::report_unused_keys(&loaded.config_json, policy)?;
    let settings = loaded.settings()?;

    println!("config_ok=true");
    println!("config_hash={}", loaded.config_hash);
    println!("timezone={}", settings.report.timezone.name());
    println!("interval_secs={}", settings.schedule.interval_secs);
    println!("telegram_enabled={}", settings.telegram.enabled);
    println!("unused_keys={}", unused.unused_leaf_pointers.len());
    for ptr in &unused.unused_leaf_pointers {
        println!("unused_key={ptr}");
    }
    for v in &settings.venues {
        let accounts = discover_accounts_from_env(v.kind, &v.env_prefix);
        println!(
            "venue={} kind={} env_prefix={} accounts={}",
            v.id,
            v.kind.as_str(),
            v.env_prefix,
            accounts.len()
        );
    }
    Ok(())
}
