//! Config command - show or edit configuration

use crate::cache::{CacheSettings, ReconciliationMode};
use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{CacheError, CacheResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "api.api_key",
    "api.base_url",
    "cache.cache_period_ms",
    "cache.resiliency_period_ms",
    "cache.mode",
    "cache.fetch_timeout_ms",
    "response_log.enabled",
    "response_log.dir",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> CacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> CacheResult<()> {
    let mut shown = config.clone();
    if shown.api.api_key.is_some() {
        shown.api.api_key = Some("********".to_string());
    }
    println!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn init_config(manager: &ConfigManager, force: bool) -> CacheResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;

    ui::step_ok_detail(
        &ctx,
        "Configuration initialized",
        &path.display().to_string(),
    );

    Ok(())
}

/// Edits the file on disk, not the merged runtime view, so CLI and
/// environment overrides never leak into the saved config.
async fn set_value(manager: &ConfigManager, key: &str, value: &str) -> CacheResult<()> {
    let ctx = UiContext::detect();
    let mut config = manager.load().await?;

    if let Err(err) = apply(&mut config, key, value) {
        if matches!(err, CacheError::ConfigKeyUnknown(_)) {
            ui::remark(&ctx, &format!("Valid keys: {}", VALID_KEYS.join(", ")));
        }
        return Err(err);
    }
    CacheSettings::try_from(&config.cache)?;

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> CacheResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => {
            config.general.log_format = match value {
                "text" | "json" => value.to_string(),
                _ => {
                    return Err(CacheError::User(format!(
                        "Invalid log format: {}. Use text/json",
                        value
                    )))
                }
            }
        }

        ["api", "api_key"] => config.api.api_key = optional(value),
        ["api", "base_url"] => config.api.base_url = value.to_string(),

        ["cache", "cache_period_ms"] => config.cache.cache_period_ms = parse_u64(value)?,
        ["cache", "resiliency_period_ms"] => config.cache.resiliency_period_ms = parse_u64(value)?,
        ["cache", "fetch_timeout_ms"] => config.cache.fetch_timeout_ms = parse_u64(value)?,
        ["cache", "mode"] => {
            config.cache.mode = value.parse::<ReconciliationMode>().map_err(CacheError::User)?
        }

        ["response_log", "enabled"] => config.response_log.enabled = parse_bool(value)?,
        ["response_log", "dir"] => config.response_log.dir = optional(value).map(PathBuf::from),

        _ => return Err(CacheError::ConfigKeyUnknown(key.to_string())),
    }

    Ok(())
}

/// Empty string clears an optional value
fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_bool(value: &str) -> CacheResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(CacheError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> CacheResult<u64> {
    value
        .parse()
        .map_err(|_| CacheError::User(format!("Invalid number: {}", value)))
}
