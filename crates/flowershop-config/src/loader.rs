// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./flowershop.toml` > `~/.config/flowershop/flowershop.toml`
//! > `/etc/flowershop/flowershop.toml` with environment variable overrides via
//! the `FLOWERSHOP_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FlowershopConfig;

/// Config sections recognized in environment variable names.
const SECTIONS: &[&str] = &["bot", "telegram", "storage", "shop", "dispatch"];

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/flowershop/flowershop.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "flowershop.toml";

/// Per-user XDG config file, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("flowershop/flowershop.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/flowershop/flowershop.toml`
/// 3. `~/.config/flowershop/flowershop.toml`
/// 4. `./flowershop.toml`
/// 5. `FLOWERSHOP_*` environment variables
pub fn load_config() -> Result<FlowershopConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<FlowershopConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlowershopConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FlowershopConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlowershopConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FlowershopConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping `FLOWERSHOP_<SECTION>_<KEY>` to `section.key`.
///
/// Only the first underscore after a known section name is a separator, so
/// `FLOWERSHOP_TELEGRAM_BOT_TOKEN` maps to `telegram.bot_token`.
fn env_provider() -> Env {
    Env::prefixed("FLOWERSHOP_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config key.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("telegram_bot_token"), "telegram.bot_token");
        assert_eq!(
            map_env_key("telegram_payment_provider_token"),
            "telegram.payment_provider_token"
        );
        assert_eq!(map_env_key("shop_delivery_fee"), "shop.delivery_fee");
        assert_eq!(map_env_key("dispatch_send_attempts"), "dispatch.send_attempts");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "flowershop.toml",
                r#"
[shop]
page_size = 4
"#,
            )?;
            jail.set_env("FLOWERSHOP_SHOP_PAGE_SIZE", "6");
            jail.set_env("FLOWERSHOP_TELEGRAM_BOT_TOKEN", "123:ABC");
            let config = load_config_from_path(Path::new("flowershop.toml"))?;
            assert_eq!(config.shop.page_size, 6);
            assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
            Ok(())
        });
    }
}
