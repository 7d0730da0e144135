// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top-level Flowershop configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FlowershopConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram Bot API and payments.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Catalog presentation and pricing.
    #[serde(default)]
    pub shop: ShopConfig,

    /// Outbound delivery limits.
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in logs.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "flowershop".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables Telegram integration.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Payment provider token passed with invoices.
    #[serde(default)]
    pub payment_provider_token: Option<String>,

    /// ISO 4217 currency code for invoices.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            payment_provider_token: None,
            currency: default_currency(),
        }
    }
}

fn default_currency() -> String {
    "RUB".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("flowershop").join("flowershop.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("flowershop.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Shop presentation and pricing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ShopConfig {
    /// Bouquets shown per catalog page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Flat delivery fee added to every order.
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: Decimal,

    /// Personal-data consent document sent on /start.
    #[serde(default = "default_consent_document")]
    pub consent_document: String,

    /// Photo used for bouquets without their own.
    #[serde(default = "default_item_photo_fallback")]
    pub item_photo_fallback: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            delivery_fee: default_delivery_fee(),
            consent_document: default_consent_document(),
            item_photo_fallback: default_item_photo_fallback(),
        }
    }
}

fn default_page_size() -> u32 {
    3
}

fn default_delivery_fee() -> Decimal {
    Decimal::from(500)
}

fn default_consent_document() -> String {
    "form.pdf".to_string()
}

fn default_item_photo_fallback() -> String {
    "image/4.jpg".to_string()
}

/// Outbound delivery limits for the notification gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Per-attempt timeout for a single outbound send.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,

    /// Attempts per outbound action before it is reported as failed.
    #[serde(default = "default_send_attempts")]
    pub send_attempts: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            send_timeout_secs: default_send_timeout_secs(),
            send_attempts: default_send_attempts(),
        }
    }
}

fn default_send_timeout_secs() -> u64 {
    10
}

fn default_send_attempts() -> u32 {
    2
}
