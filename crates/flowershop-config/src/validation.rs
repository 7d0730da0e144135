// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, positive limits, and currency code shape.

use crate::diagnostic::ConfigError;
use crate::model::FlowershopConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &FlowershopConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.bot.log_level.as_str()) {
        fail(format!(
            "bot.log_level `{}` must be one of: {}",
            config.bot.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let currency = &config.telegram.currency;
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        fail(format!(
            "telegram.currency `{currency}` must be a 3-letter uppercase ISO 4217 code"
        ));
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        fail("telegram.bot_token must not be empty when set".to_string());
    }

    if config.shop.page_size == 0 {
        fail("shop.page_size must be at least 1".to_string());
    }

    if config.shop.delivery_fee.is_sign_negative() {
        fail(format!(
            "shop.delivery_fee must be non-negative, got {}",
            config.shop.delivery_fee
        ));
    }

    if config.dispatch.send_timeout_secs == 0 {
        fail("dispatch.send_timeout_secs must be at least 1".to_string());
    }

    if config.dispatch.send_attempts == 0 {
        fail("dispatch.send_attempts must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&FlowershopConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_violation() {
        let mut config = FlowershopConfig::default();
        config.storage.database_path = "  ".into();
        config.shop.page_size = 0;
        config.shop.delivery_fee = Decimal::from(-1);
        config.dispatch.send_attempts = 0;
        config.telegram.currency = "rub".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = FlowershopConfig::default();
        config.bot.log_level = "loud".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("bot.log_level"));
    }

    #[test]
    fn rejects_blank_bot_token() {
        let mut config = FlowershopConfig::default();
        config.telegram.bot_token = Some(String::new());
        assert!(validate_config(&config).is_err());
    }
}
