// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Flowershop configuration system.

use flowershop_config::diagnostic::ConfigError;
use flowershop_config::model::FlowershopConfig;
use flowershop_config::{load_and_validate_str, load_config_from_str};
use rust_decimal::Decimal;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_flowershop_config() {
    let toml = r#"
[bot]
name = "roses"
log_level = "debug"

[telegram]
bot_token = "123:ABC"
payment_provider_token = "381764678:TEST:1"
currency = "RUB"

[storage]
database_path = "/tmp/shop.db"
wal_mode = false

[shop]
page_size = 5
delivery_fee = 350
consent_document = "docs/consent.pdf"
item_photo_fallback = "img/default.jpg"

[dispatch]
send_timeout_secs = 3
send_attempts = 4
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.name, "roses");
    assert_eq!(config.bot.log_level, "debug");
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(
        config.telegram.payment_provider_token.as_deref(),
        Some("381764678:TEST:1")
    );
    assert_eq!(config.storage.database_path, "/tmp/shop.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.shop.page_size, 5);
    assert_eq!(config.shop.delivery_fee, Decimal::from(350));
    assert_eq!(config.shop.consent_document, "docs/consent.pdf");
    assert_eq!(config.dispatch.send_timeout_secs, 3);
    assert_eq!(config.dispatch.send_attempts, 4);
}

/// Missing sections fall back to defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty config should load");
    assert_eq!(config.bot.name, "flowershop");
    assert_eq!(config.shop.page_size, 3);
    assert_eq!(config.shop.delivery_fee, Decimal::from(500));
    assert_eq!(config.shop.consent_document, "form.pdf");
    assert_eq!(config.telegram.currency, "RUB");
    assert!(config.telegram.bot_token.is_none());
    assert!(config.storage.wal_mode);
}

/// Decimal fees may be written as strings or floats.
#[test]
fn delivery_fee_accepts_string_and_float() {
    let config = load_config_from_str("[shop]\ndelivery_fee = \"499.90\"\n").unwrap();
    assert_eq!(config.shop.delivery_fee, Decimal::new(49990, 2));

    let config = load_config_from_str("[shop]\ndelivery_fee = 250.5\n").unwrap();
    assert_eq!(config.shop.delivery_fee, Decimal::new(2505, 1));
}

/// Unknown field in [shop] produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_field_in_shop_suggests_correction() {
    let errors = load_and_validate_str("[shop]\npage_sise = 3\n").unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "page_sise");
            assert_eq!(suggestion.as_deref(), Some("page_size"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unknown top-level section is rejected.
#[test]
fn unknown_section_is_rejected() {
    let err = load_config_from_str("[agent]\nname = \"x\"\n").expect_err("should reject");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("agent"),
        "error should mention the bad key, got: {err_str}"
    );
}

/// Wrong value types surface as InvalidType.
#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[shop]\npage_size = \"three\"\n").unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got {errors:?}"
    );
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[shop]
page_size = 0

[dispatch]
send_timeout_secs = 0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

/// Default config serializes and re-parses cleanly.
#[test]
fn default_config_serializes_to_toml() {
    let config = FlowershopConfig::default();
    let text = toml::to_string(&config).expect("serialize");
    let parsed = load_and_validate_str(&text).expect("round-trip should validate");
    assert_eq!(parsed.shop.page_size, config.shop.page_size);
    assert_eq!(parsed.shop.delivery_fee, config.shop.delivery_fee);
}
