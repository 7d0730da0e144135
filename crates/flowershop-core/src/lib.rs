// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Flowershop order engine.
//!
//! This crate provides the error taxonomy, domain types, and adapter traits
//! shared by the dialog engine, the order ledger, the dispatcher, and the
//! storage and transport adapters.

pub mod error;
pub mod outbox;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FlowerError;
pub use outbox::Outbox;
pub use types::{AdapterType, HealthStatus, UserId};

pub use traits::{NotificationGateway, PluginAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;
    use crate::types::*;

    #[test]
    fn error_messages_name_the_failure() {
        let err = FlowerError::not_found("item", ItemId(7));
        assert_eq!(err.to_string(), "item 7 not found");

        let err = FlowerError::IncompleteOrderData {
            missing: vec!["address", "delivery_date"],
        };
        assert_eq!(
            err.to_string(),
            "incomplete order data, missing: address, delivery_date"
        );

        let err = FlowerError::GatewayTimeout {
            duration: std::time::Duration::from_secs(5),
        };
        assert!(err.is_gateway());
        assert!(!FlowerError::Internal("x".into()).is_gateway());
    }

    #[test]
    fn choice_keys_parse_back() {
        let choices = [
            Choice::ConsentAccept,
            Choice::ConsentDecline,
            Choice::Occasion(CategoryId(3)),
            Choice::Price(PriceBracket::Over2000),
            Choice::Page(2),
            Choice::Item(ItemId(11)),
            Choice::MenuOrder,
            Choice::MenuConsult,
            Choice::MenuCollection,
            Choice::PhoneConfirm,
            Choice::PhoneEdit,
            Choice::ToMain,
            Choice::Resume,
            Choice::Restart,
            Choice::Ack(AssignmentId(42)),
        ];
        for choice in choices {
            let key = choice.to_string();
            assert_eq!(Choice::from_str(&key).unwrap(), choice, "key {key}");
        }
        assert_eq!(Choice::Price(PriceBracket::Upto500).to_string(), "price:upto500");
    }

    #[test]
    fn malformed_choice_keys_are_rejected() {
        for key in ["", "page", "page:x", "item:", "menu:nope", "price:cheap", "foo:bar"] {
            assert!(Choice::from_str(key).is_err(), "{key} should not parse");
        }
    }

    #[test]
    fn order_status_only_moves_forward() {
        use OrderStatus::*;
        assert!(New.can_advance_to(InWork));
        assert!(New.can_advance_to(Delivered));
        assert!(InWork.can_advance_to(Canceled));
        assert!(!Delivered.can_advance_to(New));
        assert!(!Delivered.can_advance_to(Canceled));
        assert!(!Canceled.can_advance_to(InWork));
        assert!(!InWork.can_advance_to(New));
        assert!(!New.can_advance_to(New));
        assert!(Delivered.is_terminal() && Canceled.is_terminal());
        assert_eq!(OrderStatus::from_str("in_work").unwrap(), InWork);
        assert_eq!(InWork.to_string(), "in_work");
    }

    #[test]
    fn predecessors_agree_with_can_advance_to() {
        use OrderStatus::*;
        for to in [New, InWork, Delivered, Canceled] {
            for from in [New, InWork, Delivered, Canceled] {
                assert_eq!(
                    to.predecessors().contains(&from),
                    from.can_advance_to(to),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn draft_reports_missing_fields() {
        let mut draft = OrderDraft::default();
        assert_eq!(draft.missing().len(), 5);
        draft.item_id = Some(ItemId(1));
        draft.recipient_name = Some("Анна".into());
        draft.address = Some("г. Москва, ул. Ленина, д. 1".into());
        assert_eq!(draft.missing(), vec!["delivery_date", "delivery_time"]);
    }

    #[test]
    fn price_brackets_have_labels_and_bounds() {
        assert_eq!(PriceBracket::Upto500.label(), "~500");
        assert_eq!(
            PriceBracket::Over2000.bounds(),
            (Some(Decimal::from(2000)), None)
        );
        assert_eq!(PriceBracket::Any.bounds(), (None, None));
        assert_eq!(PriceBracket::ALL.len(), 5);
    }

    #[test]
    fn inbound_event_user_lookup() {
        let ev = InboundEvent::UserText {
            user: UserId::from("9"),
            text: "hi".into(),
        };
        assert_eq!(ev.user(), Some(&UserId::from("9")));
        assert_eq!(ev.kind(), "user_text");
        let ack = InboundEvent::WorkerAcknowledged {
            assignment_id: AssignmentId(1),
            from: "700".into(),
        };
        assert_eq!(ack.user(), None);
    }

    #[test]
    fn adapter_type_round_trips() {
        for variant in [AdapterType::Gateway, AdapterType::Storage] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
        let json = serde_json::to_string(&AdapterType::Storage).expect("should serialize");
        let parsed: AdapterType = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(parsed, AdapterType::Storage);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_gateway<T: NotificationGateway>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
    }
}
