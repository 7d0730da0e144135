// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion between Telegram updates and Flowershop events.
//!
//! Incoming messages and callback queries become [`InboundEvent`]s; outbound
//! buttons and invoice lines become Telegram keyboards and prices.

use flowershop_core::FlowerError;
use flowershop_core::UserId;
use flowershop_core::types::{Choice, ChoiceButton, InboundEvent, LineItem};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use teloxide::prelude::*;
use teloxide::types::{ChatKind, InlineKeyboardButton, InlineKeyboardMarkup, LabeledPrice};
use tracing::debug;

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

fn sender(msg: &Message) -> Option<UserId> {
    msg.from.as_ref().map(|u| UserId(u.id.0.to_string()))
}

/// Maps a customer message to an event.
///
/// `/start` (with or without a deep-link payload) starts the dialog, a
/// successful payment confirms it, and any other text is a free-text answer.
/// Stickers, photos, and the like yield `None`.
pub fn message_event(msg: &Message) -> Option<InboundEvent> {
    let user = sender(msg)?;

    if let Some(payment) = msg.successful_payment() {
        let transaction_ref = serde_json::to_value(payment)
            .ok()?
            .get("telegram_payment_charge_id")?
            .as_str()?
            .to_string();
        return Some(InboundEvent::PaymentConfirmed {
            user,
            transaction_ref,
            amount: major_units(payment.total_amount),
        });
    }

    let text = msg.text()?;
    if text == "/start" || text.starts_with("/start ") {
        return Some(InboundEvent::UserStarted { user });
    }
    Some(InboundEvent::UserText {
        user,
        text: text.to_string(),
    })
}

/// Maps a button press to an event. `ack:<id>` presses come from workers.
pub fn callback_event(q: &CallbackQuery) -> Option<InboundEvent> {
    let data = q.data.as_deref()?;
    let choice: Choice = match data.parse() {
        Ok(choice) => choice,
        Err(e) => {
            debug!(error = %e, "ignoring unknown callback data");
            return None;
        }
    };
    Some(match choice {
        Choice::Ack(assignment_id) => InboundEvent::WorkerAcknowledged {
            assignment_id,
            from: q.from.id.0.to_string(),
        },
        choice => InboundEvent::UserChoice {
            user: UserId(q.from.id.0.to_string()),
            choice,
        },
    })
}

/// Inline keyboard for button rows. `None` when there are no buttons.
pub fn keyboard(rows: &[Vec<ChoiceButton>]) -> Option<InlineKeyboardMarkup> {
    if rows.iter().all(|r| r.is_empty()) {
        return None;
    }
    Some(InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.choice.to_string()))
            .collect::<Vec<_>>()
    })))
}

/// Invoice prices in minor currency units.
pub fn labeled_prices(items: &[LineItem]) -> Result<Vec<LabeledPrice>, FlowerError> {
    items
        .iter()
        .map(|item| {
            let amount = minor_units(item.amount).ok_or_else(|| FlowerError::Gateway {
                message: format!("amount {} of `{}` cannot be invoiced", item.amount, item.label),
                source: None,
            })?;
            Ok(LabeledPrice {
                label: item.label.clone(),
                amount,
            })
        })
        .collect()
}

/// Rubles to kopecks. `None` for negative or oversized amounts.
pub fn minor_units(amount: Decimal) -> Option<u32> {
    (amount * Decimal::ONE_HUNDRED).round().to_u32()
}

/// Kopecks to rubles.
pub fn major_units(total: u32) -> Decimal {
    Decimal::new(i64::from(total), 2)
}

/// Parses a stored chat identity.
pub fn chat_id(contact: &str) -> Result<ChatId, FlowerError> {
    contact
        .parse::<i64>()
        .map(ChatId)
        .map_err(|e| FlowerError::Gateway {
            message: format!("invalid chat id `{contact}`: {e}"),
            source: None,
        })
}
