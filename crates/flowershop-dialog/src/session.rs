// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user dialog session: the current state plus the answers collected so far.
//!
//! Sessions are persisted as a state name and a JSON object of fields. The
//! set of fields a state may carry is fixed by [`allowed_fields`], and
//! [`SessionFields::prune_for`] drops everything else before each save.

use chrono::NaiveDate;
use flowershop_core::types::{
    CategoryId, ItemId, OrderDraft, PriceBracket, SessionRecord, UserId,
};
use flowershop_core::FlowerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// States of the ordering conversation.
///
/// `Complete` and `ConsultationRequested` are terminal and never persisted:
/// reaching them deletes the session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    Start,
    AwaitingConsent,
    ChoosingOccasion,
    ChoosingPrice,
    BrowsingItems,
    ItemSelected,
    AwaitingRecipientName,
    AwaitingAddress,
    AwaitingDate,
    AwaitingTime,
    AwaitingPaymentConfirmation,
    AwaitingPhone,
    AwaitingPhoneConfirmation,
    Complete,
    ConsultationRequested,
}

impl DialogState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DialogState::Complete | DialogState::ConsultationRequested
        )
    }

    /// Whether the user has accepted the consent document in this state.
    pub fn after_consent(self) -> bool {
        !matches!(self, DialogState::Start | DialogState::AwaitingConsent)
    }
}

/// Names of the individual session fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FieldKey {
    Occasion,
    Price,
    Page,
    Item,
    RecipientName,
    Address,
    DeliveryDate,
    DeliveryTime,
    InvoicePayload,
    Phone,
}

/// Fields each state may hold.
pub fn allowed_fields(state: DialogState) -> &'static [FieldKey] {
    use FieldKey::*;
    match state {
        DialogState::Start
        | DialogState::AwaitingConsent
        | DialogState::ChoosingOccasion
        | DialogState::AwaitingPhone
        | DialogState::Complete
        | DialogState::ConsultationRequested => &[],
        DialogState::ChoosingPrice => &[Occasion],
        DialogState::BrowsingItems => &[Occasion, Price, Page],
        DialogState::ItemSelected => &[Occasion, Price, Page, Item],
        DialogState::AwaitingRecipientName => &[Occasion, Item],
        DialogState::AwaitingAddress => &[Occasion, Item, RecipientName],
        DialogState::AwaitingDate => &[Occasion, Item, RecipientName, Address],
        DialogState::AwaitingTime => &[Occasion, Item, RecipientName, Address, DeliveryDate],
        DialogState::AwaitingPaymentConfirmation => &[
            Occasion,
            Item,
            RecipientName,
            Address,
            DeliveryDate,
            DeliveryTime,
            InvoicePayload,
        ],
        DialogState::AwaitingPhoneConfirmation => &[Phone],
    }
}

/// The part of a catalog item remembered once it is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedItem {
    pub id: ItemId,
    pub name: String,
    pub price: Decimal,
}

/// Answers accumulated during the dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occasion: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceBracket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<SelectedItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl SessionFields {
    /// Keys that currently hold a value.
    pub fn keys(&self) -> Vec<FieldKey> {
        let mut keys = Vec::new();
        let mut push = |present: bool, key| {
            if present {
                keys.push(key);
            }
        };
        push(self.occasion.is_some(), FieldKey::Occasion);
        push(self.price.is_some(), FieldKey::Price);
        push(self.page.is_some(), FieldKey::Page);
        push(self.item.is_some(), FieldKey::Item);
        push(self.recipient_name.is_some(), FieldKey::RecipientName);
        push(self.address.is_some(), FieldKey::Address);
        push(self.delivery_date.is_some(), FieldKey::DeliveryDate);
        push(self.delivery_time.is_some(), FieldKey::DeliveryTime);
        push(self.invoice_payload.is_some(), FieldKey::InvoicePayload);
        push(self.phone.is_some(), FieldKey::Phone);
        keys
    }

    /// Drop every field `state` is not allowed to hold.
    pub fn prune_for(&mut self, state: DialogState) {
        let allowed = allowed_fields(state);
        let keep = |key: FieldKey| allowed.contains(&key);
        if !keep(FieldKey::Occasion) {
            self.occasion = None;
        }
        if !keep(FieldKey::Price) {
            self.price = None;
        }
        if !keep(FieldKey::Page) {
            self.page = None;
        }
        if !keep(FieldKey::Item) {
            self.item = None;
        }
        if !keep(FieldKey::RecipientName) {
            self.recipient_name = None;
        }
        if !keep(FieldKey::Address) {
            self.address = None;
        }
        if !keep(FieldKey::DeliveryDate) {
            self.delivery_date = None;
        }
        if !keep(FieldKey::DeliveryTime) {
            self.delivery_time = None;
        }
        if !keep(FieldKey::InvoicePayload) {
            self.invoice_payload = None;
        }
        if !keep(FieldKey::Phone) {
            self.phone = None;
        }
    }

    /// The order fields collected so far.
    pub fn draft(&self) -> OrderDraft {
        OrderDraft {
            item_id: self.item.as_ref().map(|i| i.id),
            recipient_name: self.recipient_name.clone(),
            address: self.address.clone(),
            delivery_date: self.delivery_date,
            delivery_time: self.delivery_time.clone(),
        }
    }
}

/// A user's conversation position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogSession {
    pub user: UserId,
    pub state: DialogState,
    pub fields: SessionFields,
    /// Storage version; 0 for a session that was never saved.
    pub version: i64,
}

impl DialogSession {
    /// A fresh session in `Start` with no fields.
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            state: DialogState::Start,
            fields: SessionFields::default(),
            version: 0,
        }
    }

    /// Move to `state`, keeping only the fields it allows.
    pub fn enter(mut self, state: DialogState) -> Self {
        self.state = state;
        self.fields.prune_for(state);
        self
    }

    pub fn from_record(record: &SessionRecord) -> Result<Self, FlowerError> {
        let state: DialogState = record.state.parse().map_err(|e| FlowerError::Persistence {
            source: Box::new(e),
        })?;
        let mut fields: SessionFields =
            serde_json::from_str(&record.fields).map_err(|e| FlowerError::Persistence {
                source: Box::new(e),
            })?;
        fields.prune_for(state);
        Ok(Self {
            user: record.user_id.clone(),
            state,
            fields,
            version: record.version,
        })
    }

    /// JSON encoding of the fields for storage.
    pub fn fields_json(&self) -> Result<String, FlowerError> {
        serde_json::to_string(&self.fields).map_err(|e| FlowerError::Internal(e.to_string()))
    }
}
