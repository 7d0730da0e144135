// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Flowershop workspace.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Transport-level identity of a customer (Telegram user id, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Primary key of a catalog category (occasion).
    CategoryId
);
row_id!(
    /// Primary key of a catalog item (bouquet).
    ItemId
);
row_id!(
    /// Primary key of an order.
    OrderId
);
row_id!(
    /// Primary key of a courier or florist.
    WorkerId
);
row_id!(
    /// Primary key of an assignment record.
    AssignmentId
);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Gateway,
    Storage,
}

// --- Catalog ---

/// An occasion the customer is shopping for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A bouquet in the catalog. Read-only from the engine's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    /// Flower composition text.
    pub structure: String,
    pub price: Decimal,
    pub category_id: CategoryId,
    /// File path, URL, or transport file id of the bouquet photo.
    pub photo: Option<String>,
}

/// Price filter offered to the customer.
///
/// The three capped brackets are half-open `(lower, upper]` ranges so that
/// every price falls into exactly one of them or into `Over2000`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PriceBracket {
    Upto500,
    Upto1000,
    Upto2000,
    Over2000,
    Any,
}

impl PriceBracket {
    /// All brackets in declaration order.
    pub const ALL: [PriceBracket; 5] = [
        PriceBracket::Upto500,
        PriceBracket::Upto1000,
        PriceBracket::Upto2000,
        PriceBracket::Over2000,
        PriceBracket::Any,
    ];

    /// Exclusive lower and inclusive upper bound. `None` means unbounded.
    pub fn bounds(self) -> (Option<Decimal>, Option<Decimal>) {
        match self {
            PriceBracket::Upto500 => (None, Some(Decimal::from(500))),
            PriceBracket::Upto1000 => (Some(Decimal::from(500)), Some(Decimal::from(1000))),
            PriceBracket::Upto2000 => (Some(Decimal::from(1000)), Some(Decimal::from(2000))),
            PriceBracket::Over2000 => (Some(Decimal::from(2000)), None),
            PriceBracket::Any => (None, None),
        }
    }

    /// Button label shown to the customer.
    pub fn label(self) -> &'static str {
        match self {
            PriceBracket::Upto500 => "~500",
            PriceBracket::Upto1000 => "~1000",
            PriceBracket::Upto2000 => "~2000",
            PriceBracket::Over2000 => "Больше",
            PriceBracket::Any => "Не важно",
        }
    }
}

// --- Orders ---

/// Order lifecycle status. Transitions only move forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    InWork,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    /// Whether moving from `self` to `next` respects the monotonic lifecycle.
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        match (self, next) {
            (OrderStatus::New, OrderStatus::InWork)
            | (OrderStatus::New, OrderStatus::Delivered)
            | (OrderStatus::New, OrderStatus::Canceled)
            | (OrderStatus::InWork, OrderStatus::Delivered)
            | (OrderStatus::InWork, OrderStatus::Canceled) => true,
            _ => false,
        }
    }

    /// Statuses from which `self` may be entered.
    pub fn predecessors(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::New => &[],
            OrderStatus::InWork => &[OrderStatus::New],
            OrderStatus::Delivered | OrderStatus::Canceled => {
                &[OrderStatus::New, OrderStatus::InWork]
            }
        }
    }
}

/// Order fields accumulated by the dialog before payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub item_id: Option<ItemId>,
    pub recipient_name: Option<String>,
    pub address: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<String>,
}

impl OrderDraft {
    /// Names of the required fields that are still absent.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.item_id.is_none() {
            missing.push("item");
        }
        if self.recipient_name.is_none() {
            missing.push("recipient_name");
        }
        if self.address.is_none() {
            missing.push("address");
        }
        if self.delivery_date.is_none() {
            missing.push("delivery_date");
        }
        if self.delivery_time.is_none() {
            missing.push("delivery_time");
        }
        missing
    }
}

/// The payment processor's confirmation signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub transaction_ref: String,
    pub amount: Decimal,
}

/// A validated order ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub recipient_name: String,
    pub address: String,
    pub delivery_date: NaiveDate,
    pub delivery_time: String,
    pub total_price: Decimal,
    pub amount_paid: Decimal,
    pub payment_ref: String,
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub recipient_name: String,
    pub address: String,
    pub delivery_date: NaiveDate,
    pub delivery_time: String,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub amount_paid: Decimal,
    pub payment_ref: String,
    pub courier_id: Option<WorkerId>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

/// Result of an idempotent order insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order: Order,
    /// `false` when the payment reference had already produced this order.
    pub created: bool,
}

// --- Workers and assignments ---

/// Worker role, used to select the assignment pool.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    Courier,
    Florist,
}

/// Availability of a worker. Managed outside the engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Active,
    OnLeave,
    Unavailable,
}

/// A courier or florist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub kind: WorkerKind,
    pub name: String,
    /// Transport chat identity used for notifications.
    pub contact: String,
    pub status: WorkerStatus,
}

/// A unit of work handed to a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub kind: WorkerKind,
    pub worker_id: WorkerId,
    /// Absent for pure florist consultations.
    pub order_id: Option<OrderId>,
    /// Customer phone for florist callbacks.
    pub contact_phone: Option<String>,
    pub assigned_at: String,
    pub acknowledged: bool,
    pub acknowledged_at: Option<String>,
}

/// Result of an acknowledgment. Both variants are successes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    Acknowledged(Assignment),
    AlreadyAcknowledged(Assignment),
}

impl AckOutcome {
    pub fn assignment(&self) -> &Assignment {
        match self {
            AckOutcome::Acknowledged(a) | AckOutcome::AlreadyAcknowledged(a) => a,
        }
    }
}

// --- Sessions ---

/// Storage representation of a dialog session.
///
/// `state` is the snake_case state name and `fields` the JSON-encoded
/// accumulated answers; the dialog crate owns their typed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub state: String,
    pub fields: String,
    pub version: i64,
    pub updated_at: String,
}

// --- Transport events ---

/// A structured choice a user can make by pressing a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    ConsentAccept,
    ConsentDecline,
    Occasion(CategoryId),
    Price(PriceBracket),
    Page(u32),
    Item(ItemId),
    MenuOrder,
    MenuConsult,
    MenuCollection,
    PhoneConfirm,
    PhoneEdit,
    ToMain,
    Resume,
    Restart,
    Ack(AssignmentId),
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::ConsentAccept => f.write_str("consent:accept"),
            Choice::ConsentDecline => f.write_str("consent:decline"),
            Choice::Occasion(id) => write!(f, "occasion:{id}"),
            Choice::Price(bracket) => write!(f, "price:{bracket}"),
            Choice::Page(n) => write!(f, "page:{n}"),
            Choice::Item(id) => write!(f, "item:{id}"),
            Choice::MenuOrder => f.write_str("menu:order"),
            Choice::MenuConsult => f.write_str("menu:consult"),
            Choice::MenuCollection => f.write_str("menu:collection"),
            Choice::PhoneConfirm => f.write_str("phone:confirm"),
            Choice::PhoneEdit => f.write_str("phone:edit"),
            Choice::ToMain => f.write_str("nav:main"),
            Choice::Resume => f.write_str("session:resume"),
            Choice::Restart => f.write_str("session:restart"),
            Choice::Ack(id) => write!(f, "ack:{id}"),
        }
    }
}

/// Error returned when a choice key is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown choice key `{0}`")]
pub struct UnknownChoice(pub String);

impl FromStr for Choice {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownChoice(s.to_string());
        let (prefix, value) = s.split_once(':').ok_or_else(unknown)?;
        let int = |v: &str| v.parse::<i64>().map_err(|_| unknown());
        let choice = match (prefix, value) {
            ("consent", "accept") => Choice::ConsentAccept,
            ("consent", "decline") => Choice::ConsentDecline,
            ("occasion", v) => Choice::Occasion(CategoryId(int(v)?)),
            ("price", v) => Choice::Price(v.parse().map_err(|_| unknown())?),
            ("page", v) => Choice::Page(v.parse().map_err(|_| unknown())?),
            ("item", v) => Choice::Item(ItemId(int(v)?)),
            ("menu", "order") => Choice::MenuOrder,
            ("menu", "consult") => Choice::MenuConsult,
            ("menu", "collection") => Choice::MenuCollection,
            ("phone", "confirm") => Choice::PhoneConfirm,
            ("phone", "edit") => Choice::PhoneEdit,
            ("nav", "main") => Choice::ToMain,
            ("session", "resume") => Choice::Resume,
            ("session", "restart") => Choice::Restart,
            ("ack", v) => Choice::Ack(AssignmentId(int(v)?)),
            _ => return Err(unknown()),
        };
        Ok(choice)
    }
}

/// A labelled button carrying a [`Choice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceButton {
    pub label: String,
    pub choice: Choice,
}

impl ChoiceButton {
    pub fn new(label: impl Into<String>, choice: Choice) -> Self {
        Self {
            label: label.into(),
            choice,
        }
    }
}

/// One invoice line. Amount in major currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub label: String,
    pub amount: Decimal,
}

/// Events surfaced by the notification gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundEvent {
    UserStarted {
        user: UserId,
    },
    UserText {
        user: UserId,
        text: String,
    },
    UserChoice {
        user: UserId,
        choice: Choice,
    },
    PaymentConfirmed {
        user: UserId,
        transaction_ref: String,
        amount: Decimal,
    },
    /// `from` is the presser's private chat id, compared against the
    /// assigned worker's contact.
    WorkerAcknowledged {
        assignment_id: AssignmentId,
        from: String,
    },
}

impl InboundEvent {
    /// The customer this event belongs to, if any.
    pub fn user(&self) -> Option<&UserId> {
        match self {
            InboundEvent::UserStarted { user }
            | InboundEvent::UserText { user, .. }
            | InboundEvent::UserChoice { user, .. }
            | InboundEvent::PaymentConfirmed { user, .. } => Some(user),
            InboundEvent::WorkerAcknowledged { .. } => None,
        }
    }

    /// Short event name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::UserStarted { .. } => "user_started",
            InboundEvent::UserText { .. } => "user_text",
            InboundEvent::UserChoice { .. } => "user_choice",
            InboundEvent::PaymentConfirmed { .. } => "payment_confirmed",
            InboundEvent::WorkerAcknowledged { .. } => "worker_acknowledged",
        }
    }
}

/// Actions the engine asks the notification gateway to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundAction {
    /// Text with buttons laid out in rows.
    Prompt {
        user: UserId,
        text: String,
        choices: Vec<Vec<ChoiceButton>>,
    },
    SendDocument {
        user: UserId,
        doc_ref: String,
    },
    SendPhoto {
        user: UserId,
        photo_ref: String,
    },
    RequestPayment {
        user: UserId,
        title: String,
        description: String,
        line_items: Vec<LineItem>,
        payload_ref: String,
    },
    NotifyWorker {
        worker_id: WorkerId,
        contact: String,
        text: String,
        ack: Option<ChoiceButton>,
    },
}

impl OutboundAction {
    /// Plain prompt without buttons.
    pub fn text(user: &UserId, text: impl Into<String>) -> Self {
        OutboundAction::Prompt {
            user: user.clone(),
            text: text.into(),
            choices: Vec::new(),
        }
    }

    /// Short action name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundAction::Prompt { .. } => "prompt",
            OutboundAction::SendDocument { .. } => "send_document",
            OutboundAction::SendPhoto { .. } => "send_photo",
            OutboundAction::RequestPayment { .. } => "request_payment",
            OutboundAction::NotifyWorker { .. } => "notify_worker",
        }
    }
}
