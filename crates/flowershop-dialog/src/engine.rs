// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialog transition table.
//!
//! [`transition`] is a pure function of the current session, one customer
//! input, and a read-only [`EngineContext`]. It returns the next session,
//! how to persist it, what to send, and at most one [`Effect`] that needs
//! the order ledger or dispatcher. The caller persists before it sends.

use chrono::NaiveDate;
use flowershop_core::types::{
    CatalogItem, CategoryId, Choice, InboundEvent, OrderDraft, OutboundAction,
    PaymentConfirmation, PriceBracket,
};
use flowershop_core::FlowerError;
use flowershop_orders::ledger::invoice_lines;
use rust_decimal::Decimal;

use crate::catalog::{CatalogSnapshot, paginate};
use crate::prompts;
use crate::session::{DialogSession, DialogState, SelectedItem};
use crate::validate;

/// Read-only inputs the transition table needs besides the session.
#[derive(Debug, Clone, Copy)]
pub struct EngineContext<'a> {
    pub catalog: &'a CatalogSnapshot,
    pub today: NaiveDate,
    pub page_size: u32,
    pub delivery_fee: Decimal,
    pub consent_document: &'a str,
    pub photo_fallback: &'a str,
}

/// A customer's input, stripped of the user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Started,
    Text(String),
    Choice(Choice),
    Payment(PaymentConfirmation),
}

impl Input {
    /// The customer input carried by `event`. Worker acknowledgments have none.
    pub fn from_event(event: &InboundEvent) -> Option<Self> {
        match event {
            InboundEvent::UserStarted { .. } => Some(Input::Started),
            InboundEvent::UserText { text, .. } => Some(Input::Text(text.clone())),
            InboundEvent::UserChoice { choice, .. } => Some(Input::Choice(*choice)),
            InboundEvent::PaymentConfirmed {
                transaction_ref,
                amount,
                ..
            } => Some(Input::Payment(PaymentConfirmation {
                transaction_ref: transaction_ref.clone(),
                amount: *amount,
            })),
            InboundEvent::WorkerAcknowledged { .. } => None,
        }
    }
}

/// What to do with the stored session after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persist {
    Save,
    Delete,
    Unchanged,
}

/// Work that has to happen outside the pure table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Record the paid order (which also deletes the session) and dispatch a courier.
    PlaceOrder {
        draft: OrderDraft,
        payment: PaymentConfirmation,
    },
    /// Hand the confirmed phone number to a florist.
    RequestCallback { phone: String },
    /// A payment arrived outside the payment state; match it to an existing order.
    ReconcilePayment { payment: PaymentConfirmation },
}

/// Result of one step of the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: DialogSession,
    pub persist: Persist,
    pub outbound: Vec<OutboundAction>,
    pub effect: Option<Effect>,
}

impl Transition {
    fn save(session: DialogSession, outbound: Vec<OutboundAction>) -> Self {
        Self {
            session,
            persist: Persist::Save,
            outbound,
            effect: None,
        }
    }

    fn stay(session: &DialogSession, outbound: Vec<OutboundAction>) -> Self {
        Self {
            session: session.clone(),
            persist: Persist::Unchanged,
            outbound,
            effect: None,
        }
    }

    fn delete(session: DialogSession, outbound: Vec<OutboundAction>) -> Self {
        Self {
            session,
            persist: Persist::Delete,
            outbound,
            effect: None,
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }
}

/// Compute the next step for `session` given `input`.
pub fn transition(session: &DialogSession, input: &Input, ctx: &EngineContext<'_>) -> Transition {
    use Choice as C;
    use DialogState as S;

    let user = &session.user;
    match (session.state, input) {
        // Navigation available everywhere.
        (_, Input::Choice(C::Restart)) => start(session, ctx),
        (S::Start, Input::Started) => start(session, ctx),
        (_, Input::Started) => Transition::stay(session, vec![prompts::resume_offer(user)]),
        (_, Input::Choice(C::Resume)) => Transition::stay(session, render_prompt(session, ctx)),
        (state, Input::Choice(C::ToMain)) if state.after_consent() => to_main(session, ctx, vec![]),

        // Consent.
        (S::AwaitingConsent, Input::Choice(C::ConsentAccept)) => {
            to_main(session, ctx, vec![prompts::consent_thanks(user)])
        }
        (S::AwaitingConsent, Input::Choice(C::ConsentDecline)) => Transition::delete(
            DialogSession::new(user.clone()),
            vec![prompts::consent_declined(user)],
        ),

        // Occasion and price.
        (S::ChoosingOccasion, Input::Choice(C::Occasion(id))) => {
            if ctx.catalog.category(*id).is_none() {
                return Transition::stay(session, render_prompt(session, ctx));
            }
            let mut next = session.clone().enter(S::ChoosingPrice);
            next.fields.occasion = Some(*id);
            Transition::save(next, vec![prompts::prices(user)])
        }
        (S::ChoosingOccasion | S::ItemSelected, Input::Choice(C::MenuConsult)) => Transition::save(
            session.clone().enter(S::AwaitingPhone),
            vec![prompts::ask_phone(user)],
        ),
        (S::ChoosingPrice, Input::Choice(C::Price(bracket))) => {
            let Some(occasion) = session.fields.occasion else {
                return to_main(session, ctx, vec![]);
            };
            if ctx.catalog.filter(occasion, *bracket).is_empty() {
                return Transition::stay(
                    session,
                    vec![prompts::no_matches(user), prompts::prices(user)],
                );
            }
            browse(session, ctx, occasion, *bracket, vec![])
        }

        // Browsing.
        (S::BrowsingItems, Input::Choice(C::Page(n))) => {
            let (occasion, bracket) = listing_filter(session);
            let items = ctx.catalog.filter(occasion, bracket);
            let page = paginate(&items, *n, ctx.page_size);
            let outbound = vec![prompts::item_page(user, &page)];
            if page.in_range() {
                let mut next = session.clone();
                next.fields.page = Some(*n);
                Transition::save(next, outbound)
            } else {
                Transition::stay(session, outbound)
            }
        }
        (S::BrowsingItems, Input::Choice(C::Item(id))) => match ctx.catalog.item(*id) {
            Some(item) => select_item(session, ctx, item),
            None => item_unavailable(session, ctx),
        },
        (S::ItemSelected, Input::Choice(C::MenuOrder)) => Transition::save(
            session.clone().enter(S::AwaitingRecipientName),
            vec![prompts::ask_recipient_name(user)],
        ),
        (S::ItemSelected, Input::Choice(C::MenuCollection)) => {
            let (occasion, _) = listing_filter(session);
            browse(
                session,
                ctx,
                occasion,
                PriceBracket::Any,
                vec![prompts::back_to_catalog(user)],
            )
        }

        // Order details.
        (S::AwaitingRecipientName, Input::Text(text)) => match validate::recipient_name(text) {
            Ok(name) => {
                let mut next = session.clone().enter(S::AwaitingAddress);
                next.fields.recipient_name = Some(name);
                Transition::save(next, vec![prompts::ask_address(user)])
            }
            Err(e) => reprompt(session, e),
        },
        (S::AwaitingAddress, Input::Text(text)) => match validate::address(text) {
            Ok(address) => {
                let mut next = session.clone().enter(S::AwaitingDate);
                next.fields.address = Some(address);
                Transition::save(next, vec![prompts::ask_date(user)])
            }
            Err(e) => reprompt(session, e),
        },
        (S::AwaitingDate, Input::Text(text)) => match validate::delivery_date(text, ctx.today) {
            Ok(date) => {
                let mut next = session.clone().enter(S::AwaitingTime);
                next.fields.delivery_date = Some(date);
                Transition::save(next, vec![prompts::ask_time(user)])
            }
            Err(e) => reprompt(session, e),
        },
        (S::AwaitingTime, Input::Text(text)) => match validate::delivery_time(text) {
            Ok(time) => {
                let Some(item) = session.fields.item.clone() else {
                    return to_main(session, ctx, vec![prompts::incomplete_order(user)]);
                };
                if ctx.catalog.item(item.id).is_none() {
                    return item_unavailable(session, ctx);
                }
                let mut next = session.clone().enter(S::AwaitingPaymentConfirmation);
                next.fields.delivery_time = Some(time);
                next.fields.invoice_payload = Some(format!("order_{}_{}", item.id, user));
                let outbound = payment_request(&next, ctx);
                Transition::save(next, outbound)
            }
            Err(e) => reprompt(session, e),
        },

        // Payment.
        (S::AwaitingPaymentConfirmation, Input::Payment(payment)) => {
            Transition::stay(session, vec![]).with_effect(Effect::PlaceOrder {
                draft: session.fields.draft(),
                payment: payment.clone(),
            })
        }
        (S::AwaitingPaymentConfirmation, Input::Text(_)) => {
            Transition::stay(session, vec![prompts::awaiting_payment(user)])
        }
        (_, Input::Payment(payment)) => {
            Transition::stay(session, vec![]).with_effect(Effect::ReconcilePayment {
                payment: payment.clone(),
            })
        }

        // Consultation.
        (S::AwaitingPhone, Input::Text(text)) => match validate::phone(text) {
            Ok(phone) => {
                let mut next = session.clone().enter(S::AwaitingPhoneConfirmation);
                next.fields.phone = Some(phone.clone());
                Transition::save(next, vec![prompts::confirm_phone(user, &phone)])
            }
            Err(e) => reprompt(session, e),
        },
        (S::AwaitingPhoneConfirmation, Input::Choice(C::PhoneConfirm)) => {
            match session.fields.phone.clone() {
                Some(phone) => Transition::delete(
                    session.clone().enter(S::ConsultationRequested),
                    vec![prompts::callback_promised(user, &phone)],
                )
                .with_effect(Effect::RequestCallback { phone }),
                None => Transition::save(
                    session.clone().enter(S::AwaitingPhone),
                    vec![prompts::ask_phone(user)],
                ),
            }
        }
        (S::AwaitingPhoneConfirmation, Input::Choice(C::PhoneEdit)) => Transition::save(
            session.clone().enter(S::AwaitingPhone),
            vec![prompts::ask_phone(user)],
        ),

        (S::Start, _) => Transition::stay(session, vec![prompts::send_start(user)]),
        _ => {
            let mut outbound = vec![prompts::use_buttons(user)];
            outbound.extend(render_prompt(session, ctx));
            Transition::stay(session, outbound)
        }
    }
}

/// The current state's prompt, rebuilt from the stored fields.
pub fn render_prompt(session: &DialogSession, ctx: &EngineContext<'_>) -> Vec<OutboundAction> {
    use DialogState as S;

    let user = &session.user;
    match session.state {
        S::Start | S::Complete | S::ConsultationRequested => vec![prompts::send_start(user)],
        S::AwaitingConsent => prompts::consent(user, ctx.consent_document),
        S::ChoosingOccasion => vec![prompts::occasions(user, ctx.catalog.categories())],
        S::ChoosingPrice => vec![prompts::prices(user)],
        S::BrowsingItems => {
            let (occasion, bracket) = listing_filter(session);
            let items = ctx.catalog.filter(occasion, bracket);
            let page = paginate(&items, session.fields.page.unwrap_or(1), ctx.page_size);
            vec![prompts::item_page(user, &page)]
        }
        S::ItemSelected => match session
            .fields
            .item
            .as_ref()
            .and_then(|i| ctx.catalog.item(i.id))
        {
            Some(item) => prompts::item_card(user, item, ctx.photo_fallback),
            None => vec![prompts::item_unavailable(user)],
        },
        S::AwaitingRecipientName => vec![prompts::ask_recipient_name(user)],
        S::AwaitingAddress => vec![prompts::ask_address(user)],
        S::AwaitingDate => vec![prompts::ask_date(user)],
        S::AwaitingTime => vec![prompts::ask_time(user)],
        S::AwaitingPaymentConfirmation => payment_request(session, ctx),
        S::AwaitingPhone => vec![prompts::ask_phone(user)],
        S::AwaitingPhoneConfirmation => match session.fields.phone.as_deref() {
            Some(phone) => vec![prompts::confirm_phone(user, phone)],
            None => vec![prompts::ask_phone(user)],
        },
    }
}

/// Where the dialog goes when the ledger reports missing order data.
pub fn order_incomplete(session: &DialogSession, ctx: &EngineContext<'_>) -> Transition {
    to_main(session, ctx, vec![prompts::incomplete_order(&session.user)])
}

/// Where the dialog goes when the selected item vanished before payment.
pub fn order_item_missing(session: &DialogSession, ctx: &EngineContext<'_>) -> Transition {
    item_unavailable(session, ctx)
}

/// Welcome plus consent, from a clean session.
fn start(session: &DialogSession, ctx: &EngineContext<'_>) -> Transition {
    let user = &session.user;
    let mut next = session.clone().enter(DialogState::AwaitingConsent);
    next.fields = Default::default();
    let mut outbound = vec![prompts::welcome(user)];
    outbound.extend(prompts::consent(user, ctx.consent_document));
    Transition::save(next, outbound)
}

fn to_main(
    session: &DialogSession,
    ctx: &EngineContext<'_>,
    mut outbound: Vec<OutboundAction>,
) -> Transition {
    let user = &session.user;
    let next = session.clone().enter(DialogState::ChoosingOccasion);
    outbound.push(prompts::occasions(user, ctx.catalog.categories()));
    Transition::save(next, outbound)
}

fn browse(
    session: &DialogSession,
    ctx: &EngineContext<'_>,
    occasion: CategoryId,
    bracket: PriceBracket,
    mut outbound: Vec<OutboundAction>,
) -> Transition {
    let mut next = session.clone().enter(DialogState::BrowsingItems);
    next.fields.occasion = Some(occasion);
    next.fields.price = Some(bracket);
    next.fields.page = Some(1);
    let items = ctx.catalog.filter(occasion, bracket);
    outbound.push(prompts::item_page(&session.user, &paginate(&items, 1, ctx.page_size)));
    Transition::save(next, outbound)
}

fn select_item(session: &DialogSession, ctx: &EngineContext<'_>, item: &CatalogItem) -> Transition {
    let mut next = session.clone().enter(DialogState::ItemSelected);
    next.fields.occasion = Some(item.category_id);
    next.fields.item = Some(SelectedItem {
        id: item.id,
        name: item.name.clone(),
        price: item.price,
    });
    let outbound = prompts::item_card(&session.user, item, ctx.photo_fallback);
    Transition::save(next, outbound)
}

/// Back to page 1 of the listing the customer came from.
fn item_unavailable(session: &DialogSession, ctx: &EngineContext<'_>) -> Transition {
    let (occasion, bracket) = listing_filter(session);
    browse(
        session,
        ctx,
        occasion,
        bracket,
        vec![prompts::item_unavailable(&session.user)],
    )
}

/// Occasion and bracket of the listing the session is browsing.
///
/// A session without an occasion maps to id 0, which matches no items.
fn listing_filter(session: &DialogSession) -> (CategoryId, PriceBracket) {
    let fields = &session.fields;
    (
        fields.occasion.unwrap_or(CategoryId(0)),
        fields.price.unwrap_or(PriceBracket::Any),
    )
}

fn payment_request(session: &DialogSession, ctx: &EngineContext<'_>) -> Vec<OutboundAction> {
    let user = &session.user;
    let fields = &session.fields;
    let (Some(item), Some(payload)) = (fields.item.as_ref(), fields.invoice_payload.clone()) else {
        return vec![prompts::incomplete_order(user)];
    };
    vec![
        prompts::order_summary(user, fields, ctx.delivery_fee),
        prompts::invoice(
            user,
            &item.name,
            invoice_lines(item.price, ctx.delivery_fee),
            payload,
        ),
    ]
}

fn reprompt(session: &DialogSession, err: FlowerError) -> Transition {
    let text = match err {
        FlowerError::Validation { message, .. } => message,
        other => other.to_string(),
    };
    Transition::stay(session, vec![OutboundAction::text(&session.user, text)])
}
