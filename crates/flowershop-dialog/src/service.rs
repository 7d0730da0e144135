// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processes one inbound event end to end.
//!
//! Per user: lock, load the session, compute the transition, persist it,
//! run the ledger or dispatcher effect, unlock, then send. A failed write
//! aborts the step before anything reaches the customer except an apology.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use flowershop_config::model::ShopConfig;
use flowershop_core::types::{InboundEvent, OrderDraft, OutboundAction, PaymentConfirmation};
use flowershop_core::{FlowerError, Outbox, StorageAdapter, UserId};
use flowershop_orders::{Dispatcher, OrderLedger};
use tracing::{debug, error, info, warn};

use crate::catalog::Catalog;
use crate::engine::{self, EngineContext, Effect, Input, Persist, Transition};
use crate::locks::UserLocks;
use crate::prompts;
use crate::session::DialogSession;

/// Result of one locked step: what to send, and the failure to report, if any.
struct Outcome {
    outbound: Vec<OutboundAction>,
    error: Option<FlowerError>,
}

impl Outcome {
    fn sent(outbound: Vec<OutboundAction>) -> Self {
        Self {
            outbound,
            error: None,
        }
    }

    fn failed(error: FlowerError, apology: OutboundAction) -> Self {
        Self {
            outbound: vec![apology],
            error: Some(error),
        }
    }
}

/// The dialog engine wired to storage, the order ledger, and the dispatcher.
pub struct DialogService {
    storage: Arc<dyn StorageAdapter>,
    catalog: Arc<Catalog>,
    ledger: OrderLedger,
    dispatcher: Dispatcher,
    outbox: Outbox,
    locks: UserLocks,
    shop: ShopConfig,
}

impl DialogService {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        catalog: Arc<Catalog>,
        outbox: Outbox,
        shop: ShopConfig,
    ) -> Self {
        let ledger = OrderLedger::from_config(Arc::clone(&storage), &shop);
        let dispatcher = Dispatcher::new(Arc::clone(&storage), outbox.clone());
        Self {
            storage,
            catalog,
            ledger,
            dispatcher,
            outbox,
            locks: UserLocks::new(),
            shop,
        }
    }

    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Re-read categories and items from storage.
    pub async fn reload_catalog(&self) -> Result<(), FlowerError> {
        self.catalog.reload(self.storage.as_ref()).await
    }

    /// Flush and close storage.
    pub async fn shutdown(&self) -> Result<(), FlowerError> {
        self.storage.close().await
    }

    /// Handle one event. Errors are returned after the customer has been told.
    pub async fn process(&self, event: InboundEvent) -> Result<(), FlowerError> {
        debug!(kind = event.kind(), "processing inbound event");

        if let InboundEvent::WorkerAcknowledged {
            assignment_id,
            from,
        } = &event
        {
            self.dispatcher.acknowledge(*assignment_id, from).await?;
            return Ok(());
        }
        let (Some(user), Some(input)) = (event.user().cloned(), Input::from_event(&event)) else {
            return Ok(());
        };

        let guard = self.locks.lock(&user).await;
        let outcome = self.step(&user, input).await;
        drop(guard);

        let failed = self.outbox.deliver_all(outcome.outbound).await;
        if failed > 0 {
            warn!(user_id = %user, failed, "some replies were not delivered");
        }
        match outcome.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn step(&self, user: &UserId, input: Input) -> Outcome {
        let session = match self.load_session(user).await {
            Ok(session) => session,
            Err(e) => {
                error!(user_id = %user, error = %e, "session load failed");
                return Outcome::failed(e, prompts::could_not_save(user));
            }
        };

        let snapshot = self.catalog.snapshot();
        let ctx = EngineContext {
            catalog: &snapshot,
            today: today(),
            page_size: self.shop.page_size,
            delivery_fee: self.shop.delivery_fee,
            consent_document: &self.shop.consent_document,
            photo_fallback: &self.shop.item_photo_fallback,
        };

        let transition = engine::transition(&session, &input, &ctx);
        debug!(
            user_id = %user,
            from = %session.state,
            to = %transition.session.state,
            persist = ?transition.persist,
            "dialog transition"
        );
        if let Err(e) = self.persist(&transition).await {
            error!(
                user_id = %user,
                state = %session.state,
                error = %e,
                "transition aborted, session not saved"
            );
            return Outcome::failed(e, prompts::could_not_save(user));
        }

        let mut outbound = transition.outbound;
        let Some(effect) = transition.effect else {
            return Outcome::sent(outbound);
        };
        let error = match effect {
            Effect::PlaceOrder { draft, payment } => {
                self.place_order(&session, &ctx, &draft, &payment, &mut outbound)
                    .await
            }
            Effect::RequestCallback { phone } => {
                self.request_callback(user, &phone, &mut outbound).await
            }
            Effect::ReconcilePayment { payment } => {
                self.reconcile_payment(user, &payment, &mut outbound).await
            }
        };
        Outcome { outbound, error }
    }

    /// The stored session, or a fresh one. Unreadable records start over.
    async fn load_session(&self, user: &UserId) -> Result<DialogSession, FlowerError> {
        let Some(record) = self.storage.get_session(user).await? else {
            return Ok(DialogSession::new(user.clone()));
        };
        match DialogSession::from_record(&record) {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!(user_id = %user, error = %e, "discarding unreadable session");
                Ok(DialogSession::new(user.clone()))
            }
        }
    }

    async fn persist(&self, transition: &Transition) -> Result<(), FlowerError> {
        let session = &transition.session;
        match transition.persist {
            Persist::Save => {
                let fields = session.fields_json()?;
                self.storage
                    .save_session(&session.user, &session.state.to_string(), &fields)
                    .await?;
            }
            Persist::Delete => {
                self.storage.delete_session(&session.user).await?;
            }
            Persist::Unchanged => {}
        }
        Ok(())
    }

    async fn place_order(
        &self,
        session: &DialogSession,
        ctx: &EngineContext<'_>,
        draft: &OrderDraft,
        payment: &PaymentConfirmation,
        outbound: &mut Vec<OutboundAction>,
    ) -> Option<FlowerError> {
        let user = &session.user;
        let placed = match self.ledger.create_order(user, draft, payment).await {
            Ok(placed) => placed,
            Err(FlowerError::IncompleteOrderData { missing }) => {
                warn!(user_id = %user, ?missing, "paid session is missing order data");
                return self
                    .recover(engine::order_incomplete(session, ctx), outbound)
                    .await;
            }
            Err(FlowerError::ReferenceNotFound { kind, id }) => {
                warn!(user_id = %user, kind, id = %id, "ordered item no longer exists");
                return self
                    .recover(engine::order_item_missing(session, ctx), outbound)
                    .await;
            }
            Err(e) => {
                error!(user_id = %user, error = %e, "order could not be recorded");
                outbound.push(prompts::could_not_save(user));
                return Some(e);
            }
        };

        if !placed.created {
            outbound.push(prompts::payment_already_counted(user, &placed.order));
            return None;
        }

        let assigned = match self.dispatcher.assign_courier(&placed.order).await {
            Ok(_) => true,
            Err(FlowerError::NoAvailableWorker { .. }) => {
                warn!(order_id = %placed.order.id, "no active courier, order left for manual assignment");
                false
            }
            Err(e) => {
                error!(order_id = %placed.order.id, error = %e, "courier assignment failed");
                false
            }
        };
        outbound.push(prompts::payment_received(user, &placed.order, assigned));
        if !assigned {
            outbound.push(prompts::courier_pending(user));
        }
        None
    }

    /// Persist a fallback transition after a failed order and queue its prompts.
    async fn recover(
        &self,
        transition: Transition,
        outbound: &mut Vec<OutboundAction>,
    ) -> Option<FlowerError> {
        let user = transition.session.user.clone();
        if let Err(e) = self.persist(&transition).await {
            error!(user_id = %user, error = %e, "fallback state not saved");
            outbound.push(prompts::could_not_save(&user));
            return Some(e);
        }
        outbound.extend(transition.outbound);
        None
    }

    async fn request_callback(
        &self,
        user: &UserId,
        phone: &str,
        outbound: &mut Vec<OutboundAction>,
    ) -> Option<FlowerError> {
        match self.dispatcher.request_callback(user, phone, None).await {
            Ok(_) => None,
            Err(FlowerError::NoAvailableWorker { .. }) => {
                warn!(user_id = %user, "no active florist for consultation");
                outbound.push(prompts::florist_pending(user));
                None
            }
            Err(e) => {
                error!(user_id = %user, error = %e, "consultation request failed");
                outbound.push(prompts::generic_failure(user));
                Some(e)
            }
        }
    }

    async fn reconcile_payment(
        &self,
        user: &UserId,
        payment: &PaymentConfirmation,
        outbound: &mut Vec<OutboundAction>,
    ) -> Option<FlowerError> {
        match self
            .ledger
            .find_by_payment(user, &payment.transaction_ref)
            .await
        {
            Ok(Some(order)) => {
                info!(user_id = %user, order_id = %order.id, "repeated payment confirmation");
                outbound.push(prompts::payment_already_counted(user, &order));
                None
            }
            Ok(None) => {
                warn!(
                    user_id = %user,
                    payment_ref = %payment.transaction_ref,
                    amount = %payment.amount,
                    "payment without a pending order"
                );
                outbound.push(prompts::generic_failure(user));
                None
            }
            Err(e) => {
                error!(user_id = %user, error = %e, "payment lookup failed");
                outbound.push(prompts::could_not_save(user));
                Some(e)
            }
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
