// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assignment dispatcher: routes paid orders to couriers and consultation
//! requests to florists, and records their acknowledgments.
//!
//! The assignment record is written before the worker is notified. A failed
//! notification leaves the record in place for [`Dispatcher::renotify`].

use std::sync::Arc;

use flowershop_core::types::{
    AckOutcome, Assignment, AssignmentId, Choice, ChoiceButton, Order, OrderId, OrderStatus,
    OutboundAction, Worker, WorkerKind,
};
use flowershop_core::{FlowerError, Outbox, StorageAdapter, UserId};
use tracing::{info, warn};

const DELIVERED_LABEL: &str = "✅ Доставлено";
const CALLED_BACK_LABEL: &str = "✅ Перезвонил";

/// Selects workers, records assignments, and notifies them.
#[derive(Clone)]
pub struct Dispatcher {
    storage: Arc<dyn StorageAdapter>,
    outbox: Outbox,
}

impl Dispatcher {
    pub fn new(storage: Arc<dyn StorageAdapter>, outbox: Outbox) -> Self {
        Self { storage, outbox }
    }

    /// Assign the order to the first active courier and notify them.
    ///
    /// Calling this again for the same order returns the existing assignment.
    pub async fn assign_courier(&self, order: &Order) -> Result<Assignment, FlowerError> {
        let (worker, assignment) = self
            .storage
            .assign_worker(WorkerKind::Courier, Some(order.id), None)
            .await?
            .ok_or_else(|| FlowerError::NoAvailableWorker {
                kind: WorkerKind::Courier.to_string(),
            })?;
        info!(
            order_id = %order.id,
            assignment_id = %assignment.id,
            worker_id = %worker.id,
            "courier assigned"
        );
        self.notify(&worker, &assignment, courier_message(&worker, order))
            .await;
        Ok(assignment)
    }

    /// Ask the first active florist to call the customer back.
    pub async fn request_callback(
        &self,
        user: &UserId,
        phone: &str,
        order: Option<OrderId>,
    ) -> Result<Assignment, FlowerError> {
        let (worker, assignment) = self
            .storage
            .assign_worker(WorkerKind::Florist, order, Some(phone))
            .await?
            .ok_or_else(|| FlowerError::NoAvailableWorker {
                kind: WorkerKind::Florist.to_string(),
            })?;
        info!(
            user_id = %user,
            assignment_id = %assignment.id,
            worker_id = %worker.id,
            "florist callback requested"
        );
        self.notify(&worker, &assignment, florist_message(phone, order))
            .await;
        Ok(assignment)
    }

    /// Record a worker's acknowledgment. Repeats are successful no-ops.
    ///
    /// `from` must match the assigned worker's contact; anyone else is
    /// rejected with `Validation` and nothing is written.
    pub async fn acknowledge(&self, id: AssignmentId, from: &str) -> Result<AckOutcome, FlowerError> {
        let assignment = self
            .storage
            .get_assignment(id)
            .await?
            .ok_or_else(|| FlowerError::not_found("assignment", id))?;
        let worker = self
            .storage
            .get_worker(assignment.worker_id)
            .await?
            .ok_or_else(|| FlowerError::not_found("worker", assignment.worker_id))?;
        if worker.contact != from {
            warn!(
                assignment_id = %id,
                worker_id = %worker.id,
                from,
                "acknowledgment from someone other than the assigned worker"
            );
            return Err(FlowerError::Validation {
                field: "assignment",
                message: format!("assignment {id} belongs to another worker"),
            });
        }

        let outcome = self
            .storage
            .acknowledge_assignment(id)
            .await?
            .ok_or_else(|| FlowerError::not_found("assignment", id))?;

        match &outcome {
            AckOutcome::Acknowledged(assignment) => {
                info!(
                    assignment_id = %id,
                    kind = %assignment.kind,
                    order_id = ?assignment.order_id,
                    "assignment acknowledged"
                );
                let text = match assignment.kind {
                    WorkerKind::Courier => "✅ Отмечено как доставленный!",
                    WorkerKind::Florist => "✅ Отмечено как перезвонивший!",
                };
                let reply = OutboundAction::NotifyWorker {
                    worker_id: worker.id,
                    contact: worker.contact.clone(),
                    text: text.to_string(),
                    ack: None,
                };
                if let Err(e) = self.outbox.deliver(reply).await {
                    warn!(assignment_id = %id, error = %e, "acknowledgment reply not delivered");
                }
            }
            AckOutcome::AlreadyAcknowledged(_) => {
                info!(assignment_id = %id, "assignment already acknowledged");
            }
        }
        Ok(outcome)
    }

    /// Send the worker notification again for an open assignment.
    ///
    /// Acknowledged assignments are rejected with `Validation`.
    pub async fn renotify(&self, id: AssignmentId) -> Result<(), FlowerError> {
        let assignment = self
            .storage
            .get_assignment(id)
            .await?
            .ok_or_else(|| FlowerError::not_found("assignment", id))?;
        if assignment.acknowledged {
            return Err(FlowerError::Validation {
                field: "assignment",
                message: format!("assignment {id} is already acknowledged"),
            });
        }
        let worker = self
            .storage
            .get_worker(assignment.worker_id)
            .await?
            .ok_or_else(|| FlowerError::not_found("worker", assignment.worker_id))?;

        let text = match (assignment.kind, assignment.order_id) {
            (WorkerKind::Courier, Some(order_id)) => {
                let order = self
                    .storage
                    .get_order(order_id)
                    .await?
                    .ok_or_else(|| FlowerError::not_found("order", order_id))?;
                courier_message(&worker, &order)
            }
            _ => florist_message(
                assignment.contact_phone.as_deref().unwrap_or("-"),
                assignment.order_id,
            ),
        };
        self.outbox
            .deliver(notification(&worker, &assignment, text))
            .await?;
        info!(assignment_id = %id, worker_id = %worker.id, "worker re-notified");
        Ok(())
    }

    /// Retry courier assignment for a paid order that has none.
    ///
    /// Only `new` orders qualify. An order that already has a courier gets
    /// its existing assignment back.
    pub async fn assign_pending(&self, id: OrderId) -> Result<Assignment, FlowerError> {
        let order = self
            .storage
            .get_order(id)
            .await?
            .ok_or_else(|| FlowerError::not_found("order", id))?;
        if order.status != OrderStatus::New {
            return Err(FlowerError::Validation {
                field: "order",
                message: format!("order {id} is {}, not new", order.status),
            });
        }
        self.assign_courier(&order).await
    }

    /// Paid orders still waiting for a courier, oldest first.
    pub async fn unassigned_orders(&self) -> Result<Vec<Order>, FlowerError> {
        self.storage.list_unassigned_orders().await
    }

    /// Unacknowledged assignments, oldest first.
    pub async fn open_assignments(&self) -> Result<Vec<Assignment>, FlowerError> {
        self.storage.list_assignments(true).await
    }

    async fn notify(&self, worker: &Worker, assignment: &Assignment, text: String) {
        if let Err(e) = self
            .outbox
            .deliver(notification(worker, assignment, text))
            .await
        {
            warn!(
                assignment_id = %assignment.id,
                worker_id = %worker.id,
                error = %e,
                "worker notification failed; assignment kept for re-notify"
            );
        }
    }
}

fn notification(worker: &Worker, assignment: &Assignment, text: String) -> OutboundAction {
    let label = match assignment.kind {
        WorkerKind::Courier => DELIVERED_LABEL,
        WorkerKind::Florist => CALLED_BACK_LABEL,
    };
    OutboundAction::NotifyWorker {
        worker_id: worker.id,
        contact: worker.contact.clone(),
        text,
        ack: Some(ChoiceButton::new(label, Choice::Ack(assignment.id))),
    }
}

fn courier_message(worker: &Worker, order: &Order) -> String {
    format!(
        ">>>>{}\n🚨 Новый заказ!\n🔢 Номер заказа: #{}\n📦 Адрес: {}\n📅 Дата: {}\n⏰ Время: {}\n👤 Клиент: {}",
        worker.name,
        order.id,
        order.address,
        order.delivery_date,
        order.delivery_time,
        order.recipient_name,
    )
}

fn florist_message(phone: &str, order: Option<OrderId>) -> String {
    let mut text = format!("Звонок клиенту:\n🚨 Требуется консультация клиенту\n🔢 Номер тел: {phone}");
    if let Some(order) = order {
        text.push_str(&format!("\n📦 По заказу: #{order}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn florist_message_mentions_phone_and_order() {
        let text = florist_message("+79161234567", Some(OrderId(12)));
        assert!(text.contains("Требуется консультация клиенту"));
        assert!(text.contains("+79161234567"));
        assert!(text.contains("#12"));
        assert!(!florist_message("+79161234567", None).contains("По заказу"));
    }
}
