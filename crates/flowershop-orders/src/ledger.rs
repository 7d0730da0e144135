// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order ledger: turns a confirmed payment plus the dialog's draft into a
//! persisted order, exactly once per payment.

use std::sync::Arc;

use flowershop_config::model::ShopConfig;
use flowershop_core::types::{
    ItemId, LineItem, NewOrder, Order, OrderDraft, OrderId, OrderStatus, PaymentConfirmation,
    PlacedOrder,
};
use flowershop_core::{FlowerError, StorageAdapter, UserId};
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Invoice lines for an item: the bouquet and the delivery fee.
pub fn invoice_lines(item_price: Decimal, delivery_fee: Decimal) -> Vec<LineItem> {
    vec![
        LineItem {
            label: "Букет".to_string(),
            amount: item_price,
        },
        LineItem {
            label: "Доставка".to_string(),
            amount: delivery_fee,
        },
    ]
}

/// Records orders and enforces their status lifecycle.
#[derive(Clone)]
pub struct OrderLedger {
    storage: Arc<dyn StorageAdapter>,
    delivery_fee: Decimal,
}

impl OrderLedger {
    pub fn new(storage: Arc<dyn StorageAdapter>, delivery_fee: Decimal) -> Self {
        Self {
            storage,
            delivery_fee,
        }
    }

    pub fn from_config(storage: Arc<dyn StorageAdapter>, shop: &ShopConfig) -> Self {
        Self::new(storage, shop.delivery_fee)
    }

    pub fn delivery_fee(&self) -> Decimal {
        self.delivery_fee
    }

    /// Item price plus delivery.
    pub async fn quote(&self, item_id: ItemId) -> Result<Decimal, FlowerError> {
        let item = self
            .storage
            .get_item(item_id)
            .await?
            .ok_or_else(|| FlowerError::not_found("item", item_id))?;
        Ok(item.price + self.delivery_fee)
    }

    /// Persist the order for a confirmed payment.
    ///
    /// Idempotent on `(user, payment.transaction_ref)`: a repeated
    /// confirmation returns the existing order with `created == false`.
    /// The user's session is deleted in the same transaction as the insert.
    pub async fn create_order(
        &self,
        user: &UserId,
        draft: &OrderDraft,
        payment: &PaymentConfirmation,
    ) -> Result<PlacedOrder, FlowerError> {
        let (Some(item_id), Some(recipient_name), Some(address), Some(delivery_date), Some(delivery_time)) = (
            draft.item_id,
            draft.recipient_name.clone(),
            draft.address.clone(),
            draft.delivery_date,
            draft.delivery_time.clone(),
        ) else {
            return Err(FlowerError::IncompleteOrderData {
                missing: draft.missing(),
            });
        };

        let total_price = self.quote(item_id).await?;
        if payment.amount != total_price {
            warn!(
                user_id = %user,
                expected = %total_price,
                paid = %payment.amount,
                payment_ref = %payment.transaction_ref,
                "paid amount differs from order total"
            );
        }

        let placed = self
            .storage
            .place_order(&NewOrder {
                user_id: user.clone(),
                item_id,
                recipient_name,
                address,
                delivery_date,
                delivery_time,
                total_price,
                amount_paid: payment.amount,
                payment_ref: payment.transaction_ref.clone(),
            })
            .await?;

        if placed.created {
            info!(
                user_id = %user,
                order_id = %placed.order.id,
                total = %placed.order.total_price,
                "order created"
            );
        } else {
            info!(
                user_id = %user,
                order_id = %placed.order.id,
                payment_ref = %payment.transaction_ref,
                "duplicate payment confirmation, order already exists"
            );
        }
        Ok(placed)
    }

    pub async fn find_by_payment(
        &self,
        user: &UserId,
        transaction_ref: &str,
    ) -> Result<Option<Order>, FlowerError> {
        self.storage.find_order_by_payment(user, transaction_ref).await
    }

    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, FlowerError> {
        self.storage.get_order(id).await
    }

    /// Move an order forward in its lifecycle.
    ///
    /// Fails with `Validation` when the move would go backwards or leave a
    /// terminal state, and with `ReferenceNotFound` for unknown ids.
    pub async fn advance_status(&self, id: OrderId, to: OrderStatus) -> Result<(), FlowerError> {
        if self.storage.advance_order_status(id, to).await? {
            info!(order_id = %id, status = %to, "order status advanced");
            return Ok(());
        }
        match self.storage.get_order(id).await? {
            None => Err(FlowerError::not_found("order", id)),
            Some(order) => Err(FlowerError::Validation {
                field: "status",
                message: format!("cannot move order {id} from {} to {to}", order.status),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_has_bouquet_then_delivery() {
        let lines = invoice_lines(Decimal::from(1500), Decimal::from(500));
        let labels: Vec<_> = lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["Букет", "Доставка"]);
        let total: Decimal = lines.iter().map(|l| l.amount).sum();
        assert_eq!(total, Decimal::from(2000));
    }
}
