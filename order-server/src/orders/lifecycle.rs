//! Order lifecycle state machine.
//!
//! Every operation is one logical transaction: read the current row,
//! compute the full next row, commit through the store's conditional
//! whole-row update. Two transitions racing on the same order resolve
//! at the commit: the loser observes a version conflict and surfaces
//! `ConcurrentModification`.
//!
//! Refund compensation is idempotent in intent: the gateway is invoked
//! only by the caller whose Paid→Refunded row update actually
//! committed, so racing cancellation paths trigger at most one
//! external refund.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::core::{OrderError, OrderResult};
use crate::gateway::{
    GeoDistanceService, NotificationEvent, Notifier, PaymentGateway, PaymentTicket,
};
use crate::store::{AddressBookStore, CartStore, OrderStore};
use shared::order::{
    CANCEL_REASON_USER, CartItem, Order, OrderItem, OrderStatus, PayStatus,
};
use shared::util::{next_order_number, now_millis};

/// Counts of in-flight orders per merchant-facing state.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OrderStatistics {
    pub to_be_confirmed: u64,
    pub confirmed: u64,
    pub delivery_in_progress: u64,
}

pub struct OrderLifecycle {
    orders: Arc<dyn OrderStore>,
    carts: Arc<dyn CartStore>,
    addresses: Arc<dyn AddressBookStore>,
    payments: Arc<dyn PaymentGateway>,
    geo: Arc<dyn GeoDistanceService>,
    notifier: Arc<dyn Notifier>,
    /// Fixed delivery origin.
    shop_address: String,
    /// Ceiling on the planned route distance.
    max_delivery_distance_m: u32,
}

impl OrderLifecycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        carts: Arc<dyn CartStore>,
        addresses: Arc<dyn AddressBookStore>,
        payments: Arc<dyn PaymentGateway>,
        geo: Arc<dyn GeoDistanceService>,
        notifier: Arc<dyn Notifier>,
        shop_address: impl Into<String>,
        max_delivery_distance_m: u32,
    ) -> Self {
        Self {
            orders,
            carts,
            addresses,
            payments,
            geo,
            notifier,
            shop_address: shop_address.into(),
            max_delivery_distance_m,
        }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submit an order from the user's current cart.
    ///
    /// The order row, its detail rows and the cart clearing commit as
    /// one unit through the store. Address and contact fields are
    /// copied out of the address book, never referenced live.
    pub async fn submit(&self, user_id: i64, address_book_id: i64) -> OrderResult<Order> {
        let address = self
            .addresses
            .get(address_book_id)
            .await?
            .ok_or(OrderError::AddressNotFound)?;

        let cart = self.carts.list_by_user(user_id).await?;
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let distance = self
            .geo
            .distance_between(&self.shop_address, &address.detail)
            .await
            .map_err(|e| OrderError::DeliveryPlanningFailed(e.to_string()))?;
        if distance > self.max_delivery_distance_m {
            return Err(OrderError::OutOfDeliveryRange(distance));
        }

        let amount: Decimal = cart
            .iter()
            .map(|row| row.amount * Decimal::from(row.quantity))
            .sum();

        let order = Order {
            id: 0, // assigned by the store
            number: next_order_number(),
            user_id,
            address_book_id,
            status: OrderStatus::PendingPayment,
            pay_status: PayStatus::Unpaid,
            amount,
            consignee: address.consignee.clone(),
            phone: address.phone.clone(),
            address: address.detail.clone(),
            order_time: now_millis(),
            checkout_time: None,
            cancel_time: None,
            delivery_time: None,
            cancel_reason: None,
            rejection_reason: None,
            version: 0,
        };

        let items: Vec<OrderItem> = cart.iter().map(|row| OrderItem::from_cart(row, 0)).collect();

        let stored = self.orders.submit(order, items).await?;
        tracing::info!(
            order_id = stored.id,
            number = %stored.number,
            user_id,
            amount = %stored.amount,
            distance,
            "Order submitted"
        );
        Ok(stored)
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Ask the payment gateway for a prepay ticket.
    pub async fn request_payment(
        &self,
        order_number: &str,
        payer_ref: &str,
    ) -> OrderResult<PaymentTicket> {
        let order = self.get_by_number(order_number).await?;
        if order.pay_status != PayStatus::Unpaid {
            return Err(OrderError::AlreadyPaid);
        }

        self.payments
            .pay(&order.number, order.amount, "delivery order", payer_ref)
            .await
            .map_err(|e| OrderError::Gateway(e.to_string()))
    }

    /// Settle a successful payment reported by the gateway.
    ///
    /// Transitions Unpaid→Paid and PendingPayment→ToBeConfirmed,
    /// stamping the checkout time, then notifies the merchant side.
    /// Notification is best-effort: a failure is logged, never rolled
    /// back into the transition.
    pub async fn mark_paid(&self, order_number: &str) -> OrderResult<Order> {
        let order = self.get_by_number(order_number).await?;
        if order.status != OrderStatus::PendingPayment || order.pay_status != PayStatus::Unpaid {
            return Err(OrderError::AlreadyPaid);
        }

        let mut next = order;
        next.status = OrderStatus::ToBeConfirmed;
        next.pay_status = PayStatus::Paid;
        next.checkout_time = Some(now_millis());

        let committed = self.orders.update(&next).await?;
        tracing::info!(order_id = committed.id, number = %committed.number, "Order paid");

        let event = NotificationEvent::new_order(committed.id, &committed.number);
        if let Err(e) = self.notifier.broadcast(event) {
            tracing::warn!(order_id = committed.id, error = %e, "New-order notification dropped");
        }

        Ok(committed)
    }

    // =========================================================================
    // Cancellation paths
    // =========================================================================

    /// User-initiated cancellation, allowed while rank <= 2.
    pub async fn cancel_by_user(&self, order_id: i64) -> OrderResult<Order> {
        let order = self.get(order_id).await?;
        if !order.status.is_cancellable() {
            return Err(OrderError::NotCancellable);
        }

        self.cancel_with(order, |next| {
            next.cancel_reason = Some(CANCEL_REASON_USER.to_string());
        })
        .await
    }

    /// Merchant rejection, only while the order awaits acceptance.
    pub async fn reject(&self, order_id: i64, reason: &str) -> OrderResult<Order> {
        let order = self.get(order_id).await?;
        if order.status != OrderStatus::ToBeConfirmed {
            return Err(OrderError::InvalidStateTransition(format!(
                "reject requires TO_BE_CONFIRMED, order {} is {}",
                order.id, order.status
            )));
        }

        let reason = reason.to_string();
        self.cancel_with(order, move |next| {
            next.rejection_reason = Some(reason);
        })
        .await
    }

    /// Merchant-side cancellation; no precondition beyond existence
    /// and terminal immutability.
    pub async fn merchant_cancel(&self, order_id: i64, reason: &str) -> OrderResult<Order> {
        let order = self.get(order_id).await?;
        if order.status.is_terminal() {
            return Err(OrderError::InvalidStateTransition(format!(
                "order {} is already {}",
                order.id, order.status
            )));
        }

        let reason = reason.to_string();
        self.cancel_with(order, move |next| {
            next.cancel_reason = Some(reason);
        })
        .await
    }

    /// Shared cancellation tail: flip Paid→Refunded and cancel in one
    /// row update, then run the refund compensation only if that
    /// update won. Losing a race surfaces `ConcurrentModification`
    /// before any gateway call.
    async fn cancel_with<F>(&self, order: Order, annotate: F) -> OrderResult<Order>
    where
        F: FnOnce(&mut Order),
    {
        let mut next = order;
        let needs_refund = next.pay_status == PayStatus::Paid;
        if needs_refund {
            next.pay_status = PayStatus::Refunded;
        }
        next.status = OrderStatus::Cancelled;
        next.cancel_time = Some(now_millis());
        annotate(&mut next);

        let committed = self.orders.update(&next).await?;
        tracing::info!(
            order_id = committed.id,
            number = %committed.number,
            refunded = needs_refund,
            "Order cancelled"
        );

        if needs_refund {
            // Refund number mirrors the order number, as upstream
            // settlement reconciles per order.
            self.payments
                .refund(
                    &committed.number,
                    &committed.number,
                    committed.amount,
                    committed.amount,
                )
                .await
                .map_err(|e| OrderError::Gateway(e.to_string()))?;
        }

        Ok(committed)
    }

    // =========================================================================
    // Fulfilment
    // =========================================================================

    /// Merchant accepts the order. Permissive on prior state but never
    /// rank-decreasing: allowed up to CONFIRMED itself, refused once
    /// delivery has started or the order is terminal.
    pub async fn confirm(&self, order_id: i64) -> OrderResult<Order> {
        let order = self.get(order_id).await?;
        if order.status.rank() > OrderStatus::Confirmed.rank() {
            return Err(OrderError::InvalidStateTransition(format!(
                "confirm not allowed once order {} is {}",
                order.id, order.status
            )));
        }

        let mut next = order;
        next.status = OrderStatus::Confirmed;
        Ok(self.orders.update(&next).await?)
    }

    /// Hand the order to a rider.
    pub async fn deliver(&self, order_id: i64) -> OrderResult<Order> {
        let order = self.get(order_id).await?;
        if order.status != OrderStatus::Confirmed {
            return Err(OrderError::InvalidStateTransition(format!(
                "deliver requires CONFIRMED, order {} is {}",
                order.id, order.status
            )));
        }

        let mut next = order;
        next.status = OrderStatus::DeliveryInProgress;
        Ok(self.orders.update(&next).await?)
    }

    /// Close out a delivered order.
    pub async fn complete(&self, order_id: i64) -> OrderResult<Order> {
        let order = self.get(order_id).await?;
        if order.status != OrderStatus::DeliveryInProgress {
            return Err(OrderError::InvalidStateTransition(format!(
                "complete requires DELIVERY_IN_PROGRESS, order {} is {}",
                order.id, order.status
            )));
        }

        let mut next = order;
        next.status = OrderStatus::Completed;
        next.delivery_time = Some(now_millis());
        Ok(self.orders.update(&next).await?)
    }

    // =========================================================================
    // Reads and conveniences
    // =========================================================================

    /// Re-materialize an order's details as fresh cart rows for the
    /// user. Pure side effect on the cart; the source order is never
    /// touched.
    pub async fn repeat(&self, order_id: i64, user_id: i64) -> OrderResult<()> {
        let _ = self.get(order_id).await?;
        let items = self.orders.items_of(order_id).await?;

        let now = now_millis();
        let rows: Vec<CartItem> = items
            .iter()
            .map(|item| CartItem::from_order_item(item, user_id, now))
            .collect();

        self.carts.insert_batch(rows).await?;
        Ok(())
    }

    /// An order together with its detail rows.
    pub async fn details(&self, order_id: i64) -> OrderResult<(Order, Vec<OrderItem>)> {
        let order = self.get(order_id).await?;
        let items = self.orders.items_of(order_id).await?;
        Ok((order, items))
    }

    /// Merchant dashboard counts.
    pub async fn statistics(&self) -> OrderResult<OrderStatistics> {
        Ok(OrderStatistics {
            to_be_confirmed: self
                .orders
                .count_by_status(OrderStatus::ToBeConfirmed)
                .await?,
            confirmed: self.orders.count_by_status(OrderStatus::Confirmed).await?,
            delivery_in_progress: self
                .orders
                .count_by_status(OrderStatus::DeliveryInProgress)
                .await?,
        })
    }

    async fn get(&self, order_id: i64) -> OrderResult<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }

    async fn get_by_number(&self, number: &str) -> OrderResult<Order> {
        self.orders
            .get_by_number(number)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(number.to_string()))
    }
}
