//! Order domain types
//!
//! The order row, its detail rows, shopping-cart rows and the two
//! lifecycle enums. Status is a total order encoded as an integer rank;
//! all transition rules live in the server's lifecycle module, these
//! types only expose the rank and the derived predicates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cancel reason written by the user-cancellation path.
pub const CANCEL_REASON_USER: &str = "user cancelled";

/// Cancel reason written by the payment-timeout sweep.
pub const CANCEL_REASON_PAYMENT_TIMEOUT: &str = "payment timeout, auto-cancelled";

// =============================================================================
// Lifecycle enums
// =============================================================================

/// Order status.
///
/// `PendingPayment → ToBeConfirmed → Confirmed → DeliveryInProgress →
/// Completed`, with `Cancelled` reachable from ranks 1-4.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    ToBeConfirmed,
    Confirmed,
    DeliveryInProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Integer rank of the status. Ranks only ever increase over an
    /// order's lifetime, except for the single allowed drop to
    /// `Cancelled` from ranks 1-4.
    pub fn rank(&self) -> u8 {
        match self {
            OrderStatus::PendingPayment => 1,
            OrderStatus::ToBeConfirmed => 2,
            OrderStatus::Confirmed => 3,
            OrderStatus::DeliveryInProgress => 4,
            OrderStatus::Completed => 5,
            OrderStatus::Cancelled => 6,
        }
    }

    /// A user may cancel only while the merchant has not accepted
    /// the order (rank <= 2).
    pub fn is_cancellable(&self) -> bool {
        self.rank() <= 2
    }

    /// Completed and cancelled orders are immutable.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::ToBeConfirmed => "TO_BE_CONFIRMED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::DeliveryInProgress => "DELIVERY_IN_PROGRESS",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Payment status, independent of [`OrderStatus`] but evolving
/// monotonically alongside it: `Unpaid → Paid → Refunded`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayStatus {
    Unpaid,
    Paid,
    Refunded,
}

// =============================================================================
// Order (row)
// =============================================================================

/// An order row.
///
/// Address and contact fields are snapshots copied from the address
/// book at submission time; later address-book edits never affect an
/// existing order. Each timestamp is set exactly once on its own
/// transition. `version` is the optimistic-concurrency stamp checked by
/// the store on every whole-row update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Business key, globally unique, monotonic timestamp derived.
    pub number: String,
    pub user_id: i64,
    pub address_book_id: i64,
    pub status: OrderStatus,
    pub pay_status: PayStatus,
    pub amount: Decimal,
    // Address snapshot
    pub consignee: String,
    pub phone: String,
    pub address: String,
    // Timestamps (unix millis), each set exactly once
    pub order_time: i64,
    pub checkout_time: Option<i64>,
    pub cancel_time: Option<i64>,
    pub delivery_time: Option<i64>,
    // Cancellation bookkeeping
    pub cancel_reason: Option<String>,
    pub rejection_reason: Option<String>,
    /// Optimistic-concurrency stamp, owned by the store.
    pub version: u64,
}

// =============================================================================
// Order detail (child rows)
// =============================================================================

/// A detail row of an order, created once at submission from the cart
/// snapshot and immutable afterwards. Lifetime is tied to the parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub name: String,
    pub image: Option<String>,
    pub dish_id: Option<i64>,
    pub setmeal_id: Option<i64>,
    pub dish_flavor: Option<String>,
    pub quantity: i32,
    /// Unit amount at submission time.
    pub amount: Decimal,
}

impl OrderItem {
    /// Materialize a detail row from a cart row at submission time.
    pub fn from_cart(cart: &CartItem, order_id: i64) -> Self {
        Self {
            id: 0, // assigned by the store
            order_id,
            name: cart.name.clone(),
            image: cart.image.clone(),
            dish_id: cart.dish_id,
            setmeal_id: cart.setmeal_id,
            dish_flavor: cart.dish_flavor.clone(),
            quantity: cart.quantity,
            amount: cart.amount,
        }
    }
}

// =============================================================================
// Shopping cart
// =============================================================================

/// The (dish-or-setmeal, flavor) coordinate of a cart row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartSelection {
    pub dish_id: Option<i64>,
    pub setmeal_id: Option<i64>,
    pub dish_flavor: Option<String>,
}

/// A per-user shopping-cart row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub image: Option<String>,
    pub dish_id: Option<i64>,
    pub setmeal_id: Option<i64>,
    pub dish_flavor: Option<String>,
    pub quantity: i32,
    /// Unit amount.
    pub amount: Decimal,
    pub create_time: i64,
}

impl CartItem {
    pub fn selection(&self) -> CartSelection {
        CartSelection {
            dish_id: self.dish_id,
            setmeal_id: self.setmeal_id,
            dish_flavor: self.dish_flavor.clone(),
        }
    }

    /// Copy-construct a cart row from an order detail, dropping the
    /// original row identity and stamping a fresh creation time.
    pub fn from_order_item(item: &OrderItem, user_id: i64, now: i64) -> Self {
        Self {
            id: 0, // assigned by the store
            user_id,
            name: item.name.clone(),
            image: item.image.clone(),
            dish_id: item.dish_id,
            setmeal_id: item.setmeal_id,
            dish_flavor: item.dish_flavor.clone(),
            quantity: item.quantity,
            amount: item.amount,
            create_time: now,
        }
    }
}

// =============================================================================
// Address book
// =============================================================================

/// An address-book row, resolved at submission and copied into the
/// order as an immutable snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressEntry {
    pub id: i64,
    pub user_id: i64,
    pub consignee: String,
    pub phone: String,
    /// Full structured address handed to route planning.
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_total_order() {
        let ordered = [
            OrderStatus::PendingPayment,
            OrderStatus::ToBeConfirmed,
            OrderStatus::Confirmed,
            OrderStatus::DeliveryInProgress,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn test_cancellable_is_rank_at_most_two() {
        assert!(OrderStatus::PendingPayment.is_cancellable());
        assert!(OrderStatus::ToBeConfirmed.is_cancellable());
        assert!(!OrderStatus::Confirmed.is_cancellable());
        assert!(!OrderStatus::DeliveryInProgress.is_cancellable());
        assert!(!OrderStatus::Completed.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::DeliveryInProgress.is_terminal());
    }

    #[test]
    fn test_status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&OrderStatus::DeliveryInProgress).unwrap();
        assert_eq!(json, "\"DELIVERY_IN_PROGRESS\"");
    }

    #[test]
    fn test_cart_item_from_order_item_drops_identity() {
        let item = OrderItem {
            id: 42,
            order_id: 7,
            name: "Kung Pao Chicken".to_string(),
            image: None,
            dish_id: Some(3),
            setmeal_id: None,
            dish_flavor: Some("extra hot".to_string()),
            quantity: 2,
            amount: Decimal::new(1280, 2),
        };

        let cart = CartItem::from_order_item(&item, 99, 1_700_000_000_000);
        assert_eq!(cart.id, 0);
        assert_eq!(cart.user_id, 99);
        assert_eq!(cart.quantity, 2);
        assert_eq!(cart.dish_flavor.as_deref(), Some("extra hot"));
        assert_eq!(cart.create_time, 1_700_000_000_000);
    }
}
