//! Store seams consumed by the lifecycle and the browse read path.
//!
//! The store is an opaque transactional collaborator: the lifecycle
//! only ever reads rows, computes full next rows and commits them
//! through conditional whole-row updates. [`memory::MemoryStore`] is
//! the in-process reference implementation backing tests and the
//! standalone binary.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use shared::catalog::{DishView, Setmeal};
use shared::order::{AddressEntry, CartItem, CartSelection, Order, OrderItem, OrderStatus};
use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Optimistic whole-row update lost the race: the stored version
    /// no longer matches the one the caller read.
    #[error("Version conflict: {0}")]
    VersionConflict(String),

    #[error("Store failure: {0}")]
    Internal(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Order rows and their detail rows.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a freshly submitted order: the order row, its detail
    /// rows and the clearing of the submitting user's cart commit as
    /// one unit. Partial application must never be observable.
    ///
    /// Assigns row ids; returns the stored order.
    async fn submit(&self, order: Order, items: Vec<OrderItem>) -> StoreResult<Order>;

    async fn get(&self, id: i64) -> StoreResult<Option<Order>>;

    /// Lookup by business key (order number).
    async fn get_by_number(&self, number: &str) -> StoreResult<Option<Order>>;

    /// Conditional whole-row update: commits only if the stored
    /// version still matches `order.version`, bumping it on success.
    async fn update(&self, order: &Order) -> StoreResult<Order>;

    /// Range scan for the sweeps: all orders in `status` whose
    /// order_time is strictly before `cutoff` (unix millis).
    async fn query_by_status_and_time_before(
        &self,
        status: OrderStatus,
        cutoff: i64,
    ) -> StoreResult<Vec<Order>>;

    async fn items_of(&self, order_id: i64) -> StoreResult<Vec<OrderItem>>;

    async fn count_by_status(&self, status: OrderStatus) -> StoreResult<u64>;
}

/// Per-user shopping-cart rows.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn list_by_user(&self, user_id: i64) -> StoreResult<Vec<CartItem>>;

    /// Find the row matching a (dish-or-setmeal, flavor) selection.
    async fn find(&self, user_id: i64, selection: &CartSelection)
    -> StoreResult<Option<CartItem>>;

    /// Insert a row, assigning its id.
    async fn insert(&self, item: CartItem) -> StoreResult<CartItem>;

    async fn insert_batch(&self, items: Vec<CartItem>) -> StoreResult<()>;

    async fn update(&self, item: &CartItem) -> StoreResult<()>;

    async fn delete(&self, user_id: i64, id: i64) -> StoreResult<()>;

    async fn delete_by_user(&self, user_id: i64) -> StoreResult<()>;
}

/// Address-book rows, read-only from the lifecycle's point of view.
#[async_trait]
pub trait AddressBookStore: Send + Sync {
    async fn get(&self, id: i64) -> StoreResult<Option<AddressEntry>>;
}

/// Catalogue rows feeding the browse read path and the cart service.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All known category ids, used to seed the existence filter.
    async fn category_ids(&self) -> StoreResult<Vec<i64>>;

    /// Enabled dishes of a category, flavors attached.
    async fn dishes_by_category(&self, category_id: i64) -> StoreResult<Vec<DishView>>;

    /// Enabled set meals of a category.
    async fn setmeals_by_category(&self, category_id: i64) -> StoreResult<Vec<Setmeal>>;

    async fn dish(&self, id: i64) -> StoreResult<Option<shared::catalog::Dish>>;

    async fn setmeal(&self, id: i64) -> StoreResult<Option<Setmeal>>;
}
