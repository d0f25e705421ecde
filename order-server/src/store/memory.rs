//! In-memory reference store.
//!
//! One `RwLock` over the whole dataset gives every multi-row write
//! (submission, cart clearing) transactional behavior for free: a
//! write guard is held for the full mutation, so partial application
//! is never observable. Row versions implement the optimistic
//! whole-row update discipline.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::catalog::{Category, Dish, DishFlavor, DishView, Setmeal};
use shared::order::{AddressEntry, CartItem, CartSelection, Order, OrderItem, OrderStatus};

use super::{
    AddressBookStore, CartStore, CatalogStore, OrderStore, StoreError, StoreResult,
};

#[derive(Default)]
struct Inner {
    orders: HashMap<i64, Order>,
    /// Business key -> row id.
    numbers: HashMap<String, i64>,
    items: HashMap<i64, Vec<OrderItem>>,
    carts: HashMap<i64, Vec<CartItem>>,
    addresses: HashMap<i64, AddressEntry>,
    categories: BTreeMap<i64, Category>,
    dishes: HashMap<i64, Dish>,
    flavors: HashMap<i64, Vec<DishFlavor>>,
    setmeals: HashMap<i64, Setmeal>,
}

pub struct MemoryStore {
    inner: RwLock<Inner>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            next_id: AtomicI64::new(1),
        }
    }

    fn alloc_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    // =========================================================================
    // Seeding (startup / tests)
    // =========================================================================

    pub fn seed_address(&self, entry: AddressEntry) {
        self.inner.write().addresses.insert(entry.id, entry);
    }

    pub fn seed_category(&self, category: Category) {
        self.inner.write().categories.insert(category.id, category);
    }

    pub fn seed_dish(&self, dish: Dish, flavors: Vec<DishFlavor>) {
        let mut inner = self.inner.write();
        inner.flavors.insert(dish.id, flavors);
        inner.dishes.insert(dish.id, dish);
    }

    pub fn seed_setmeal(&self, setmeal: Setmeal) {
        self.inner.write().setmeals.insert(setmeal.id, setmeal);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn submit(&self, mut order: Order, items: Vec<OrderItem>) -> StoreResult<Order> {
        let mut inner = self.inner.write();

        // Validate before any mutation so a failure leaves no trace.
        if inner.numbers.contains_key(&order.number) {
            return Err(StoreError::Duplicate(format!(
                "order number {}",
                order.number
            )));
        }

        order.id = self.alloc_id();
        order.version = 0;

        let items: Vec<OrderItem> = items
            .into_iter()
            .map(|mut item| {
                item.id = self.alloc_id();
                item.order_id = order.id;
                item
            })
            .collect();

        inner.numbers.insert(order.number.clone(), order.id);
        inner.items.insert(order.id, items);
        inner.carts.remove(&order.user_id);
        inner.orders.insert(order.id, order.clone());

        Ok(order)
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Order>> {
        Ok(self.inner.read().orders.get(&id).cloned())
    }

    async fn get_by_number(&self, number: &str) -> StoreResult<Option<Order>> {
        let inner = self.inner.read();
        Ok(inner
            .numbers
            .get(number)
            .and_then(|id| inner.orders.get(id))
            .cloned())
    }

    async fn update(&self, order: &Order) -> StoreResult<Order> {
        let mut inner = self.inner.write();
        let stored = inner
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::NotFound(format!("order {}", order.id)))?;

        if stored.version != order.version {
            return Err(StoreError::VersionConflict(format!(
                "order {} (stored v{}, caller v{})",
                order.id, stored.version, order.version
            )));
        }

        let mut next = order.clone();
        next.version += 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn query_by_status_and_time_before(
        &self,
        status: OrderStatus,
        cutoff: i64,
    ) -> StoreResult<Vec<Order>> {
        Ok(self
            .inner
            .read()
            .orders
            .values()
            .filter(|o| o.status == status && o.order_time < cutoff)
            .cloned()
            .collect())
    }

    async fn items_of(&self, order_id: i64) -> StoreResult<Vec<OrderItem>> {
        Ok(self
            .inner
            .read()
            .items
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn count_by_status(&self, status: OrderStatus) -> StoreResult<u64> {
        Ok(self
            .inner
            .read()
            .orders
            .values()
            .filter(|o| o.status == status)
            .count() as u64)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn list_by_user(&self, user_id: i64) -> StoreResult<Vec<CartItem>> {
        Ok(self
            .inner
            .read()
            .carts
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find(
        &self,
        user_id: i64,
        selection: &CartSelection,
    ) -> StoreResult<Option<CartItem>> {
        Ok(self
            .inner
            .read()
            .carts
            .get(&user_id)
            .and_then(|rows| rows.iter().find(|r| r.selection() == *selection))
            .cloned())
    }

    async fn insert(&self, mut item: CartItem) -> StoreResult<CartItem> {
        item.id = self.alloc_id();
        self.inner
            .write()
            .carts
            .entry(item.user_id)
            .or_default()
            .push(item.clone());
        Ok(item)
    }

    async fn insert_batch(&self, items: Vec<CartItem>) -> StoreResult<()> {
        let mut inner = self.inner.write();
        for mut item in items {
            item.id = self.alloc_id();
            inner.carts.entry(item.user_id).or_default().push(item);
        }
        Ok(())
    }

    async fn update(&self, item: &CartItem) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let rows = inner
            .carts
            .get_mut(&item.user_id)
            .ok_or_else(|| StoreError::NotFound(format!("cart of user {}", item.user_id)))?;
        let row = rows
            .iter_mut()
            .find(|r| r.id == item.id)
            .ok_or_else(|| StoreError::NotFound(format!("cart row {}", item.id)))?;
        *row = item.clone();
        Ok(())
    }

    async fn delete(&self, user_id: i64, id: i64) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let rows = inner
            .carts
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("cart of user {}", user_id)))?;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(StoreError::NotFound(format!("cart row {}", id)));
        }
        Ok(())
    }

    async fn delete_by_user(&self, user_id: i64) -> StoreResult<()> {
        self.inner.write().carts.remove(&user_id);
        Ok(())
    }
}

#[async_trait]
impl AddressBookStore for MemoryStore {
    async fn get(&self, id: i64) -> StoreResult<Option<AddressEntry>> {
        Ok(self.inner.read().addresses.get(&id).cloned())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn category_ids(&self) -> StoreResult<Vec<i64>> {
        Ok(self.inner.read().categories.keys().copied().collect())
    }

    async fn dishes_by_category(&self, category_id: i64) -> StoreResult<Vec<DishView>> {
        let inner = self.inner.read();
        let mut views: Vec<DishView> = inner
            .dishes
            .values()
            .filter(|d| d.category_id == category_id && d.enabled)
            .map(|d| DishView {
                dish: d.clone(),
                flavors: inner.flavors.get(&d.id).cloned().unwrap_or_default(),
            })
            .collect();
        views.sort_by_key(|v| v.dish.id);
        Ok(views)
    }

    async fn setmeals_by_category(&self, category_id: i64) -> StoreResult<Vec<Setmeal>> {
        let mut rows: Vec<Setmeal> = self
            .inner
            .read()
            .setmeals
            .values()
            .filter(|s| s.category_id == category_id && s.enabled)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.id);
        Ok(rows)
    }

    async fn dish(&self, id: i64) -> StoreResult<Option<Dish>> {
        Ok(self.inner.read().dishes.get(&id).cloned())
    }

    async fn setmeal(&self, id: i64) -> StoreResult<Option<Setmeal>> {
        Ok(self.inner.read().setmeals.get(&id).cloned())
    }
}
