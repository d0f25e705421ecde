//! Cache-aside catalogue reads.
//!
//! `Get(namespace, category)` flows filter → cache → store → cache:
//! a filter rejection is authoritative `NotFound`; a cache hit
//! (including an empty result set) returns without touching the
//! store; a miss queries the store and populates the cache. Two
//! callers racing the same miss both compute and the last write wins
//! with an equivalent value — no single-flight guard.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::cache::ResultCache;
use super::filter::ExistenceFilter;
use crate::core::{OrderError, OrderResult};
use crate::store::CatalogStore;
use shared::catalog::{CacheNamespace, DishView, Setmeal};

pub struct CatalogReader {
    filter: Arc<ExistenceFilter>,
    cache: Arc<ResultCache>,
    catalog: Arc<dyn CatalogStore>,
    ttl: Duration,
}

impl CatalogReader {
    pub fn new(
        filter: Arc<ExistenceFilter>,
        cache: Arc<ResultCache>,
        catalog: Arc<dyn CatalogStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            filter,
            cache,
            catalog,
            ttl,
        }
    }

    /// Enabled dishes of a category, flavors attached.
    pub async fn dishes_by_category(&self, category_id: i64) -> OrderResult<Vec<DishView>> {
        let catalog = self.catalog.clone();
        self.read_aside(CacheNamespace::Dish, category_id, move |id| async move {
            catalog.dishes_by_category(id).await.map_err(Into::into)
        })
        .await
    }

    /// Enabled set meals of a category.
    pub async fn setmeals_by_category(&self, category_id: i64) -> OrderResult<Vec<Setmeal>> {
        let catalog = self.catalog.clone();
        self.read_aside(CacheNamespace::Setmeal, category_id, move |id| async move {
            catalog.setmeals_by_category(id).await.map_err(Into::into)
        })
        .await
    }

    async fn read_aside<T, F, Fut>(
        &self,
        namespace: CacheNamespace,
        category_id: i64,
        load: F,
    ) -> OrderResult<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(i64) -> Fut,
        Fut: Future<Output = OrderResult<Vec<T>>>,
    {
        let key = namespace.key(category_id);

        // 1. Filter verdict. A reported absence is authoritative: the
        //    filter has no false negatives.
        if !self.filter.might_contain(&key) {
            return Err(OrderError::NotFound(key));
        }

        // 2. Cache hit, trusted even when the result set is empty.
        if let Some(value) = self.cache.get(&key) {
            match serde_json::from_value(value) {
                Ok(rows) => {
                    tracing::debug!(key = %key, "Catalogue cache hit");
                    return Ok(rows);
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                }
            }
        }

        // 3. Miss: load from the store and populate.
        let rows = load(category_id).await?;
        match serde_json::to_value(&rows) {
            Ok(value) => self.cache.set(&key, value, self.ttl),
            Err(e) => tracing::warn!(key = %key, error = %e, "Result not cacheable"),
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::filter::seed_existence_filter;
    use crate::store::{MemoryStore, StoreResult};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use shared::catalog::{Category, Dish, DishFlavor};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Catalogue wrapper counting store queries.
    struct CountingCatalog {
        inner: Arc<MemoryStore>,
        queries: AtomicUsize,
    }

    #[async_trait]
    impl CatalogStore for CountingCatalog {
        async fn category_ids(&self) -> StoreResult<Vec<i64>> {
            self.inner.category_ids().await
        }
        async fn dishes_by_category(&self, category_id: i64) -> StoreResult<Vec<DishView>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.inner.dishes_by_category(category_id).await
        }
        async fn setmeals_by_category(&self, category_id: i64) -> StoreResult<Vec<Setmeal>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.inner.setmeals_by_category(category_id).await
        }
        async fn dish(&self, id: i64) -> StoreResult<Option<Dish>> {
            self.inner.dish(id).await
        }
        async fn setmeal(&self, id: i64) -> StoreResult<Option<Setmeal>> {
            self.inner.setmeal(id).await
        }
    }

    struct Fixture {
        counting: Arc<CountingCatalog>,
        reader: CatalogReader,
    }

    async fn fixture(ttl: Duration) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        store.seed_category(Category {
            id: 1,
            name: "Sichuan".to_string(),
            sort_order: 1,
            enabled: true,
        });
        store.seed_category(Category {
            id: 2,
            name: "Cantonese".to_string(),
            sort_order: 2,
            enabled: true,
        });
        store.seed_dish(
            Dish {
                id: 11,
                category_id: 1,
                name: "Mapo Tofu".to_string(),
                price: Decimal::new(1250, 2),
                image: None,
                description: None,
                enabled: true,
            },
            vec![DishFlavor {
                id: 1,
                dish_id: 11,
                name: "spiciness".to_string(),
                value: "mild,hot".to_string(),
            }],
        );

        let filter = Arc::new(ExistenceFilter::with_capacity(64, 0.01));
        seed_existence_filter(&filter, store.as_ref()).await.unwrap();

        let counting = Arc::new(CountingCatalog {
            inner: store,
            queries: AtomicUsize::new(0),
        });
        let reader = CatalogReader::new(
            filter,
            Arc::new(ResultCache::new()),
            counting.clone(),
            ttl,
        );

        Fixture { counting, reader }
    }

    #[tokio::test]
    async fn test_miss_populates_then_hit_skips_store() {
        let fx = fixture(Duration::from_secs(60)).await;

        let first = fx.reader.dishes_by_category(1).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(fx.counting.queries.load(Ordering::SeqCst), 1);

        let second = fx.reader.dishes_by_category(1).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].dish.name, "Mapo Tofu");
        assert_eq!(second[0].flavors.len(), 1);
        assert_eq!(
            fx.counting.queries.load(Ordering::SeqCst),
            1,
            "a hit inside the TTL window must not query the store"
        );
    }

    #[tokio::test]
    async fn test_expired_entry_queries_store_again() {
        let fx = fixture(Duration::from_millis(0)).await;

        fx.reader.dishes_by_category(1).await.unwrap();
        fx.reader.dishes_by_category(1).await.unwrap();
        assert_eq!(fx.counting.queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_category_rejected_without_store_query() {
        let fx = fixture(Duration::from_secs(60)).await;

        let result = fx.reader.dishes_by_category(424242).await;
        assert!(matches!(result, Err(OrderError::NotFound(_))));
        assert_eq!(
            fx.counting.queries.load(Ordering::SeqCst),
            0,
            "a filter rejection must never reach the store"
        );
    }

    #[tokio::test]
    async fn test_empty_result_is_cached_and_trusted() {
        let fx = fixture(Duration::from_secs(60)).await;

        // Category 2 exists (seeded in the filter) but has no dishes.
        let first = fx.reader.dishes_by_category(2).await.unwrap();
        assert!(first.is_empty());
        assert_eq!(fx.counting.queries.load(Ordering::SeqCst), 1);

        let second = fx.reader.dishes_by_category(2).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(
            fx.counting.queries.load(Ordering::SeqCst),
            1,
            "an empty cached result is still a hit"
        );
    }

    #[tokio::test]
    async fn test_namespaces_do_not_collide() {
        let fx = fixture(Duration::from_secs(60)).await;

        let dishes = fx.reader.dishes_by_category(1).await.unwrap();
        assert_eq!(dishes.len(), 1);

        // The set-meal namespace for the same category is its own key
        // and its own (empty) result.
        let setmeals = fx.reader.setmeals_by_category(1).await.unwrap();
        assert!(setmeals.is_empty());
        assert_eq!(fx.counting.queries.load(Ordering::SeqCst), 2);
    }
}
