//! Application state wiring.
//!
//! Builds the store, gateways, cache and filter once and hands out
//! the composed lifecycle, reader and cart services. Background tasks
//! (the two timeout sweeps and the notification listener) are
//! registered here.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::catalog::{CartService, CatalogReader, ExistenceFilter, ResultCache, seed_existence_filter};
use crate::core::{BackgroundTasks, Config, OrderResult, TaskKind};
use crate::gateway::{
    BroadcastNotifier, FixedDistance, GeoDistanceService, PaymentGateway, RoutePlanner,
    SimulatedPaymentGateway,
};
use crate::orders::{OrderLifecycle, TimeoutSweeper};
use crate::store::MemoryStore;

pub struct AppState {
    pub config: Config,
    pub store: Arc<MemoryStore>,
    pub filter: Arc<ExistenceFilter>,
    pub cache: Arc<ResultCache>,
    pub notifier: Arc<BroadcastNotifier>,
    pub lifecycle: Arc<OrderLifecycle>,
    pub reader: Arc<CatalogReader>,
    pub cart: Arc<CartService>,
}

impl AppState {
    /// Initialize with a fresh, empty store.
    pub async fn initialize(config: &Config) -> OrderResult<Self> {
        Self::with_store(config, Arc::new(MemoryStore::new())).await
    }

    /// Initialize against an already-populated store. The existence
    /// filter is built here, from the store's category catalogue.
    pub async fn with_store(config: &Config, store: Arc<MemoryStore>) -> OrderResult<Self> {
        let filter = Arc::new(ExistenceFilter::with_capacity(
            config.filter_expected_insertions,
            config.filter_false_positive_rate,
        ));
        seed_existence_filter(&filter, store.as_ref()).await?;

        let cache = Arc::new(ResultCache::new());
        let notifier = Arc::new(BroadcastNotifier::new(1024));

        let geo: Arc<dyn GeoDistanceService> = if config.route_api_url.is_empty() {
            tracing::info!("No route service configured, using fixed-distance stub");
            Arc::new(FixedDistance(1000))
        } else {
            Arc::new(RoutePlanner::new(
                &config.route_api_url,
                &config.route_api_key,
            ))
        };
        let payments: Arc<dyn PaymentGateway> = Arc::new(SimulatedPaymentGateway);

        let lifecycle = Arc::new(OrderLifecycle::new(
            store.clone(),
            store.clone(),
            store.clone(),
            payments,
            geo,
            notifier.clone(),
            config.shop_address.clone(),
            config.max_delivery_distance_m,
        ));

        let reader = Arc::new(CatalogReader::new(
            filter.clone(),
            cache.clone(),
            store.clone(),
            config.cache_ttl(),
        ));

        let cart = Arc::new(CartService::new(store.clone(), store.clone()));

        Ok(Self {
            config: config.clone(),
            store,
            filter,
            cache,
            notifier,
            lifecycle,
            reader,
            cart,
        })
    }

    /// Register the timeout sweeps and the notification listener.
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let sweeper = Arc::new(TimeoutSweeper::new(
            self.store.clone(),
            tasks.shutdown_token(),
            &self.config,
        ));

        tasks.spawn(
            "payment_timeout_sweep",
            TaskKind::Periodic,
            sweeper.clone().run_payment_sweep(),
        );
        tasks.spawn(
            "delivery_completion_sweep",
            TaskKind::Periodic,
            sweeper.run_completion_sweep(),
        );

        let mut rx = self.notifier.subscribe();
        let token = tasks.shutdown_token();
        tasks.spawn("notification_listener", TaskKind::Listener, async move {
            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Ok(event) => {
                            tracing::info!(
                                order_id = event.order_id,
                                kind = event.kind,
                                "Notification: {}",
                                event.content
                            );
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Notification listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => return,
                    },
                    _ = token.cancelled() => return,
                }
            }
        });
    }
}
