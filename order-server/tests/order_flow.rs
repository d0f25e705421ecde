//! End-to-end flows through the public API: browse → cart → submit →
//! pay → merchant actions, plus the timeout sweep against real state.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use order_server::core::{AppState, Config};
use order_server::orders::TimeoutSweeper;
use order_server::store::{MemoryStore, OrderStore};
use shared::catalog::{Category, Dish, DishFlavor};
use shared::order::{
    AddressEntry, CANCEL_REASON_PAYMENT_TIMEOUT, CartSelection, OrderStatus, PayStatus,
};

const USER: i64 = 7;
const ADDRESS: i64 = 1;

fn test_config() -> Config {
    Config {
        shop_address: "200 Example Avenue".into(),
        max_delivery_distance_m: 5000,
        payment_timeout_minutes: 15,
        payment_sweep_interval_secs: 60,
        completion_sweep_hour: 1,
        completion_grace_minutes: 60,
        cache_ttl_secs: 3600,
        filter_expected_insertions: 256,
        filter_false_positive_rate: 0.01,
        route_api_url: String::new(),
        route_api_key: String::new(),
        log_dir: None,
        environment: "development".into(),
    }
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.seed_category(Category {
        id: 1,
        name: "Sichuan classics".to_string(),
        sort_order: 1,
        enabled: true,
    });
    store.seed_dish(
        Dish {
            id: 11,
            category_id: 1,
            name: "Kung Pao Chicken".to_string(),
            price: Decimal::new(1480, 2),
            image: None,
            description: None,
            enabled: true,
        },
        vec![DishFlavor {
            id: 1,
            dish_id: 11,
            name: "spiciness".to_string(),
            value: "mild,medium,hot".to_string(),
        }],
    );
    store.seed_dish(
        Dish {
            id: 12,
            category_id: 1,
            name: "Mapo Tofu".to_string(),
            price: Decimal::new(1250, 2),
            image: None,
            description: None,
            enabled: true,
        },
        Vec::new(),
    );
    store.seed_address(AddressEntry {
        id: ADDRESS,
        user_id: USER,
        consignee: "Alex".to_string(),
        phone: "5550100".to_string(),
        detail: "1 North Street".to_string(),
    });
    store
}

fn selection(dish_id: i64) -> CartSelection {
    CartSelection {
        dish_id: Some(dish_id),
        setmeal_id: None,
        dish_flavor: None,
    }
}

#[tokio::test]
async fn test_browse_cart_submit_pay_reject_flow() {
    let state = AppState::with_store(&test_config(), seeded_store())
        .await
        .unwrap();

    // Browse through the cache-aside path.
    let dishes = state.reader.dishes_by_category(1).await.unwrap();
    assert_eq!(dishes.len(), 2);

    // Build a two-item cart.
    state.cart.add(USER, selection(11)).await.unwrap();
    state.cart.add(USER, selection(12)).await.unwrap();
    assert_eq!(state.cart.show(USER).await.unwrap().len(), 2);

    // Submit: order lands in PENDING_PAYMENT / UNPAID with the cart
    // materialized as details and the cart cleared.
    let order = state.lifecycle.submit(USER, ADDRESS).await.unwrap();
    assert_eq!(order.status, OrderStatus::PendingPayment);
    assert_eq!(order.pay_status, PayStatus::Unpaid);
    assert_eq!(order.amount, Decimal::new(2730, 2));
    assert!(state.cart.show(USER).await.unwrap().is_empty());

    let (_, items) = state.lifecycle.details(order.id).await.unwrap();
    assert_eq!(items.len(), 2);

    // Pay by business key.
    let paid = state.lifecycle.mark_paid(&order.number).await.unwrap();
    assert_eq!(paid.status, OrderStatus::ToBeConfirmed);
    assert_eq!(paid.pay_status, PayStatus::Paid);

    // Merchant rejects: refund compensation plus bookkeeping.
    let rejected = state
        .lifecycle
        .reject(order.id, "out of stock")
        .await
        .unwrap();
    assert_eq!(rejected.status, OrderStatus::Cancelled);
    assert_eq!(rejected.pay_status, PayStatus::Refunded);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("out of stock"));
}

#[tokio::test]
async fn test_repeat_after_completion() {
    let state = AppState::with_store(&test_config(), seeded_store())
        .await
        .unwrap();

    state.cart.add(USER, selection(11)).await.unwrap();
    let order = state.lifecycle.submit(USER, ADDRESS).await.unwrap();
    state.lifecycle.mark_paid(&order.number).await.unwrap();
    state.lifecycle.confirm(order.id).await.unwrap();
    state.lifecycle.deliver(order.id).await.unwrap();
    let completed = state.lifecycle.complete(order.id).await.unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);
    assert!(completed.delivery_time.is_some());

    // "Order again": details come back as fresh cart rows.
    state.lifecycle.repeat(order.id, USER).await.unwrap();
    let cart = state.cart.show(USER).await.unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].name, "Kung Pao Chicken");
}

#[tokio::test]
async fn test_payment_sweep_cancels_abandoned_order() {
    let config = test_config();
    let store = seeded_store();
    let state = AppState::with_store(&config, store.clone()).await.unwrap();

    state.cart.add(USER, selection(11)).await.unwrap();
    let order = state.lifecycle.submit(USER, ADDRESS).await.unwrap();

    // Backdate the order past the payment deadline through the same
    // conditional-update discipline everything else uses.
    let mut aged = store.get(order.id).await.unwrap().unwrap();
    aged.order_time -= 16 * 60_000;
    store.update(&aged).await.unwrap();

    let sweeper = TimeoutSweeper::new(store.clone(), CancellationToken::new(), &config);
    assert_eq!(sweeper.payment_pass().await, 1);

    let cancelled = store.get(order.id).await.unwrap().unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(
        cancelled.cancel_reason.as_deref(),
        Some(CANCEL_REASON_PAYMENT_TIMEOUT)
    );
    // Never paid, so no refund bookkeeping.
    assert_eq!(cancelled.pay_status, PayStatus::Unpaid);
}
