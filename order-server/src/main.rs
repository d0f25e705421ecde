use std::sync::Arc;

use rust_decimal::Decimal;
use shared::catalog::{Category, Dish, DishFlavor, Setmeal};
use shared::order::AddressEntry;

use order_server::core::{AppState, BackgroundTasks, Config};
use order_server::init_logger;
use order_server::store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志)
    dotenv::dotenv().ok();
    let config = Config::from_env();
    let _log_guard = init_logger("info", config.is_production(), config.log_dir.as_deref())?;

    tracing::info!("Delivery order server starting...");

    // 2. 初始化状态 (内存存储 + 存在过滤器 + 缓存 + 网关)
    let store = Arc::new(MemoryStore::new());
    if !config.is_production() {
        seed_demo_catalog(&store);
    }
    let state = AppState::with_store(&config, store).await?;

    // 3. 启动后台任务 (超时扫描 + 通知监听)
    let mut tasks = BackgroundTasks::new();
    state.start_background_tasks(&mut tasks);
    tasks.log_summary();

    tracing::info!("Server ready, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    // 4. Graceful shutdown: 等待进行中的扫描跑完
    tasks.shutdown().await;
    Ok(())
}

/// 开发环境演示数据
fn seed_demo_catalog(store: &MemoryStore) {
    store.seed_category(Category {
        id: 1,
        name: "Sichuan classics".to_string(),
        sort_order: 1,
        enabled: true,
    });
    store.seed_category(Category {
        id: 2,
        name: "Set meals".to_string(),
        sort_order: 2,
        enabled: true,
    });

    store.seed_dish(
        Dish {
            id: 11,
            category_id: 1,
            name: "Kung Pao Chicken".to_string(),
            price: Decimal::new(1480, 2),
            image: None,
            description: Some("Stir-fried with peanuts and dried chili".to_string()),
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
    store.seed_setmeal(Setmeal {
        id: 21,
        category_id: 2,
        name: "Family Combo".to_string(),
        price: Decimal::new(4500, 2),
        image: None,
        description: Some("Two mains, one soup".to_string()),
        enabled: true,
    });

    store.seed_address(AddressEntry {
        id: 1,
        user_id: 7,
        consignee: "Demo User".to_string(),
        phone: "5550100".to_string(),
        detail: "1 North Street".to_string(),
    });

    tracing::info!("Demo catalogue seeded (development environment)");
}
