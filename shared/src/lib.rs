//! Shared types for the delivery order backend
//!
//! Domain types used across crates: order rows and their lifecycle
//! enums, catalogue entities, shopping-cart rows, and small utilities
//! (timestamps, ID and order-number generation).

pub mod catalog;
pub mod order;
pub mod util;

// Re-exports
pub use catalog::{CacheNamespace, Category, Dish, DishFlavor, DishView, Setmeal};
pub use order::{AddressEntry, CartItem, CartSelection, Order, OrderItem, OrderStatus, PayStatus};
pub use serde::{Deserialize, Serialize};
