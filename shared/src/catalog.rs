//! Catalogue domain types
//!
//! Categories, dishes (with flavors) and set meals, plus the semantic
//! cache-key contract used by the browse read path.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Cache key contract
// =============================================================================

/// Query family of a cached catalogue result.
///
/// The cache key format `"<Namespace>::<CategoryId>"` is a public
/// contract: the existence filter is rebuilt from catalogue state at
/// startup, so keys must be reproducible across restarts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    Dish,
    Setmeal,
}

impl CacheNamespace {
    pub const ALL: [CacheNamespace; 2] = [CacheNamespace::Dish, CacheNamespace::Setmeal];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::Dish => "DishCache",
            CacheNamespace::Setmeal => "SetmealCache",
        }
    }

    /// Build the semantic cache key for a category.
    pub fn key(&self, category_id: i64) -> String {
        format!("{}::{}", self.as_str(), category_id)
    }
}

// =============================================================================
// Catalogue rows
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub sort_order: i32,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dish {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub description: Option<String>,
    /// Only enabled dishes are served on the browse read path.
    pub enabled: bool,
}

/// A selectable flavor of a dish, e.g. ("spiciness", "mild | hot").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishFlavor {
    pub id: i64,
    pub dish_id: i64,
    pub name: String,
    pub value: String,
}

/// The browse-path view of a dish: the row plus its flavors. This is
/// the unit that gets serialized into the result cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishView {
    #[serde(flatten)]
    pub dish: Dish,
    pub flavors: Vec<DishFlavor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setmeal {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
}
