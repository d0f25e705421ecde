//! Catalogue browse path and cart service
//!
//! The high-volume read path flows
//! `ExistenceFilter → ResultCache → CatalogStore → ResultCache`:
//! a probabilistic filter rejects keys that can never resolve before
//! they reach the store (cache-penetration defense), and a TTL cache
//! absorbs repeat queries for the keys that can.

pub mod cache;
pub mod cart;
pub mod filter;
pub mod reader;

pub use cache::ResultCache;
pub use cart::CartService;
pub use filter::{ExistenceFilter, seed_existence_filter};
pub use reader::CatalogReader;
