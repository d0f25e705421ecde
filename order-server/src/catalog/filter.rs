//! Probabilistic existence filter for cache keys.
//!
//! A Bloom filter over the semantic cache keys: false positives fall
//! through to the store (which legitimately returns empty), false
//! negatives must never occur — every key inserted at construction
//! answers `might_contain == true` for the filter's lifetime.
//!
//! Capacity and false-positive rate are fixed at construction; the
//! filter is insert-only afterward, a catalogue change means a full
//! rebuild.

use std::f64::consts::LN_2;
use std::io::Cursor;

use bitvec::prelude::*;
use parking_lot::RwLock;

use crate::core::OrderResult;
use crate::store::CatalogStore;
use shared::catalog::CacheNamespace;

// =============================================================================
// Parameter calculation
// =============================================================================
//
// m = -n*ln(fpr) / (ln 2)^2   optimal bits
// k = (m/n) * ln 2            optimal hash functions
// FPR = (1 - e^(-kn/m))^k

fn optimal_parameters(expected_insertions: usize, target_fpr: f64) -> (usize, usize) {
    if expected_insertions == 0 {
        return (1, 1);
    }

    let n = expected_insertions as f64;
    let ln2_squared = LN_2 * LN_2;

    let m = (-n * target_fpr.ln() / ln2_squared).ceil() as usize;
    let k = ((m as f64 / n) * LN_2).round() as usize;

    (m.max(1), k.clamp(1, 32))
}

/// FPR = (1 - e^(-kn/m))^k
fn false_positive_rate(m: usize, n: usize, k: usize) -> f64 {
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}

// =============================================================================
// Hashing
// =============================================================================

fn murmur_hash(key: &[u8], seed: u32) -> u64 {
    let mut cursor = Cursor::new(key);
    // 128-bit murmur3, lower 64 bits
    let hash = murmur3::murmur3_x64_128(&mut cursor, seed).unwrap_or(0);
    hash as u64
}

/// k positions via double hashing: h(i) = h1 + i * h2.
fn hash_positions(key: &str, k: usize, m: usize) -> impl Iterator<Item = usize> {
    let h1 = murmur_hash(key.as_bytes(), 0);
    let h2 = murmur_hash(key.as_bytes(), 1);

    (0..k as u64).map(move |i| {
        let hash = h1.wrapping_add(i.wrapping_mul(h2));
        (hash % m as u64) as usize
    })
}

// =============================================================================
// Filter
// =============================================================================

/// Process-wide existence filter, read-mostly after startup
/// population. Reads take the shared lock; writes are confined to
/// startup and catalogue-change rebuilds.
pub struct ExistenceFilter {
    bits: RwLock<BitVec<u8, Lsb0>>,
    /// Size in bits (m)
    m: usize,
    /// Number of hash functions (k)
    k: usize,
}

impl ExistenceFilter {
    /// Build an empty filter sized for `expected_insertions` keys at
    /// `target_fpr` false-positive rate.
    pub fn with_capacity(expected_insertions: usize, target_fpr: f64) -> Self {
        let (m, k) = optimal_parameters(expected_insertions, target_fpr);
        tracing::debug!(bits = m, hashes = k, "Existence filter sized");
        Self {
            bits: RwLock::new(bitvec![u8, Lsb0; 0; m]),
            m,
            k,
        }
    }

    /// Insert a key. Afterwards `might_contain(key)` is guaranteed to
    /// return true for the lifetime of the filter.
    pub fn insert(&self, key: &str) {
        let mut bits = self.bits.write();
        for pos in hash_positions(key, self.k, self.m) {
            bits.set(pos, true);
        }
    }

    /// `false` is authoritative: the key was never inserted. `true`
    /// only means "might exist" and may be a false positive.
    pub fn might_contain(&self, key: &str) -> bool {
        let bits = self.bits.read();
        hash_positions(key, self.k, self.m).all(|pos| bits[pos])
    }

    pub fn size_bits(&self) -> usize {
        self.m
    }

    pub fn hash_count(&self) -> usize {
        self.k
    }
}

/// Populate the filter from catalogue state: one key per known
/// (namespace, category id) pair. Returns the number of keys seeded.
pub async fn seed_existence_filter(
    filter: &ExistenceFilter,
    catalog: &dyn CatalogStore,
) -> OrderResult<usize> {
    let category_ids = catalog.category_ids().await?;

    let mut seeded = 0;
    for category_id in &category_ids {
        for namespace in CacheNamespace::ALL {
            filter.insert(&namespace.key(*category_id));
            seeded += 1;
        }
    }

    tracing::info!(
        categories = category_ids.len(),
        keys = seeded,
        "Existence filter seeded from catalogue"
    );
    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::catalog::Category;

    #[test]
    fn test_optimal_parameters_n100_fpr001() {
        // For n=100, FPR=0.01 expect k≈7, m≈959
        let (m, k) = optimal_parameters(100, 0.01);
        assert!((800..=1200).contains(&m), "expected m≈959, got {}", m);
        assert!((5..=9).contains(&k), "expected k≈7, got {}", k);
    }

    #[test]
    fn test_zero_insertions_degenerates_safely() {
        let (m, k) = optimal_parameters(0, 0.01);
        assert_eq!((m, k), (1, 1));
    }

    #[test]
    fn test_fpr_formula() {
        // m=1000, n=100, k=7 → FPR≈0.008
        let fpr = false_positive_rate(1000, 100, 7);
        assert!(fpr > 0.005 && fpr < 0.02, "got {}", fpr);
    }

    #[test]
    fn test_no_false_negatives_bulk() {
        let filter = ExistenceFilter::with_capacity(2000, 0.01);
        let keys: Vec<String> = (0..1000).map(|i| CacheNamespace::Dish.key(i)).collect();

        for key in &keys {
            filter.insert(key);
        }
        for key in &keys {
            assert!(
                filter.might_contain(key),
                "false negative for {} — must never occur",
                key
            );
        }
    }

    #[test]
    fn test_false_positive_rate_bounded() {
        let target = 0.01;
        let n = 500;
        let filter = ExistenceFilter::with_capacity(n, target);
        for i in 0..n {
            filter.insert(&format!("DishCache::{}", i));
        }

        let mut false_positives = 0;
        let probes = 50_000;
        for i in 0..probes {
            if filter.might_contain(&format!("SetmealCache::{}", i + 1_000_000)) {
                false_positives += 1;
            }
        }

        let actual = false_positives as f64 / probes as f64;
        // 1.5x statistical tolerance
        assert!(actual <= target * 1.5, "FPR {} exceeds target {}", actual, target);
    }

    #[test]
    fn test_absent_key_rejected() {
        let filter = ExistenceFilter::with_capacity(100, 0.01);
        filter.insert("DishCache::1");
        // An empty region of the key space: overwhelmingly rejected.
        // (A single probe could be a false positive, so check the
        // inserted key's sibling spaces in bulk instead.)
        let rejected = (100..200)
            .filter(|i| !filter.might_contain(&format!("DishCache::{}", i)))
            .count();
        assert!(rejected >= 95);
    }

    #[tokio::test]
    async fn test_seed_covers_every_namespace_pair() {
        let store = MemoryStore::new();
        for id in 1..=5 {
            store.seed_category(Category {
                id,
                name: format!("Category {}", id),
                sort_order: id as i32,
                enabled: true,
            });
        }

        let filter = ExistenceFilter::with_capacity(64, 0.01);
        let seeded = seed_existence_filter(&filter, &store).await.unwrap();
        assert_eq!(seeded, 10);

        for id in 1..=5 {
            assert!(filter.might_contain(&CacheNamespace::Dish.key(id)));
            assert!(filter.might_contain(&CacheNamespace::Setmeal.key(id)));
        }
    }
}
