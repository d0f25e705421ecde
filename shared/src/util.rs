//! Small shared utilities: timestamps, row IDs and order numbers.

use std::sync::atomic::{AtomicI64, Ordering};

/// Current UTC timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as a resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms)
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Last order number handed out, for monotonicity across calls.
static LAST_ORDER_NUMBER: AtomicI64 = AtomicI64::new(0);

/// Generate a globally unique order number from the wall clock.
///
/// Derived from the current millisecond timestamp, bumped past the
/// previously issued number so two submissions inside the same
/// millisecond never collide and numbers are strictly increasing
/// within a process.
pub fn next_order_number() -> String {
    let mut candidate;
    loop {
        let last = LAST_ORDER_NUMBER.load(Ordering::Acquire);
        candidate = now_millis().max(last + 1);
        if LAST_ORDER_NUMBER
            .compare_exchange(last, candidate, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            break;
        }
    }
    candidate.to_string()
}
