//! Order lifecycle module
//!
//! - **lifecycle**: the state machine owning every legal transition,
//!   including refund compensation and cancellation bookkeeping
//! - **sweeper**: periodic timeout sweeps driving stuck orders through
//!   lifecycle transitions
//!
//! # Transition table
//!
//! ```text
//! PENDING_PAYMENT(1) → TO_BE_CONFIRMED(2) → CONFIRMED(3)
//!        → DELIVERY_IN_PROGRESS(4) → COMPLETED(5)
//! CANCELLED(6) reachable from ranks 1-4
//! ```

pub mod lifecycle;
pub mod sweeper;

pub use lifecycle::{OrderLifecycle, OrderStatistics};
pub use sweeper::TimeoutSweeper;
