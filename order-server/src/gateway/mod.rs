//! External collaborators invoked by the order lifecycle.
//!
//! Each seam is a trait so the lifecycle never depends on a concrete
//! protocol: payments may be a no-op simulation, route planning an
//! HTTP service or a fixed stub, notifications an in-process
//! broadcast channel.

pub mod geo;
pub mod notifier;
pub mod payment;

pub use geo::{FixedDistance, GeoDistanceService, GeoError, RoutePlanner};
pub use notifier::{BroadcastNotifier, NotificationEvent, Notifier, NotifyError};
pub use payment::{PayError, PaymentGateway, PaymentTicket, RefundReceipt, SimulatedPaymentGateway};
