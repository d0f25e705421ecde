//! Timeout sweeps
//!
//! Two independently scheduled periodic tasks drive stuck orders
//! through lifecycle transitions:
//!
//! - payment-timeout sweep: every minute, cancels orders that sat in
//!   PENDING_PAYMENT past the payment deadline (nothing was paid, so
//!   no refund compensation)
//! - delivery-completion sweep: once a day at an off-peak hour,
//!   force-completes orders stuck in DELIVERY_IN_PROGRESS
//!
//! A pass runs to completion once started; the cancellation token is
//! only consulted between passes, so shutdown drains in-flight work.
//! One order's failure inside a pass is logged and never aborts the
//! rest of the batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, TimeZone, Timelike};
use tokio_util::sync::CancellationToken;

use crate::core::Config;
use crate::store::OrderStore;
use shared::order::{CANCEL_REASON_PAYMENT_TIMEOUT, OrderStatus};
use shared::util::now_millis;

pub struct TimeoutSweeper {
    orders: Arc<dyn OrderStore>,
    shutdown: CancellationToken,
    payment_timeout_minutes: i64,
    payment_sweep_interval: Duration,
    completion_sweep_hour: u32,
    completion_grace_minutes: i64,
}

impl TimeoutSweeper {
    pub fn new(orders: Arc<dyn OrderStore>, shutdown: CancellationToken, config: &Config) -> Self {
        Self {
            orders,
            shutdown,
            payment_timeout_minutes: config.payment_timeout_minutes,
            payment_sweep_interval: Duration::from_secs(config.payment_sweep_interval_secs),
            completion_sweep_hour: config.completion_sweep_hour,
            completion_grace_minutes: config.completion_grace_minutes,
        }
    }

    // =========================================================================
    // Payment-timeout sweep
    // =========================================================================

    /// 周期循环：每个扫描间隔触发一次支付超时处理
    pub async fn run_payment_sweep(self: Arc<Self>) {
        tracing::info!(
            interval_secs = self.payment_sweep_interval.as_secs(),
            timeout_minutes = self.payment_timeout_minutes,
            "Payment-timeout sweep started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.payment_sweep_interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Payment-timeout sweep received shutdown signal");
                    return;
                }
            }

            self.payment_pass().await;
        }
    }

    /// One payment-timeout pass. Returns how many orders were
    /// cancelled; failures are logged per order and skipped.
    pub async fn payment_pass(&self) -> usize {
        let cutoff = now_millis() - self.payment_timeout_minutes * 60_000;

        let stale = match self
            .orders
            .query_by_status_and_time_before(OrderStatus::PendingPayment, cutoff)
            .await
        {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "Payment-timeout sweep query failed");
                return 0;
            }
        };

        if stale.is_empty() {
            return 0;
        }
        tracing::info!(count = stale.len(), "Cancelling payment-timeout orders");

        let mut cancelled = 0;
        for order in stale {
            let mut next = order;
            next.status = OrderStatus::Cancelled;
            next.cancel_reason = Some(CANCEL_REASON_PAYMENT_TIMEOUT.to_string());
            next.cancel_time = Some(now_millis());
            // Nothing was paid, so no refund compensation here.

            match self.orders.update(&next).await {
                Ok(committed) => {
                    cancelled += 1;
                    tracing::info!(
                        order_id = committed.id,
                        number = %committed.number,
                        "Order auto-cancelled after payment timeout"
                    );
                }
                Err(e) => {
                    // A racing interactive transition (e.g. the user
                    // cancelling themselves) wins; log and keep going.
                    tracing::warn!(order_id = next.id, error = %e, "Skipping order in sweep");
                }
            }
        }
        cancelled
    }

    // =========================================================================
    // Delivery-completion sweep
    // =========================================================================

    /// 周期循环：每天在 completion_sweep_hour 触发一次
    pub async fn run_completion_sweep(self: Arc<Self>) {
        tracing::info!(
            hour = self.completion_sweep_hour,
            grace_minutes = self.completion_grace_minutes,
            "Delivery-completion sweep started"
        );

        loop {
            let sleep_duration = duration_until_hour(self.completion_sweep_hour);
            tracing::debug!(
                minutes = sleep_duration.as_secs() / 60,
                "Next delivery-completion trigger scheduled"
            );

            tokio::select! {
                _ = tokio::time::sleep(sleep_duration) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Delivery-completion sweep received shutdown signal");
                    return;
                }
            }

            self.completion_pass().await;
        }
    }

    /// One delivery-completion pass: force-complete orders that have
    /// been out for delivery past the grace period.
    pub async fn completion_pass(&self) -> usize {
        let cutoff = now_millis() - self.completion_grace_minutes * 60_000;

        let stale = match self
            .orders
            .query_by_status_and_time_before(OrderStatus::DeliveryInProgress, cutoff)
            .await
        {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "Delivery-completion sweep query failed");
                return 0;
            }
        };

        if stale.is_empty() {
            return 0;
        }
        tracing::info!(count = stale.len(), "Force-completing stale delivery orders");

        let mut completed = 0;
        for order in stale {
            let mut next = order;
            next.status = OrderStatus::Completed;
            next.delivery_time = Some(now_millis());

            match self.orders.update(&next).await {
                Ok(committed) => {
                    completed += 1;
                    tracing::info!(
                        order_id = committed.id,
                        number = %committed.number,
                        "Order force-completed by sweep"
                    );
                }
                Err(e) => {
                    tracing::warn!(order_id = next.id, error = %e, "Skipping order in sweep");
                }
            }
        }
        completed
    }
}

/// Wall-clock duration until the next occurrence of `hour:00:00`
/// local time.
fn duration_until_hour(hour: u32) -> Duration {
    let now = Local::now();
    let today = now.date_naive();

    let target_date = if now.time().hour() >= hour {
        today + chrono::Duration::days(1)
    } else {
        today
    };

    let target = target_date
        .and_hms_opt(hour, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest());

    match target {
        Some(target) => target
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::from_secs(60)),
        // DST edge case: fall back to an hourly retry.
        None => Duration::from_secs(3600),
    }
}
