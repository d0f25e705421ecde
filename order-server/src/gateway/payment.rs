//! Payment gateway seam.
//!
//! The lifecycle calls out here at two points: ticket creation when a
//! user starts paying, and refund compensation when a paid order is
//! cancelled. The state machine's contract must hold even when the
//! gateway is the no-op simulation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayError {
    #[error("Payment provider unreachable: {0}")]
    Unreachable(String),

    #[error("Payment rejected: {0}")]
    Rejected(String),
}

/// Prepay ticket handed back to the client to finish payment.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PaymentTicket {
    pub order_number: String,
    pub prepay_id: String,
    pub created_at: i64,
}

/// Acknowledgement of a refund request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RefundReceipt {
    pub order_number: String,
    pub refund_number: String,
    pub refund_amount: Decimal,
    pub accepted_at: i64,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn pay(
        &self,
        order_number: &str,
        amount: Decimal,
        description: &str,
        payer_ref: &str,
    ) -> Result<PaymentTicket, PayError>;

    async fn refund(
        &self,
        order_number: &str,
        refund_number: &str,
        refund_amount: Decimal,
        original_amount: Decimal,
    ) -> Result<RefundReceipt, PayError>;
}

/// Always-succeeding gateway used when no real provider is wired up.
pub struct SimulatedPaymentGateway;

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn pay(
        &self,
        order_number: &str,
        amount: Decimal,
        description: &str,
        payer_ref: &str,
    ) -> Result<PaymentTicket, PayError> {
        tracing::info!(
            order_number = %order_number,
            amount = %amount,
            description = %description,
            payer_ref = %payer_ref,
            "Simulated payment: issuing prepay ticket"
        );
        Ok(PaymentTicket {
            order_number: order_number.to_string(),
            prepay_id: uuid::Uuid::new_v4().to_string(),
            created_at: shared::util::now_millis(),
        })
    }

    async fn refund(
        &self,
        order_number: &str,
        refund_number: &str,
        refund_amount: Decimal,
        original_amount: Decimal,
    ) -> Result<RefundReceipt, PayError> {
        tracing::info!(
            order_number = %order_number,
            refund_number = %refund_number,
            refund_amount = %refund_amount,
            original_amount = %original_amount,
            "Simulated payment: refund accepted"
        );
        Ok(RefundReceipt {
            order_number: order_number.to_string(),
            refund_number: refund_number.to_string(),
            refund_amount,
            accepted_at: shared::util::now_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_gateway_round_trip() {
        let gateway = SimulatedPaymentGateway;
        let ticket = gateway
            .pay("1001", Decimal::new(2500, 2), "delivery order", "user-7")
            .await
            .unwrap();
        assert_eq!(ticket.order_number, "1001");
        assert!(!ticket.prepay_id.is_empty());

        let receipt = gateway
            .refund("1001", "1001", Decimal::new(2500, 2), Decimal::new(2500, 2))
            .await
            .unwrap();
        assert_eq!(receipt.refund_number, "1001");
        assert_eq!(receipt.refund_amount, Decimal::new(2500, 2));
    }
}
