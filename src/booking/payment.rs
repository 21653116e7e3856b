//! Payment simulation.
//!
//! There is no payment gateway: the user picks the outcome on the review
//! screen. The choice goes through [`PaymentSimulator`] so a real gateway can
//! replace it without touching the booking rules.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use super::models::{Email, PaymentStatus};

/// A payment attempt for a booking.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub email: Email,
    pub amount: Option<Decimal>,
    /// Outcome picked in the simulation UI, if any.
    pub requested: Option<PaymentStatus>,
}

#[async_trait]
pub trait PaymentSimulator: Send + Sync {
    /// Decide the outcome of a payment attempt.
    async fn decide(&self, request: &PaymentRequest) -> PaymentStatus;
}

/// Honors the outcome the user picked. No pick leaves the payment pending.
pub struct UserChoiceSimulator;

#[async_trait]
impl PaymentSimulator for UserChoiceSimulator {
    async fn decide(&self, request: &PaymentRequest) -> PaymentStatus {
        let status = request.requested.unwrap_or(PaymentStatus::Pending);
        info!(email = %request.email, %status, "Simulated payment by user choice");
        status
    }
}

/// Always decides the same outcome.
pub struct FixedOutcomeSimulator(pub PaymentStatus);

#[async_trait]
impl PaymentSimulator for FixedOutcomeSimulator {
    async fn decide(&self, request: &PaymentRequest) -> PaymentStatus {
        info!(email = %request.email, status = %self.0, "Simulated payment with fixed outcome");
        self.0
    }
}
