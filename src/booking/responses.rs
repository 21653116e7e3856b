//! Response DTOs for booking API endpoints.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::calculators::PriceQuote;
use super::drafts::BookingDraft;
use super::gate::{Editability, NextStep, PaymentOutcome};
use super::models::BookingRecord;

/// All prices are quoted in US dollars.
pub const CURRENCY: &str = "USD";

/// Money value for JSON responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl MoneyResponse {
    pub fn usd(amount: Decimal) -> Self {
        Self {
            amount,
            currency: CURRENCY.to_string(),
        }
    }
}

/// Price breakdown
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub subtotal: MoneyResponse,
    pub discount: MoneyResponse,
    pub final_price: MoneyResponse,
    pub days_until_trip: i64,
    pub discount_applied: bool,
}

impl From<PriceQuote> for QuoteResponse {
    fn from(quote: PriceQuote) -> Self {
        Self {
            subtotal: MoneyResponse::usd(quote.subtotal),
            discount: MoneyResponse::usd(quote.discount),
            final_price: MoneyResponse::usd(quote.final_price),
            days_until_trip: quote.days_until_trip,
            discount_applied: quote.discount_applied(),
        }
    }
}

/// Response for a step-one submission
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub booking: BookingRecord,
    pub editability: Editability,
    pub next_step: NextStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<QuoteResponse>,
}

/// Dashboard view of the caller's booking
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub email: String,
    pub booking: Option<BookingRecord>,
    pub editability: Editability,
}

/// Stored price shown on the review screen
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdownResponse {
    pub subtotal: MoneyResponse,
    pub discount: MoneyResponse,
    pub final_price: MoneyResponse,
}

/// Response for the review screen
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub next_step: Option<NextStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceBreakdownResponse>,
}

/// Response for a payment attempt
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub booking: BookingRecord,
    pub outcome: PaymentOutcome,
    pub message: String,
}

/// Response for session endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<Uuid>,
    pub email: String,
    pub expires_in_seconds: i64,
}

/// Response wrapping a saved draft
#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft: BookingDraft,
}

/// Generic error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}
