//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no store access, no clock. Callers
//! inject `today` so the same inputs always produce the same quote.

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use super::models::PartyComposition;

/// Fixed base fare charged once per booking.
pub const BASE_FARE: Decimal = dec!(500);
/// Per-head rate for adults.
pub const ADULT_RATE: Decimal = dec!(200);
/// Per-head rate for children under 18.
pub const CHILD_UNDER_18_RATE: Decimal = dec!(100);
/// Per-head rate for adult-aged dependents (children over 18).
pub const CHILD_OVER_18_RATE: Decimal = dec!(150);
/// Early booking discount rate.
pub const EARLY_BOOKING_DISCOUNT: Decimal = dec!(0.20);
/// Minimum days between today and the trip for the early booking discount.
pub const EARLY_BOOKING_MIN_DAYS: i64 = 15;

/// Pricing input errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("At least one adult is required (got {adults})")]
    InvalidPartyComposition { adults: u32 },

    #[error("Invalid trip date: {0}")]
    InvalidDate(String),
}

/// Price breakdown for a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub final_price: Decimal,
    pub days_until_trip: i64,
}

impl PriceQuote {
    pub fn discount_applied(&self) -> bool {
        self.discount > Decimal::ZERO
    }
}

/// Round a currency amount half-up to `places` decimal places, keeping
/// trailing zeros so `700` renders as `700.00`.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use ocean_booking::booking::round_money;
///
/// assert_eq!(round_money(dec!(2.345), 2).to_string(), "2.35");
/// assert_eq!(round_money(dec!(700), 2).to_string(), "700.00");
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(places);
    rounded
}

/// Parse a `YYYY-MM-DD` trip date.
pub fn parse_trip_date(raw: &str) -> Result<NaiveDate, PricingError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| PricingError::InvalidDate(format!("'{}' is not a YYYY-MM-DD date", raw)))
}

/// Subtotal before discount: base fare plus per-head rates.
pub fn calculate_subtotal(party: &PartyComposition) -> Decimal {
    BASE_FARE
        + ADULT_RATE * Decimal::from(party.adults)
        + CHILD_UNDER_18_RATE * Decimal::from(party.children_under_18)
        + CHILD_OVER_18_RATE * Decimal::from(party.children_over_18)
}

/// Whole days from `today` to `trip_date`. Negative for past dates.
pub fn days_until(trip_date: NaiveDate, today: NaiveDate) -> i64 {
    (trip_date - today).num_days()
}

/// Early booking discount: a single threshold, not tiered.
pub fn calculate_discount(subtotal: Decimal, days_until_trip: i64) -> Decimal {
    if days_until_trip >= EARLY_BOOKING_MIN_DAYS {
        subtotal * EARLY_BOOKING_DISCOUNT
    } else {
        Decimal::ZERO
    }
}

/// Compute the price of a booking.
///
/// Fails if there is no adult in the party or the trip date is before `today`.
/// Used for new bookings and edits of unpaid bookings; a paid booking's trip
/// fields are frozen and never re-priced.
pub fn compute_price(
    party: &PartyComposition,
    trip_date: NaiveDate,
    today: NaiveDate,
) -> Result<PriceQuote, PricingError> {
    if party.adults < 1 {
        return Err(PricingError::InvalidPartyComposition {
            adults: party.adults,
        });
    }

    let days_until_trip = days_until(trip_date, today);
    if days_until_trip < 0 {
        return Err(PricingError::InvalidDate(format!(
            "{} is in the past",
            trip_date
        )));
    }

    let subtotal = calculate_subtotal(party);
    let discount = round_money(calculate_discount(subtotal, days_until_trip), 2);
    let final_price = round_money(subtotal - discount, 2);

    Ok(PriceQuote {
        subtotal: round_money(subtotal, 2),
        discount,
        final_price,
        days_until_trip,
    })
}

/// Rebuild the breakdown of a stored price for display.
///
/// The subtotal is recomputed from the party; whatever separates it from the
/// stored price is shown as the discount.
pub fn breakdown_stored_price(party: &PartyComposition, stored_price: Decimal) -> (Decimal, Decimal) {
    let subtotal = round_money(calculate_subtotal(party), 2);
    let discount = round_money((subtotal - stored_price).max(Decimal::ZERO), 2);
    (subtotal, discount)
}
