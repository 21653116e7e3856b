//! Booking service functions with contact store access.
//!
//! Each function reads the stored booking, asks the gate what may change,
//! prices on the server when trip fields change, and persists through the
//! contact store. Nothing is retried and nothing is kept if a store call
//! fails: the last persisted record stays authoritative.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::crm::ContactStore;
use crate::error::{AppError, Result};

use super::calculators::{breakdown_stored_price, compute_price, PriceQuote, PricingError};
use super::drafts::DraftStore;
use super::gate::{
    allows_status_change, applies_trip_fields, resolve_editability, resolve_next_step,
    resolve_payment_outcome, resolve_review_access, EditIntent, Editability, NextStep,
    PaymentOutcome, ReviewAccess,
};
use super::models::{
    BookingPatch, BookingRecord, Email, PartyComposition, PaymentStatus, PersonalDetails, TripDetails,
};
use super::payment::{PaymentRequest, PaymentSimulator};

/// Validated personal/trip-info step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSubmission {
    pub email: Email,
    pub personal: PersonalDetails,
    pub adults: Option<u32>,
    pub children_under_18: Option<u32>,
    pub children_over_18: Option<u32>,
    pub trip_date: Option<NaiveDate>,
    pub personal_only: bool,
}

impl BookingSubmission {
    fn touches_trip(&self) -> bool {
        self.adults.is_some()
            || self.children_under_18.is_some()
            || self.children_over_18.is_some()
            || self.trip_date.is_some()
    }

    /// Trip fields from the submission, falling back to the stored booking.
    fn trip_details(&self, existing: Option<&BookingRecord>) -> Result<TripDetails> {
        let adults = self
            .adults
            .or(existing.map(|r| r.adults))
            .ok_or_else(|| AppError::Validation("adults is required".into()))?;
        let trip_date = self
            .trip_date
            .or(existing.and_then(|r| r.trip_date))
            .ok_or_else(|| PricingError::InvalidDate("tripDate is required".into()))?;

        Ok(TripDetails {
            party: PartyComposition {
                adults,
                children_under_18: self
                    .children_under_18
                    .or(existing.map(|r| r.children_under_18))
                    .unwrap_or(0),
                children_over_18: self
                    .children_over_18
                    .or(existing.map(|r| r.children_over_18))
                    .unwrap_or(0),
            },
            trip_date,
        })
    }
}

/// Result of a step-one submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub record: BookingRecord,
    pub editability: Editability,
    pub next_step: NextStep,
    /// Present when the booking was (re)priced.
    pub quote: Option<PriceQuote>,
}

/// What the review screen should do.
#[derive(Debug, Clone)]
pub enum ReviewView {
    RedirectToDashboard,
    Show {
        record: BookingRecord,
        breakdown: Option<StoredPriceBreakdown>,
    },
}

/// Display breakdown of a stored price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredPriceBreakdown {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub final_price: Decimal,
}

/// Result of a payment attempt.
#[derive(Debug, Clone)]
pub struct PaymentSettlement {
    pub record: BookingRecord,
    pub outcome: PaymentOutcome,
    /// False when the booking was already paid and nothing was written.
    pub changed: bool,
}

/// User-facing message for a payment outcome.
pub fn outcome_message(status: PaymentStatus, changed: bool) -> &'static str {
    match (status, changed) {
        (PaymentStatus::Paid, false) => "This booking is already paid. Redirecting to dashboard...",
        (PaymentStatus::Paid, true) => "Payment successful. Redirecting to dashboard...",
        (PaymentStatus::Pending, _) => "Payment still pending. Please try again after sometime.",
        (PaymentStatus::Failed, _) => "Payment failed. Please try again after sometime.",
    }
}

/// Price preview. Touches no store.
pub fn quote(party: &PartyComposition, trip_date: NaiveDate, today: NaiveDate) -> Result<PriceQuote> {
    Ok(compute_price(party, trip_date, today)?)
}

async fn require_booking(store: &dyn ContactStore, email: &Email) -> Result<BookingRecord> {
    store
        .fetch_contact(email)
        .await?
        .ok_or_else(|| AppError::NotFound("No booking found for this email".into()))
}

/// Current booking (if any) and what the user may edit on it.
pub async fn dashboard(
    store: &dyn ContactStore,
    email: &Email,
) -> Result<(Option<BookingRecord>, Editability)> {
    let record = store.fetch_contact(email).await?;
    let editability = resolve_editability(record.as_ref().map(|r| r.payment_status));
    Ok((record, editability))
}

/// Submit the personal/trip-info step.
///
/// New bookings are created `Pending` and priced. Unpaid bookings are
/// re-priced from the submitted trip. Personal-only edits and edits of a
/// paid booking write personal fields only; submitted trip fields are
/// dropped.
pub async fn submit_booking(
    store: &dyn ContactStore,
    submission: BookingSubmission,
    today: NaiveDate,
) -> Result<SubmissionOutcome> {
    let existing = store.fetch_contact(&submission.email).await?;
    let existing_status = existing.as_ref().map(|r| r.payment_status);
    let intent = EditIntent::from_personal_only(submission.personal_only);

    let editability = resolve_editability(existing_status);
    let next_step = resolve_next_step(intent, existing_status);

    if !applies_trip_fields(intent, existing_status) {
        if submission.touches_trip() {
            debug!(email = %submission.email, "Ignoring trip fields on personal-only edit");
        }
        let patch = BookingPatch {
            personal: submission.personal,
            ..Default::default()
        };
        let record = store.patch_booking_fields(&submission.email, &patch).await?;
        info!(email = %record.email, "Updated personal details");
        return Ok(SubmissionOutcome {
            record,
            editability,
            next_step,
            quote: None,
        });
    }

    let trip = submission.trip_details(existing.as_ref())?;
    let quote = compute_price(&trip.party, trip.trip_date, today)?;

    let mut record = existing.unwrap_or_else(|| BookingRecord::new(submission.email.clone()));
    record.apply_personal(&submission.personal);
    record.apply_trip(&trip, quote.final_price);

    let record = store.upsert_contact(&record).await?;
    info!(
        email = %record.email,
        price = %quote.final_price,
        status = %record.payment_status,
        "Saved booking"
    );

    Ok(SubmissionOutcome {
        record,
        editability,
        next_step,
        quote: Some(quote),
    })
}

/// Review-and-payment screen. A paid booking is never shown for review.
pub async fn review_booking(store: &dyn ContactStore, email: &Email) -> Result<ReviewView> {
    let record = require_booking(store, email).await?;
    match resolve_review_access(record.payment_status) {
        ReviewAccess::RedirectToDashboard => Ok(ReviewView::RedirectToDashboard),
        ReviewAccess::Show => {
            let breakdown = record.price.map(|final_price| {
                let (subtotal, discount) = breakdown_stored_price(&record.party(), final_price);
                StoredPriceBreakdown {
                    subtotal,
                    discount,
                    final_price,
                }
            });
            Ok(ReviewView::Show { record, breakdown })
        }
    }
}

/// Set the payment status and apply its consequences.
///
/// A paid booking cannot be moved back to `Pending` or `Failed`; its trip
/// would otherwise become editable again. Re-sending `Paid` is a no-op.
pub async fn update_payment_status(
    store: &dyn ContactStore,
    drafts: &DraftStore,
    email: &Email,
    status: PaymentStatus,
) -> Result<(BookingRecord, PaymentOutcome)> {
    let existing = require_booking(store, email).await?;
    if !allows_status_change(existing.payment_status, status) {
        return Err(AppError::Validation(format!(
            "Booking is already paid; payment status cannot change to {status}"
        )));
    }
    if existing.payment_status == status && status == PaymentStatus::Paid {
        return Ok((existing, resolve_payment_outcome(status)));
    }
    write_payment_status(store, drafts, email, status).await
}

async fn write_payment_status(
    store: &dyn ContactStore,
    drafts: &DraftStore,
    email: &Email,
    status: PaymentStatus,
) -> Result<(BookingRecord, PaymentOutcome)> {
    let record = store.patch_payment_status(email, status).await?;
    let outcome = resolve_payment_outcome(status);
    if outcome.clear_draft {
        drafts.clear(email).await;
    }
    info!(email = %email, %status, terminal = outcome.terminal, "Payment status updated");
    Ok((record, outcome))
}

/// Run a payment attempt from the review screen.
pub async fn settle_payment(
    store: &dyn ContactStore,
    drafts: &DraftStore,
    simulator: &dyn PaymentSimulator,
    email: &Email,
    requested: Option<PaymentStatus>,
) -> Result<PaymentSettlement> {
    let record = require_booking(store, email).await?;

    if resolve_review_access(record.payment_status) == ReviewAccess::RedirectToDashboard {
        debug!(email = %email, "Booking already paid, not charging again");
        return Ok(PaymentSettlement {
            outcome: resolve_payment_outcome(record.payment_status),
            record,
            changed: false,
        });
    }

    let request = PaymentRequest {
        email: email.clone(),
        amount: record.price,
        requested,
    };
    let status = simulator.decide(&request).await;
    let (record, outcome) = write_payment_status(store, drafts, email, status).await?;

    Ok(PaymentSettlement {
        record,
        outcome,
        changed: true,
    })
}

/// Partial update of an existing booking.
///
/// Trip fields are dropped once paid. Otherwise any trip change re-prices
/// the booking from the merged party and date; a client-sent price is never
/// used.
pub async fn update_booking_details(
    store: &dyn ContactStore,
    email: &Email,
    patch: BookingPatch,
    today: NaiveDate,
) -> Result<BookingRecord> {
    let existing = require_booking(store, email).await?;
    let editability = resolve_editability(Some(existing.payment_status));

    let mut patch = BookingPatch { price: None, ..patch };
    if !editability.trip_fields_editable {
        if patch.touches_trip() {
            debug!(email = %email, "Ignoring trip fields on paid booking");
        }
        patch = patch.personal_only();
    } else if patch.touches_trip() {
        let mut merged = existing.clone();
        patch.apply_to(&mut merged);
        let trip_date = merged
            .trip_date
            .ok_or_else(|| PricingError::InvalidDate("tripDate is required".into()))?;
        let quote = compute_price(&merged.party(), trip_date, today)?;
        patch.price = Some(quote.final_price);
    }

    if patch.is_empty() {
        return Ok(existing);
    }

    let record = store.patch_booking_fields(email, &patch).await?;
    info!(email = %email, "Updated booking details");
    Ok(record)
}
