//! Booking state gate.
//!
//! Decides, from the stored payment status, which fields a submission may
//! change and which screen the flow moves to next. Total over
//! [`PaymentStatus`]; nothing here can fail.

use serde::Serialize;

use super::models::PaymentStatus;

/// Which groups of fields the user may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Editability {
    pub personal_fields_editable: bool,
    pub trip_fields_editable: bool,
}

/// Where the flow goes after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NextStep {
    GoToReview,
    GoToDashboard,
}

/// What the caller intended to edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditIntent {
    #[default]
    Full,
    PersonalOnly,
}

impl EditIntent {
    pub fn from_personal_only(personal_only: bool) -> Self {
        if personal_only {
            EditIntent::PersonalOnly
        } else {
            EditIntent::Full
        }
    }
}

/// Whether the review-and-payment screen may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAccess {
    Show,
    RedirectToDashboard,
}

/// What a payment status update means for the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub status: PaymentStatus,
    pub next_step: NextStep,
    /// The booking is complete; no further payment attempt is offered.
    pub terminal: bool,
    /// The saved step draft should be discarded.
    pub clear_draft: bool,
}

/// Personal fields are always editable. Trip fields freeze once paid.
///
/// `existing` is `None` for a booking that has not been created yet.
pub fn resolve_editability(existing: Option<PaymentStatus>) -> Editability {
    Editability {
        personal_fields_editable: true,
        trip_fields_editable: existing != Some(PaymentStatus::Paid),
    }
}

/// Route after the personal/trip-info step is submitted.
pub fn resolve_next_step(intent: EditIntent, existing: Option<PaymentStatus>) -> NextStep {
    match (intent, existing) {
        (EditIntent::PersonalOnly, _) => NextStep::GoToDashboard,
        (_, Some(PaymentStatus::Paid)) => NextStep::GoToDashboard,
        (EditIntent::Full, None | Some(PaymentStatus::Pending | PaymentStatus::Failed)) => {
            NextStep::GoToReview
        }
    }
}

/// Whether trip fields in a submission are applied to the record.
///
/// A personal-only edit of an existing booking leaves its trip untouched even
/// while unpaid. A brand-new booking always carries its trip.
pub fn applies_trip_fields(intent: EditIntent, existing: Option<PaymentStatus>) -> bool {
    match existing {
        None => true,
        Some(_) => resolve_editability(existing).trip_fields_editable && intent == EditIntent::Full,
    }
}

/// A completed purchase is never re-offered for review.
pub fn resolve_review_access(existing: PaymentStatus) -> ReviewAccess {
    match existing {
        PaymentStatus::Paid => ReviewAccess::RedirectToDashboard,
        PaymentStatus::Pending | PaymentStatus::Failed => ReviewAccess::Show,
    }
}

/// A paid booking stays paid. Pending and failed bookings may move to any
/// status, so a failed payment can be retried.
pub fn allows_status_change(from: PaymentStatus, to: PaymentStatus) -> bool {
    from != PaymentStatus::Paid || to == PaymentStatus::Paid
}

/// Every payment outcome returns to the dashboard; only `Paid` is terminal.
pub fn resolve_payment_outcome(status: PaymentStatus) -> PaymentOutcome {
    let paid = status == PaymentStatus::Paid;
    PaymentOutcome {
        status,
        next_step: NextStep::GoToDashboard,
        terminal: paid,
        clear_draft: paid,
    }
}
