//! Booking route handlers

use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};

use crate::error::{AppError, Result};
use crate::extract::JsonBody;
use crate::session::SessionContext;
use crate::AppState;

use super::calculators::parse_trip_date;
use super::drafts::BookingDraft;
use super::gate::{Editability, NextStep};
use super::models::{BookingRecord, Email};
use super::requests::{ContactRequest, PaymentAttemptRequest, PaymentStatusRequest, QuoteRequest};
use super::responses::{
    DashboardResponse, DraftResponse, MoneyResponse, PaymentResponse, PriceBreakdownResponse,
    QuoteResponse, ReviewResponse, SubmissionResponse,
};
use super::services::{self, outcome_message, ReviewView};

/// Booking routes: the contact interop surface and the session-scoped flow.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contact", post(create_or_update_contact))
        .route("/contact/:email", get(get_contact))
        .route("/contact/:email/payment", patch(update_payment_status))
        .route("/contact/:email/booking", patch(update_booking_details))
        .route("/booking", get(current_booking).post(submit_booking))
        .route("/booking/quote", post(quote))
        .route("/booking/editability", get(editability))
        .route("/booking/review", get(review))
        .route("/booking/payment", post(pay))
        .route("/booking/draft", get(get_draft).put(save_draft))
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// The email is the identity key and cannot be changed by an edit.
fn ensure_same_email(request: &ContactRequest, email: &Email) -> Result<()> {
    if request.email.is_some() && request.email()? != *email {
        return Err(AppError::Validation("email cannot be changed".into()));
    }
    Ok(())
}

// ==================== contact interop surface ====================

async fn get_contact(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<BookingRecord>> {
    let email = Email::parse(&email)?;
    let record = state
        .store
        .fetch_contact(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("No booking found for this email".into()))?;
    Ok(Json(record))
}

async fn create_or_update_contact(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ContactRequest>,
) -> Result<Json<BookingRecord>> {
    let email = request.email()?;
    let submission = request.into_submission(email)?;
    let outcome = services::submit_booking(state.store.as_ref(), submission, today()).await?;
    Ok(Json(outcome.record))
}

async fn update_payment_status(
    State(state): State<AppState>,
    Path(email): Path<String>,
    JsonBody(request): JsonBody<PaymentStatusRequest>,
) -> Result<Json<BookingRecord>> {
    let email = Email::parse(&email)?;
    let status = request.status()?;
    let (record, _) =
        services::update_payment_status(state.store.as_ref(), &state.drafts, &email, status).await?;
    Ok(Json(record))
}

async fn update_booking_details(
    State(state): State<AppState>,
    Path(email): Path<String>,
    JsonBody(request): JsonBody<ContactRequest>,
) -> Result<Json<BookingRecord>> {
    let email = Email::parse(&email)?;
    ensure_same_email(&request, &email)?;
    let patch = request.into_patch()?;
    let record =
        services::update_booking_details(state.store.as_ref(), &email, patch, today()).await?;
    Ok(Json(record))
}

// ==================== session-scoped flow ====================

async fn quote(
    _session: SessionContext,
    JsonBody(request): JsonBody<QuoteRequest>,
) -> Result<Json<QuoteResponse>> {
    let party = request.party()?;
    let trip_date = parse_trip_date(&request.trip_date)?;
    let quote = services::quote(&party, trip_date, today())?;
    Ok(Json(quote.into()))
}

async fn current_booking(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<DashboardResponse>> {
    let (booking, editability) = services::dashboard(state.store.as_ref(), &session.email).await?;
    Ok(Json(DashboardResponse {
        email: session.email.to_string(),
        booking,
        editability,
    }))
}

async fn editability(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<Editability>> {
    let (_, editability) = services::dashboard(state.store.as_ref(), &session.email).await?;
    Ok(Json(editability))
}

async fn submit_booking(
    State(state): State<AppState>,
    session: SessionContext,
    JsonBody(request): JsonBody<ContactRequest>,
) -> Result<Json<SubmissionResponse>> {
    ensure_same_email(&request, &session.email)?;
    let submission = request.into_submission(session.email)?;
    let outcome = services::submit_booking(state.store.as_ref(), submission, today()).await?;

    Ok(Json(SubmissionResponse {
        booking: outcome.record,
        editability: outcome.editability,
        next_step: outcome.next_step,
        quote: outcome.quote.map(Into::into),
    }))
}

async fn review(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<ReviewResponse>> {
    let response = match services::review_booking(state.store.as_ref(), &session.email).await? {
        ReviewView::RedirectToDashboard => ReviewResponse {
            next_step: Some(NextStep::GoToDashboard),
            booking: None,
            price: None,
        },
        ReviewView::Show { record, breakdown } => ReviewResponse {
            next_step: None,
            booking: Some(record),
            price: breakdown.map(|b| PriceBreakdownResponse {
                subtotal: MoneyResponse::usd(b.subtotal),
                discount: MoneyResponse::usd(b.discount),
                final_price: MoneyResponse::usd(b.final_price),
            }),
        },
    };
    Ok(Json(response))
}

async fn pay(
    State(state): State<AppState>,
    session: SessionContext,
    JsonBody(request): JsonBody<PaymentAttemptRequest>,
) -> Result<Json<PaymentResponse>> {
    let requested = request.outcome()?;
    let settlement = services::settle_payment(
        state.store.as_ref(),
        &state.drafts,
        state.payments.as_ref(),
        &session.email,
        requested,
    )
    .await?;

    Ok(Json(PaymentResponse {
        message: outcome_message(settlement.outcome.status, settlement.changed).to_string(),
        booking: settlement.record,
        outcome: settlement.outcome,
    }))
}

async fn get_draft(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<DraftResponse>> {
    let draft = state
        .drafts
        .get(&session.email)
        .await
        .ok_or_else(|| AppError::NotFound("No draft saved".into()))?;
    Ok(Json(DraftResponse { draft }))
}

async fn save_draft(
    State(state): State<AppState>,
    session: SessionContext,
    JsonBody(step): JsonBody<BookingDraft>,
) -> Json<DraftResponse> {
    let draft = state.drafts.save(&session.email, step, Utc::now()).await;
    Json(DraftResponse { draft })
}
