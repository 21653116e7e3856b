//! Request DTOs for booking API endpoints.

use std::str::FromStr;

use serde::Deserialize;

use crate::error::AppError;

use super::calculators::parse_trip_date;
use super::models::{BookingPatch, Email, PartyComposition, PaymentStatus, PersonalDetails};
use super::services::BookingSubmission;

/// Contact create/update body (`POST /contact`, `POST /booking`,
/// `PATCH /contact/:email/booking`).
///
/// Counts arrive as signed integers so negative values are reported as
/// validation errors rather than body rejections. `price` and
/// `paymentStatus` are accepted for compatibility but never trusted.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub adults: Option<i64>,
    #[serde(default)]
    pub children_under_18: Option<i64>,
    #[serde(default)]
    pub children_over_18: Option<i64>,
    #[serde(default)]
    pub trip_date: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub personal_only: bool,
}

fn non_negative(value: Option<i64>, field: &str) -> Result<Option<u32>, AppError> {
    value
        .map(|n| {
            u32::try_from(n)
                .map_err(|_| AppError::Validation(format!("{field} must be a non-negative integer")))
        })
        .transpose()
}

/// Trimmed text; present-but-blank is an error.
fn non_blank(value: Option<String>, field: &str) -> Result<Option<String>, AppError> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Err(AppError::Validation(format!("{field} cannot be empty"))),
        Some(v) => Ok(Some(v.trim().to_string())),
    }
}

impl ContactRequest {
    /// The email in the body, validated.
    pub fn email(&self) -> Result<Email, AppError> {
        let raw = self
            .email
            .as_deref()
            .ok_or_else(|| AppError::Validation("email is required".into()))?;
        Ok(Email::parse(raw)?)
    }

    /// Validate everything except identity into a patch.
    pub fn into_patch(self) -> Result<BookingPatch, AppError> {
        if let Some(status) = &self.payment_status {
            PaymentStatus::from_str(status).map_err(|e| AppError::Validation(e.to_string()))?;
        }

        Ok(BookingPatch {
            personal: PersonalDetails {
                first_name: non_blank(self.first_name, "firstName")?,
                last_name: non_blank(self.last_name, "lastName")?,
                phone: non_blank(self.phone, "phone")?,
            },
            adults: non_negative(self.adults, "adults")?,
            children_under_18: non_negative(self.children_under_18, "childrenUnder18")?,
            children_over_18: non_negative(self.children_over_18, "childrenOver18")?,
            trip_date: self.trip_date.as_deref().map(parse_trip_date).transpose()?,
            // Derived server-side.
            price: None,
        })
    }

    /// Validate into a step-one submission for `email`.
    pub fn into_submission(self, email: Email) -> Result<BookingSubmission, AppError> {
        let personal_only = self.personal_only;
        let patch = self.into_patch()?;
        Ok(BookingSubmission {
            email,
            personal: patch.personal,
            adults: patch.adults,
            children_under_18: patch.children_under_18,
            children_over_18: patch.children_over_18,
            trip_date: patch.trip_date,
            personal_only,
        })
    }
}

/// Price preview body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub adults: i64,
    #[serde(default)]
    pub children_under_18: i64,
    #[serde(default)]
    pub children_over_18: i64,
    pub trip_date: String,
}

impl QuoteRequest {
    pub fn party(&self) -> Result<PartyComposition, AppError> {
        Ok(PartyComposition {
            adults: non_negative(Some(self.adults), "adults")?.unwrap_or_default(),
            children_under_18: non_negative(Some(self.children_under_18), "childrenUnder18")?
                .unwrap_or_default(),
            children_over_18: non_negative(Some(self.children_over_18), "childrenOver18")?
                .unwrap_or_default(),
        })
    }
}

/// `PATCH /contact/:email/payment` body.
#[derive(Debug, Deserialize)]
pub struct PaymentStatusRequest {
    pub status: String,
}

impl PaymentStatusRequest {
    pub fn status(&self) -> Result<PaymentStatus, AppError> {
        PaymentStatus::from_str(&self.status).map_err(|e| AppError::Validation(e.to_string()))
    }
}

/// `POST /booking/payment` body: the outcome picked in the simulation UI.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentAttemptRequest {
    #[serde(default)]
    pub outcome: Option<String>,
}

impl PaymentAttemptRequest {
    pub fn outcome(&self) -> Result<Option<PaymentStatus>, AppError> {
        self.outcome
            .as_deref()
            .map(|s| PaymentStatus::from_str(s).map_err(|e| AppError::Validation(e.to_string())))
            .transpose()
    }
}

/// `POST /session` body.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub email: String,
}
