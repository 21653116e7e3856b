//! Booking domain models.
//!
//! `BookingRecord` is the projection of a CRM contact that the booking flow
//! reads and writes. The contact store owns the record; these types only
//! describe the fields the flow cares about.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must contain exactly one @ symbol")]
    MissingAtSymbol,
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    #[error("email domain must contain a dot")]
    InvalidDomain,
    #[error("email cannot contain whitespace")]
    Whitespace,
}

/// A normalized email address. Identity key of a booking.
///
/// Parsing trims surrounding whitespace and lowercases the address so the
/// same person always maps to the same contact.
///
/// ```
/// use ocean_booking::booking::Email;
///
/// assert_eq!(Email::parse(" Ada@Example.com ").unwrap().as_str(), "ada@example.com");
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("user@localhost").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::MissingAtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::MissingAtSymbol);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        // Require a dotted domain with non-empty labels on both ends.
        match domain.rsplit_once('.') {
            Some((host, tld)) if !host.is_empty() && !tld.is_empty() && !host.starts_with('.') => {}
            _ => return Err(EmailError::InvalidDomain),
        }

        Ok(Self(s.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

/// Payment status stored on the contact.
///
/// `Pending` is the status of every freshly created booking. `Failed` is not
/// a dead end: the user may attempt payment again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid payment status: {0}")]
pub struct UnknownPaymentStatus(pub String);

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Paid" => Ok(PaymentStatus::Paid),
            "Failed" => Ok(PaymentStatus::Failed),
            other => Err(UnknownPaymentStatus(other.to_string())),
        }
    }
}

/// Who is travelling. Counts are validated by the pricing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyComposition {
    pub adults: u32,
    pub children_under_18: u32,
    pub children_over_18: u32,
}

/// Trip fields. Frozen once the booking is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripDetails {
    pub party: PartyComposition,
    pub trip_date: NaiveDate,
}

/// Contact fields. Always editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Projection of a CRM contact used by the booking flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    /// Identifier assigned by the contact store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub adults: u32,
    #[serde(default)]
    pub children_under_18: u32,
    #[serde(default)]
    pub children_over_18: u32,
    pub trip_date: Option<NaiveDate>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
}

impl BookingRecord {
    /// A fresh record with no booking data yet.
    pub fn new(email: Email) -> Self {
        Self {
            id: None,
            email,
            first_name: None,
            last_name: None,
            phone: None,
            adults: 0,
            children_under_18: 0,
            children_over_18: 0,
            trip_date: None,
            price: None,
            payment_status: PaymentStatus::Pending,
        }
    }

    pub fn party(&self) -> PartyComposition {
        PartyComposition {
            adults: self.adults,
            children_under_18: self.children_under_18,
            children_over_18: self.children_over_18,
        }
    }

    /// Overwrite the personal fields that are present in `details`.
    pub fn apply_personal(&mut self, details: &PersonalDetails) {
        if let Some(first_name) = &details.first_name {
            self.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &details.last_name {
            self.last_name = Some(last_name.clone());
        }
        if let Some(phone) = &details.phone {
            self.phone = Some(phone.clone());
        }
    }

    /// Overwrite the trip fields and the price derived from them.
    pub fn apply_trip(&mut self, trip: &TripDetails, price: Decimal) {
        self.adults = trip.party.adults;
        self.children_under_18 = trip.party.children_under_18;
        self.children_over_18 = trip.party.children_over_18;
        self.trip_date = Some(trip.trip_date);
        self.price = Some(price);
    }
}

/// Partial update of a booking. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingPatch {
    pub personal: PersonalDetails,
    pub adults: Option<u32>,
    pub children_under_18: Option<u32>,
    pub children_over_18: Option<u32>,
    pub trip_date: Option<NaiveDate>,
    pub price: Option<Decimal>,
}

impl BookingPatch {
    pub fn touches_trip(&self) -> bool {
        self.adults.is_some()
            || self.children_under_18.is_some()
            || self.children_over_18.is_some()
            || self.trip_date.is_some()
    }

    /// Drop every trip field (and the derived price).
    pub fn personal_only(self) -> Self {
        Self {
            personal: self.personal,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch onto a record, merge-update style.
    pub fn apply_to(&self, record: &mut BookingRecord) {
        record.apply_personal(&self.personal);
        if let Some(adults) = self.adults {
            record.adults = adults;
        }
        if let Some(children) = self.children_under_18 {
            record.children_under_18 = children;
        }
        if let Some(children) = self.children_over_18 {
            record.children_over_18 = children;
        }
        if let Some(date) = self.trip_date {
            record.trip_date = Some(date);
        }
        if let Some(price) = self.price {
            record.price = Some(price);
        }
    }
}
