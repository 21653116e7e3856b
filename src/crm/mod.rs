//! Contact store collaborator.
//!
//! All persistent booking state lives in a CRM as contact records. The flow
//! talks to it through [`ContactStore`]; [`HubSpotClient`] is the production
//! backend and [`InMemoryContactStore`] backs local runs and tests.

pub mod hubspot;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::booking::{BookingPatch, BookingRecord, Email, PaymentStatus};

pub use hubspot::HubSpotClient;
pub use memory::InMemoryContactStore;

/// Errors raised by a contact store.
#[derive(Debug, Error)]
pub enum CrmError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CRM returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// No contact for the given email.
    #[error("Contact not found for email: {0}")]
    ContactNotFound(String),

    /// Failed to read a CRM response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Booking persistence. Last write wins; no locking.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn fetch_contact(&self, email: &Email) -> Result<Option<BookingRecord>, CrmError>;

    /// Create if absent, else merge-update. Returns the stored record.
    async fn upsert_contact(&self, record: &BookingRecord) -> Result<BookingRecord, CrmError>;

    async fn patch_payment_status(
        &self,
        email: &Email,
        status: PaymentStatus,
    ) -> Result<BookingRecord, CrmError>;

    async fn patch_booking_fields(
        &self,
        email: &Email,
        patch: &BookingPatch,
    ) -> Result<BookingRecord, CrmError>;
}
