//! Booking module for the ocean trip flow.
//!
//! Pricing and state-gating rules are pure functions (`calculators`, `gate`).
//! `services` combines them with the contact store; `routes` exposes them
//! over HTTP.

pub mod calculators;
pub mod drafts;
pub mod gate;
pub mod models;
pub mod payment;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

// Re-export commonly used items
pub use calculators::{compute_price, round_money, PriceQuote, PricingError};
pub use drafts::{BookingDraft, DraftStore};
pub use gate::{
    resolve_editability, resolve_next_step, EditIntent, Editability, NextStep, PaymentOutcome,
};
pub use models::{
    BookingPatch, BookingRecord, Email, EmailError, PartyComposition, PaymentStatus,
    PersonalDetails, TripDetails,
};
pub use payment::{FixedOutcomeSimulator, PaymentSimulator, UserChoiceSimulator};
pub use routes::router;
