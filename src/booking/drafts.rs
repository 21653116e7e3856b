//! Unfinished booking forms.
//!
//! A draft keeps whatever the user has typed so far, step by step, without
//! touching the CRM. A successful payment discards it.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::Email;

/// Step data saved so far. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub adults: Option<u32>,
    pub children_under_18: Option<u32>,
    pub children_over_18: Option<u32>,
    pub trip_date: Option<NaiveDate>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BookingDraft {
    /// Overlay the fields present in `step` onto this draft.
    pub fn merge(&mut self, step: BookingDraft) {
        fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        overlay(&mut self.first_name, step.first_name);
        overlay(&mut self.last_name, step.last_name);
        overlay(&mut self.phone, step.phone);
        overlay(&mut self.adults, step.adults);
        overlay(&mut self.children_under_18, step.children_under_18);
        overlay(&mut self.children_over_18, step.children_over_18);
        overlay(&mut self.trip_date, step.trip_date);
        overlay(&mut self.updated_at, step.updated_at);
    }
}

/// Drafts keyed by email.
#[derive(Clone)]
pub struct DraftStore {
    drafts: Cache<Email, Arc<BookingDraft>>,
}

impl DraftStore {
    pub fn new(drafts: Cache<Email, Arc<BookingDraft>>) -> Self {
        Self { drafts }
    }

    /// Merge a step into the stored draft and return the result.
    pub async fn save(&self, email: &Email, mut step: BookingDraft, now: DateTime<Utc>) -> BookingDraft {
        step.updated_at = Some(now);
        let mut draft = self
            .drafts
            .get(email)
            .await
            .map(|d| (*d).clone())
            .unwrap_or_default();
        draft.merge(step);
        self.drafts.insert(email.clone(), Arc::new(draft.clone())).await;
        debug!(email = %email, "Draft saved");
        draft
    }

    pub async fn get(&self, email: &Email) -> Option<BookingDraft> {
        self.drafts.get(email).await.map(|d| (*d).clone())
    }

    pub async fn clear(&self, email: &Email) {
        self.drafts.invalidate(email).await;
        debug!(email = %email, "Draft cleared");
    }
}
