//! In-memory contact store.
//!
//! Mirrors the CRM's create-or-merge semantics. Data is lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::booking::{BookingPatch, BookingRecord, Email, PaymentStatus};

use super::{ContactStore, CrmError};

#[derive(Default)]
struct Contacts {
    by_email: HashMap<Email, BookingRecord>,
    next_id: u64,
}

/// Contact store held in process memory.
#[derive(Default)]
pub struct InMemoryContactStore {
    contacts: RwLock<Contacts>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.contacts.read().await.by_email.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Overlay `incoming` on `stored`; absent optional fields keep stored values.
fn merge_record(stored: &mut BookingRecord, incoming: &BookingRecord) {
    if incoming.first_name.is_some() {
        stored.first_name.clone_from(&incoming.first_name);
    }
    if incoming.last_name.is_some() {
        stored.last_name.clone_from(&incoming.last_name);
    }
    if incoming.phone.is_some() {
        stored.phone.clone_from(&incoming.phone);
    }
    stored.adults = incoming.adults;
    stored.children_under_18 = incoming.children_under_18;
    stored.children_over_18 = incoming.children_over_18;
    if incoming.trip_date.is_some() {
        stored.trip_date = incoming.trip_date;
    }
    if incoming.price.is_some() {
        stored.price = incoming.price;
    }
    stored.payment_status = incoming.payment_status;
}

#[async_trait]
impl ContactStore for InMemoryContactStore {
    async fn fetch_contact(&self, email: &Email) -> Result<Option<BookingRecord>, CrmError> {
        Ok(self.contacts.read().await.by_email.get(email).cloned())
    }

    async fn upsert_contact(&self, record: &BookingRecord) -> Result<BookingRecord, CrmError> {
        let mut contacts = self.contacts.write().await;
        if let Some(stored) = contacts.by_email.get_mut(&record.email) {
            merge_record(stored, record);
            debug!(email = %record.email, "Updated contact");
            return Ok(stored.clone());
        }

        contacts.next_id += 1;
        let mut created = record.clone();
        created.id = Some(contacts.next_id.to_string());
        contacts.by_email.insert(created.email.clone(), created.clone());
        debug!(email = %record.email, "Created contact");
        Ok(created)
    }

    async fn patch_payment_status(
        &self,
        email: &Email,
        status: PaymentStatus,
    ) -> Result<BookingRecord, CrmError> {
        let mut contacts = self.contacts.write().await;
        let stored = contacts
            .by_email
            .get_mut(email)
            .ok_or_else(|| CrmError::ContactNotFound(email.to_string()))?;
        stored.payment_status = status;
        Ok(stored.clone())
    }

    async fn patch_booking_fields(
        &self,
        email: &Email,
        patch: &BookingPatch,
    ) -> Result<BookingRecord, CrmError> {
        let mut contacts = self.contacts.write().await;
        let stored = contacts
            .by_email
            .get_mut(email)
            .ok_or_else(|| CrmError::ContactNotFound(email.to_string()))?;
        patch.apply_to(stored);
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::PersonalDetails;
    use rust_decimal_macros::dec;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_missing_is_none() {
        let store = InMemoryContactStore::new();
        assert!(store.fetch_contact(&email("a@b.io")).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_upsert_creates_then_merges() {
        let store = InMemoryContactStore::new();
        let mut record = BookingRecord::new(email("a@b.io"));
        record.first_name = Some("Ada".into());
        record.adults = 1;
        let created = store.upsert_contact(&record).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("1"));

        let mut update = BookingRecord::new(email("a@b.io"));
        update.adults = 3;
        update.price = Some(dec!(1100.00));
        let merged = store.upsert_contact(&update).await.unwrap();

        assert_eq!(merged.id.as_deref(), Some("1"));
        assert_eq!(merged.first_name.as_deref(), Some("Ada"));
        assert_eq!(merged.adults, 3);
        assert_eq!(merged.price, Some(dec!(1100.00)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_patches_require_existing_contact() {
        let store = InMemoryContactStore::new();
        let missing = email("ghost@b.io");

        let err = store
            .patch_payment_status(&missing, PaymentStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(err, CrmError::ContactNotFound(_)));

        let err = store
            .patch_booking_fields(&missing, &BookingPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CrmError::ContactNotFound(_)));
    }

    #[tokio::test]
    async fn test_patch_fields_and_status() {
        let store = InMemoryContactStore::new();
        let who = email("a@b.io");
        store.upsert_contact(&BookingRecord::new(who.clone())).await.unwrap();

        let patch = BookingPatch {
            personal: PersonalDetails {
                phone: Some("+1 555 0100".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let patched = store.patch_booking_fields(&who, &patch).await.unwrap();
        assert_eq!(patched.phone.as_deref(), Some("+1 555 0100"));

        let paid = store.patch_payment_status(&who, PaymentStatus::Paid).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.phone.as_deref(), Some("+1 555 0100"));
    }
}
