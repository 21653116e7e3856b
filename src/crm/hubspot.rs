//! HubSpot CRM client.
//!
//! Bookings are stored as custom properties on HubSpot contacts. Contacts are
//! looked up by email through the search API, created or updated through the
//! objects API, and re-read by id after every write. Search results are
//! indexed asynchronously and can still show pre-write values.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error};

use crate::booking::{BookingPatch, BookingRecord, Email, PaymentStatus};
use crate::config::HubSpotConfig;

use super::{ContactStore, CrmError};

const EMAIL_PROPERTY: &str = "email";
const FIRST_NAME_PROPERTY: &str = "firstname";
const LAST_NAME_PROPERTY: &str = "lastname";
const PHONE_PROPERTY: &str = "mobilephone";
const BOOKING_STATUS_PROPERTY: &str = "booking_status";
const TRIP_DATE_PROPERTY: &str = "booking_date";
const ADULTS_PROPERTY: &str = "number_of_adult";
const CHILDREN_UNDER_18_PROPERTY: &str = "number_of_children_under_18";
const CHILDREN_OVER_18_PROPERTY: &str = "number_of_children";
const PRICE_PROPERTY: &str = "booking_price";
const PAYMENT_STATUS_PROPERTY: &str = "payment_status";

/// Properties requested on every contact read.
const CONTACT_PROPERTIES: &[&str] = &[
    EMAIL_PROPERTY,
    FIRST_NAME_PROPERTY,
    LAST_NAME_PROPERTY,
    PHONE_PROPERTY,
    BOOKING_STATUS_PROPERTY,
    TRIP_DATE_PROPERTY,
    ADULTS_PROPERTY,
    CHILDREN_UNDER_18_PROPERTY,
    CHILDREN_OVER_18_PROPERTY,
    PRICE_PROPERTY,
    PAYMENT_STATUS_PROPERTY,
];

/// A contact as returned by the HubSpot objects and search APIs.
#[derive(Debug, Deserialize)]
struct HubSpotContact {
    id: String,
    #[serde(default)]
    properties: HashMap<String, Option<String>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<HubSpotContact>,
}

/// HubSpot contacts API client.
#[derive(Clone)]
pub struct HubSpotClient {
    client: reqwest::Client,
    base_url: String,
}

impl HubSpotClient {
    /// Create a new HubSpot client authenticated with a private app token.
    pub fn new(config: &HubSpotConfig) -> Result<Self, CrmError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.access_token.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| CrmError::Parse(format!("Invalid access token format: {e}")))?,
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn contacts_url(&self) -> String {
        format!("{}/crm/v3/objects/contacts", self.base_url)
    }

    async fn search_by_email(&self, email: &Email) -> Result<Option<HubSpotContact>, CrmError> {
        let body = json!({
            "filterGroups": [{
                "filters": [{
                    "propertyName": EMAIL_PROPERTY,
                    "operator": "EQ",
                    "value": email.as_str(),
                }]
            }],
            "properties": CONTACT_PROPERTIES,
            "limit": 1,
        });

        let url = format!("{}/search", self.contacts_url());
        let response = self.client.post(&url).json(&body).send().await?;
        let search: SearchResponse = read_json(response).await?;
        Ok(search.results.into_iter().next())
    }

    async fn create(&self, properties: Map<String, Value>) -> Result<HubSpotContact, CrmError> {
        let response = self
            .client
            .post(self.contacts_url())
            .json(&json!({ "properties": properties }))
            .send()
            .await?;
        read_json(response).await
    }

    async fn update(
        &self,
        contact_id: &str,
        properties: Map<String, Value>,
    ) -> Result<HubSpotContact, CrmError> {
        let url = format!("{}/{}", self.contacts_url(), contact_id);
        let response = self
            .client
            .patch(&url)
            .json(&json!({ "properties": properties }))
            .send()
            .await?;
        read_json(response).await
    }

    /// Read a contact by id. Unlike search this reflects the latest write.
    async fn get_by_id(&self, contact_id: &str) -> Result<HubSpotContact, CrmError> {
        let url = format!("{}/{}", self.contacts_url(), contact_id);
        let response = self
            .client
            .get(&url)
            .query(&[("properties", CONTACT_PROPERTIES.join(","))])
            .send()
            .await?;
        read_json(response).await
    }

    async fn reread(&self, email: &Email, written: HubSpotContact) -> Result<BookingRecord, CrmError> {
        let contact = self.get_by_id(&written.id).await?;
        contact_to_record(email, contact)
    }

    async fn require_contact(&self, email: &Email) -> Result<HubSpotContact, CrmError> {
        self.search_by_email(email)
            .await?
            .ok_or_else(|| CrmError::ContactNotFound(email.to_string()))
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, CrmError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), "HubSpot API error: {}", message);
        return Err(CrmError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| CrmError::Parse(e.to_string()))
}

fn property<'a>(contact: &'a HubSpotContact, name: &str) -> Option<&'a str> {
    contact
        .properties
        .get(name)
        .and_then(|v| v.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_count(contact: &HubSpotContact, name: &str) -> Result<u32, CrmError> {
    match property(contact, name) {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| CrmError::Parse(format!("{name} is not a count: '{raw}'"))),
    }
}

fn parse_trip_date(raw: &str) -> Result<NaiveDate, CrmError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| CrmError::Parse(format!("{TRIP_DATE_PROPERTY} is not a date: '{raw}'")))
}

fn contact_to_record(email: &Email, contact: HubSpotContact) -> Result<BookingRecord, CrmError> {
    let payment_status = match property(&contact, PAYMENT_STATUS_PROPERTY) {
        None => PaymentStatus::Pending,
        Some(raw) => PaymentStatus::from_str(raw).map_err(|e| CrmError::Parse(e.to_string()))?,
    };
    let trip_date = property(&contact, TRIP_DATE_PROPERTY)
        .map(parse_trip_date)
        .transpose()?;
    let price = property(&contact, PRICE_PROPERTY)
        .map(|raw| {
            Decimal::from_str(raw)
                .map_err(|_| CrmError::Parse(format!("{PRICE_PROPERTY} is not a decimal: '{raw}'")))
        })
        .transpose()?;

    Ok(BookingRecord {
        email: email.clone(),
        first_name: property(&contact, FIRST_NAME_PROPERTY).map(String::from),
        last_name: property(&contact, LAST_NAME_PROPERTY).map(String::from),
        phone: property(&contact, PHONE_PROPERTY).map(String::from),
        adults: parse_count(&contact, ADULTS_PROPERTY)?,
        children_under_18: parse_count(&contact, CHILDREN_UNDER_18_PROPERTY)?,
        children_over_18: parse_count(&contact, CHILDREN_OVER_18_PROPERTY)?,
        trip_date,
        price,
        payment_status,
        id: Some(contact.id),
    })
}

fn insert_opt(properties: &mut Map<String, Value>, name: &str, value: Option<String>) {
    if let Some(value) = value {
        properties.insert(name.to_string(), Value::String(value));
    }
}

/// Full property set for create-or-update. Absent optional fields are omitted
/// so HubSpot keeps whatever it already stores.
fn record_properties(record: &BookingRecord) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(EMAIL_PROPERTY.into(), json!(record.email.as_str()));
    insert_opt(&mut properties, FIRST_NAME_PROPERTY, record.first_name.clone());
    insert_opt(&mut properties, LAST_NAME_PROPERTY, record.last_name.clone());
    insert_opt(&mut properties, PHONE_PROPERTY, record.phone.clone());
    properties.insert(ADULTS_PROPERTY.into(), json!(record.adults.to_string()));
    properties.insert(
        CHILDREN_UNDER_18_PROPERTY.into(),
        json!(record.children_under_18.to_string()),
    );
    properties.insert(
        CHILDREN_OVER_18_PROPERTY.into(),
        json!(record.children_over_18.to_string()),
    );
    insert_opt(
        &mut properties,
        TRIP_DATE_PROPERTY,
        record.trip_date.map(|d| d.format("%Y-%m-%d").to_string()),
    );
    insert_opt(&mut properties, PRICE_PROPERTY, record.price.map(|p| p.to_string()));
    properties.insert(
        PAYMENT_STATUS_PROPERTY.into(),
        json!(record.payment_status.as_str()),
    );
    properties.insert(BOOKING_STATUS_PROPERTY.into(), json!("active"));
    properties
}

fn patch_properties(patch: &BookingPatch) -> Map<String, Value> {
    let mut properties = Map::new();
    insert_opt(&mut properties, FIRST_NAME_PROPERTY, patch.personal.first_name.clone());
    insert_opt(&mut properties, LAST_NAME_PROPERTY, patch.personal.last_name.clone());
    insert_opt(&mut properties, PHONE_PROPERTY, patch.personal.phone.clone());
    insert_opt(&mut properties, ADULTS_PROPERTY, patch.adults.map(|n| n.to_string()));
    insert_opt(
        &mut properties,
        CHILDREN_UNDER_18_PROPERTY,
        patch.children_under_18.map(|n| n.to_string()),
    );
    insert_opt(
        &mut properties,
        CHILDREN_OVER_18_PROPERTY,
        patch.children_over_18.map(|n| n.to_string()),
    );
    insert_opt(
        &mut properties,
        TRIP_DATE_PROPERTY,
        patch.trip_date.map(|d| d.format("%Y-%m-%d").to_string()),
    );
    insert_opt(&mut properties, PRICE_PROPERTY, patch.price.map(|p| p.to_string()));
    properties
}

#[async_trait]
impl ContactStore for HubSpotClient {
    async fn fetch_contact(&self, email: &Email) -> Result<Option<BookingRecord>, CrmError> {
        self.search_by_email(email)
            .await?
            .map(|contact| contact_to_record(email, contact))
            .transpose()
    }

    async fn upsert_contact(&self, record: &BookingRecord) -> Result<BookingRecord, CrmError> {
        let properties = record_properties(record);
        let written = match self.search_by_email(&record.email).await? {
            Some(existing) => {
                debug!(email = %record.email, contact_id = %existing.id, "Updating HubSpot contact");
                self.update(&existing.id, properties).await?
            }
            None => {
                debug!(email = %record.email, "Creating HubSpot contact");
                self.create(properties).await?
            }
        };
        self.reread(&record.email, written).await
    }

    async fn patch_payment_status(
        &self,
        email: &Email,
        status: PaymentStatus,
    ) -> Result<BookingRecord, CrmError> {
        let contact = self.require_contact(email).await?;
        let mut properties = Map::new();
        properties.insert(PAYMENT_STATUS_PROPERTY.into(), json!(status.as_str()));
        let written = self.update(&contact.id, properties).await?;
        self.reread(email, written).await
    }

    async fn patch_booking_fields(
        &self,
        email: &Email,
        patch: &BookingPatch,
    ) -> Result<BookingRecord, CrmError> {
        let contact = self.require_contact(email).await?;
        let properties = patch_properties(patch);
        if properties.is_empty() {
            return contact_to_record(email, contact);
        }
        let written = self.update(&contact.id, properties).await?;
        self.reread(email, written).await
    }
}
