//! Ocean trip booking service.
//!
//! A user enters an email, fills in personal and trip details, reviews a
//! server-computed price and simulates a payment. Bookings are stored as
//! CRM contacts.

pub mod booking;
pub mod cache;
pub mod config;
pub mod crm;
pub mod error;
pub mod extract;
pub mod routes;
pub mod session;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::booking::{DraftStore, PaymentSimulator};
use crate::cache::AppCache;
use crate::crm::ContactStore;
use crate::session::{SessionStore, SESSION_HEADER};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContactStore>,
    pub payments: Arc<dyn PaymentSimulator>,
    pub cache: AppCache,
    pub sessions: SessionStore,
    pub drafts: DraftStore,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ContactStore>,
        payments: Arc<dyn PaymentSimulator>,
        session_timeout: chrono::Duration,
    ) -> Self {
        let idle = session_timeout
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(30 * 60));
        let cache = AppCache::new(idle);

        Self {
            sessions: SessionStore::new(cache.sessions.clone(), session_timeout),
            drafts: DraftStore::new(cache.drafts.clone()),
            cache,
            store,
            payments,
        }
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(SESSION_HEADER)]);

    routes::router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
