//! In-memory caching using moka
//!
//! Holds short-lived per-user state that never goes to the CRM: login
//! sessions and unfinished booking drafts.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use uuid::Uuid;

use crate::booking::{BookingDraft, Email};
use crate::session::Session;

/// Drafts outlive a session so a user can come back to an unfinished form.
const DRAFT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Sessions expiring exactly at the timeout are still valid, so the cache
/// keeps them a little longer than that.
const SESSION_IDLE_MARGIN: Duration = Duration::from_secs(60);

/// Application cache holding sessions and drafts
#[derive(Clone)]
pub struct AppCache {
    /// Sessions (token -> Session)
    pub sessions: Cache<Uuid, Session>,
    /// Booking drafts (email -> draft)
    pub drafts: Cache<Email, Arc<BookingDraft>>,
}

impl AppCache {
    /// Create a new cache instance.
    ///
    /// Sessions idle out shortly after `session_timeout`. The session itself also
    /// checks expiry on every read; the cache idle time only evicts
    /// abandoned entries and never runs shorter than the session window.
    pub fn new(session_timeout: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(session_timeout + SESSION_IDLE_MARGIN)
                .build(),

            drafts: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(DRAFT_TTL)
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            sessions: self.sessions.entry_count(),
            drafts: self.drafts.entry_count(),
        }
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub sessions: u64,
    pub drafts: u64,
}
