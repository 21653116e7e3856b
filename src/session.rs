//! Login sessions.
//!
//! A session binds an opaque token to the email the user entered on the home
//! screen. It stays valid for a fixed idle window; every successful read
//! refreshes it.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use chrono::{DateTime, Duration, Utc};
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use tracing::{debug, info};
use uuid::Uuid;

use crate::booking::Email;
use crate::error::AppError;
use crate::AppState;

/// Header carrying the session token.
pub const SESSION_HEADER: &str = "x-session-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Session expired")]
pub struct SessionExpired;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub email: Email,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(email: Email, now: DateTime<Utc>) -> Self {
        Self {
            email,
            last_activity: now,
        }
    }

    /// Check expiry and refresh in one step.
    ///
    /// Expired once more than `timeout` has elapsed since the last activity.
    /// On success `last_activity` moves to `now`.
    pub fn touch(&mut self, now: DateTime<Utc>, timeout: Duration) -> Result<&Email, SessionExpired> {
        if now - self.last_activity > timeout {
            return Err(SessionExpired);
        }
        self.last_activity = now;
        Ok(&self.email)
    }
}

/// Session registry keyed by token.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<Uuid, Session>,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(sessions: Cache<Uuid, Session>, timeout: Duration) -> Self {
        Self { sessions, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start a session for `email` and return its token.
    pub async fn create(&self, email: Email, now: DateTime<Utc>) -> Uuid {
        let token = Uuid::new_v4();
        info!(email = %email, "Session started");
        self.sessions.insert(token, Session::new(email, now)).await;
        token
    }

    /// The email bound to `token`, if the session is still live.
    ///
    /// Check and refresh run as one entry operation, so a concurrent logout
    /// cannot be undone by a refresh. Expired sessions are removed.
    pub async fn current_email(&self, token: &Uuid, now: DateTime<Utc>) -> Option<Email> {
        let timeout = self.timeout;
        let result = self
            .sessions
            .entry(*token)
            .and_compute_with(|entry| async move {
                let Some(entry) = entry else {
                    return Op::Nop;
                };
                let mut session = entry.into_value();
                if session.touch(now, timeout).is_ok() {
                    Op::Put(session)
                } else {
                    Op::Remove
                }
            })
            .await;

        match result {
            CompResult::ReplacedWith(entry) => Some(entry.into_value().email),
            CompResult::Removed(entry) => {
                debug!(email = %entry.value().email, "Session expired");
                None
            }
            _ => None,
        }
    }

    /// Log out.
    pub async fn end(&self, token: &Uuid) {
        self.sessions
            .entry(*token)
            .and_compute_with(|_| async { Op::Remove })
            .await;
    }
}

/// Identity of the caller, resolved from the session header.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub token: Uuid,
    pub email: Email,
}

#[async_trait]
impl FromRequestParts<AppState> for SessionContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or(AppError::SessionExpired)?;

        let email = state
            .sessions
            .current_email(&token, Utc::now())
            .await
            .ok_or(AppError::SessionExpired)?;

        Ok(Self { token, email })
    }
}
