//! Session route handlers

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use crate::booking::requests::SessionRequest;
use crate::booking::responses::SessionResponse;
use crate::booking::Email;
use crate::error::Result;
use crate::extract::JsonBody;
use crate::session::SessionContext;
use crate::AppState;

/// Start a session for the entered email
pub async fn create(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SessionRequest>,
) -> Result<Json<SessionResponse>> {
    let email = Email::parse(&request.email)?;
    let token = state.sessions.create(email.clone(), Utc::now()).await;

    Ok(Json(SessionResponse {
        token: Some(token),
        email: email.to_string(),
        expires_in_seconds: state.sessions.timeout().num_seconds(),
    }))
}

/// Current session (refreshes it)
pub async fn current(State(state): State<AppState>, session: SessionContext) -> Json<SessionResponse> {
    Json(SessionResponse {
        token: None,
        email: session.email.to_string(),
        expires_in_seconds: state.sessions.timeout().num_seconds(),
    })
}

/// Log out
pub async fn end(State(state): State<AppState>, session: SessionContext) -> StatusCode {
    state.sessions.end(&session.token).await;
    StatusCode::NO_CONTENT
}
