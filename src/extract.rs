//! Request extractors.

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON request body whose rejections use the application error body.
///
/// Wrong shapes, wrong types, malformed JSON and a missing content type all
/// become validation errors instead of axum's plain-text 4xx responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
