//! Request extractors whose rejections use the API's JSON error shape.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use jotter_core::NoteId;

use crate::error::AppError;

/// `Json<T>` that rejects with a 400 `{error}` body.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!("Rejected request body: {rejection}");
                Err(AppError::bad_request(json_rejection_message(&rejection)))
            }
        }
    }
}

fn json_rejection_message(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
        JsonRejection::JsonDataError(_) => "Request body has invalid fields",
        _ => "Invalid request body",
    }
}

/// The `{id}` path segment of a note route.
///
/// Ids that are not integers cannot name a note, so they answer 404.
#[derive(Debug, Clone, Copy)]
pub struct NoteIdPath(pub NoteId);

impl<S> FromRequestParts<S> for NoteIdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::not_found("Note not found"))?;
        raw.parse::<NoteId>()
            .map(Self)
            .map_err(|_| AppError::not_found("Note not found"))
    }
}
