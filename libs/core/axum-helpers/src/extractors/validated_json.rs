//! JSON extractor with automatic validation using the validator crate.

use crate::errors::{ErrorCode, ErrorResponse, validation_details};
use axum::{
    extract::{FromRequest, Json, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor with automatic validation.
///
/// Validates the request body using the `validator` crate's `Validate` trait.
/// Malformed JSON is rejected with axum's own rejection status; a body that
/// deserializes but fails validation is rejected with 400 and per-field
/// details.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::ValidatedJson;
/// use serde::Deserialize;
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct Search {
///     #[validate(range(min = 1, max = 10))]
///     top_k: u32,
/// }
///
/// async fn search(ValidatedJson(payload): ValidatedJson<Search>) -> String {
///     format!("top_k = {}", payload.top_k)
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await.map_err(|e| {
            tracing::warn!(
                error_code = ErrorCode::JsonExtraction.code(),
                "JSON extraction error: {}",
                e.body_text()
            );
            let body = ErrorResponse::new(ErrorCode::JsonExtraction, e.body_text());
            (e.status(), axum::Json(body)).into_response()
        })?;

        data.validate().map_err(|e| {
            tracing::info!(
                error_code = ErrorCode::ValidationError.code(),
                "Validation error: {:?}",
                e
            );
            let body = ErrorResponse::new(
                ErrorCode::ValidationError,
                ErrorCode::ValidationError.default_message(),
            )
            .with_details(validation_details(&e));

            (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
        })?;

        Ok(ValidatedJson(data))
    }
}
