//! Validation utilities for Web API DTOs.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// Bodies that fail to decode are rejected with the malformed JSON error
/// (400). Decoded bodies are then checked with the `validator` crate and the
/// first field error is reported as a 400.
///
/// ```ignore
/// async fn subscribe(
///     ValidatedJson(req): ValidatedJson<SubscriptionRequest>,
/// ) -> ApiResult<Json<StatusResponse>> {
///     // req is already validated
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            tracing::debug!("Rejected request body: {}", e);
            ApiError::malformed_json()
        })?;

        value.validate().map_err(validation_error)?;

        Ok(ValidatedJson(value))
    }
}

/// Turn field errors into a single 400, naming the first offending field.
fn validation_error(errors: ValidationErrors) -> ApiError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let message = fields
        .first()
        .map(|(field, errs)| {
            let detail = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| "is invalid".to_string());
            format!("{field}: {detail}")
        })
        .unwrap_or_else(|| "Invalid request".to_string());

    ApiError::bad_request(message)
}

/// Validate that a string does not contain control characters or NULL bytes.
pub fn no_control_chars(value: &str) -> Result<(), validator::ValidationError> {
    if value.chars().any(|c| c.is_control()) {
        return Err(validator::ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}
