//! Lenient JSON body extractor reporting failures in the standard error envelope.

use crate::errors::AppError;
use axum::{
    body::Bytes,
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Drop-in replacement for `axum::Json` that does not gate on headers.
///
/// The body is read as JSON whatever its `Content-Type`, and an empty body
/// counts as `{}`. Only bodies that are not a JSON object or array are
/// rejected up front (400). A well-formed body that cannot be turned into `T`
/// (a required field is missing, or a value cannot be coerced) is a fault of
/// the downstream write and answers 500 with the decoder's message.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::AppJson;
///
/// async fn create(AppJson(input): AppJson<CreateProduct>) -> impl IntoResponse {
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        let value = parse_body(&bytes)?;

        serde_json::from_value(value)
            .map(AppJson)
            .map_err(|e| AppError::InternalServerError(e.to_string()))
    }
}

fn parse_body(bytes: &[u8]) -> Result<Value, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }

    match serde_json::from_slice(bytes) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Ok(value),
        Ok(_) => Err(AppError::MalformedJson(
            "Request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(AppError::MalformedJson(e.to_string())),
    }
}

impl<T: Serialize> IntoResponse for AppJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}
