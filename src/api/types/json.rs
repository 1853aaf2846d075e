//! JSON extractor whose rejections use the API error body

use axum::{
    extract::{rejection::JsonRejection as AxumRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// Drop-in for `axum::Json` that reports malformed bodies as
/// `{"error": {"type": "invalid_request_error", "code": "json_parse_error"}}`
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Json(value)),
            Err(rejection) => {
                let mut error = ApiError::bad_request(rejection_message(&rejection))
                    .with_code("json_parse_error");
                error.status = rejection.status();
                Err(error)
            }
        }
    }
}

fn rejection_message(rejection: &AxumRejection) -> String {
    match rejection {
        AxumRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err.body_text()),
        AxumRejection::JsonSyntaxError(err) => {
            format!("Invalid JSON syntax: {}", err.body_text())
        }
        AxumRejection::MissingJsonContentType(_) => {
            "Missing Content-Type header. Expected 'application/json'.".to_string()
        }
        AxumRejection::BytesRejection(err) => {
            format!("Failed to read request body: {}", err.body_text())
        }
        _ => "Invalid JSON request".to_string(),
    }
}

impl<T> IntoResponse for Json<T>
where
    T: serde::Serialize,
{
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}
