use axum::extract::{rejection::JsonRejection, FromRequest, Request};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::AuthError;

/// Request-side [`axum::Json`] whose rejections use the API error schema
/// (`400 validation_error`) instead of axum's plain-text bodies.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(inner) => Ok(JsonBody(inner.0)),
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::JsonDataError(e) => e.body_text(),
                    JsonRejection::JsonSyntaxError(e) => e.body_text(),
                    JsonRejection::MissingJsonContentType(_) => {
                        "Expected request with Content-Type: application/json".to_string()
                    }
                    JsonRejection::BytesRejection(e) => e.body_text(),
                    other => {
                        warn!(rejection = ?other, "unhandled json rejection");
                        other.body_text()
                    }
                };
                Err(AuthError::Validation(message))
            }
        }
    }
}
