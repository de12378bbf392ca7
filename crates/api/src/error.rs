//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use photostore_core::photo::PhotoError;
use photostore_shared::AppError;
use serde_json::json;

/// Handler error rendered as `{"error": code, "message": msg}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Create a validation error for a malformed request.
    #[must_use]
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(AppError::Validation(msg.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<PhotoError> for ApiError {
    fn from(err: PhotoError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        match &err {
            AppError::NotFound(_) => tracing::warn!("Resource not found: {err}"),
            AppError::Validation(_) | AppError::PayloadTooLarge(_) => {
                tracing::debug!("Client error: {err}");
            }
            AppError::Storage(_) | AppError::Internal(_) => {
                tracing::error!("Internal service error: {err}");
            }
        }

        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (
            status,
            Json(json!({
                "error": err.error_code(),
                "message": err.public_message(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use photostore_core::storage::StoreError;
    use rstest::rstest;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[rstest]
    #[case(PhotoError::NotFound("p/f.jpg".into()), StatusCode::NOT_FOUND, "NOT_FOUND")]
    #[case(PhotoError::validation("bad"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR")]
    #[case(PhotoError::Storage(StoreError::operation("refused")), StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")]
    #[case(PhotoError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")]
    #[tokio::test]
    async fn test_photo_error_status(
        #[case] err: PhotoError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let (actual, body) = render(err.into()).await;
        assert_eq!(actual, status);
        assert_eq!(body["error"], code);
    }

    #[tokio::test]
    async fn test_storage_detail_not_exposed() {
        let (_, body) = render(PhotoError::Storage(StoreError::operation("secret-host:9000")).into()).await;
        assert_eq!(body["message"], "Storage operation failed");
    }

    #[tokio::test]
    async fn test_validation_message_returned() {
        let (_, body) = render(ApiError::bad_request("productId is required")).await;
        assert_eq!(body["message"], "productId is required");
    }
}
