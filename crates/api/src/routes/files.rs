//! Product photo routes.

use std::str::FromStr;

use axum::{
    Json, Router,
    body::Body,
    extract::{
        DefaultBodyLimit, Multipart, Query, State,
        multipart::{Field, MultipartError},
        rejection::QueryRejection,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use bytes::Bytes;
use photostore_core::photo::{
    DEFAULT_CONTENT_TYPE, PhotoContent, PhotoRecord, UploadPhotoInput, UploadedPhoto,
};
use photostore_shared::AppError;
use photostore_shared::types::{FileId, ProductId};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// Room for multipart framing and the text fields on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Expiry used by `/url` when the caller gives none.
const DEFAULT_EXPIRY_DAYS: u32 = 7;

/// Creates the file routes.
pub fn routes(max_file_size: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/delete", delete(delete_photo))
        .route("/view", get(view))
        .route("/download", get(download))
        .route("/info", get(info))
        .route("/list", get(list))
        .route("/url", get(presigned_url))
        .route("/exists", get(exists))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query addressing a single photo.
#[derive(Debug, Deserialize)]
pub struct PathQuery {
    /// Object key, `{productId}/{fileId}.{ext}`.
    pub path: String,
}

/// Query for listing a product's photos.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Owning product.
    pub product_id: String,
}

/// Query for a presigned URL.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlQuery {
    /// Object key.
    pub path: String,
    /// URL lifetime in days.
    pub expiry_days: Option<u32>,
}

/// Response carrying a presigned URL.
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    /// Presigned download URL.
    pub url: String,
}

/// Response for an existence check.
#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    /// Whether the photo exists.
    pub exists: bool,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(q)| q)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn parse_id<T: FromStr>(name: &str, value: &str) -> Result<T, ApiError> {
    T::from_str(value.trim())
        .map_err(|_| ApiError::bad_request(format!("{name} must be a valid UUID")))
}

/// Keeps the 413 raised when the body limit is hit mid-stream.
fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError(AppError::PayloadTooLarge(err.body_text()))
    } else {
        ApiError::bad_request(err.body_text())
    }
}

async fn text_field(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(multipart_error)
}

/// Stream a photo back with the given disposition.
fn stream_photo(content: PhotoContent, disposition: &str) -> Response {
    let headers = [
        (header::CONTENT_TYPE, content.content_type),
        (header::CONTENT_LENGTH, content.size.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("{disposition}; filename=\"{}\"", content.file_name),
        ),
    ];

    (headers, Body::from_stream(content.body)).into_response()
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/files/upload`
/// Upload a photo from a multipart form with `productId`, optional `fileId`
/// and `file` parts.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadedPhoto>, ApiError> {
    let mut product_id: Option<ProductId> = None;
    let mut file_id: Option<FileId> = None;
    let mut file: Option<(String, String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "productId" => {
                product_id = Some(parse_id("productId", &text_field(field).await?)?);
            }
            // Older clients send the file id as `userId`.
            "fileId" | "userId" => {
                let value = text_field(field).await?;
                if !value.trim().is_empty() {
                    file_id = Some(parse_id("fileId", &value)?);
                }
            }
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let body = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, content_type, body));
            }
            _ => {}
        }
    }

    let product_id = product_id.ok_or_else(|| ApiError::bad_request("productId is required"))?;
    let (original_file_name, content_type, body) =
        file.ok_or_else(|| ApiError::bad_request("file is required"))?;

    let uploaded = state
        .photos
        .upload(UploadPhotoInput {
            product_id,
            file_id,
            original_file_name,
            content_type,
            body,
        })
        .await?;

    Ok(Json(uploaded))
}

/// DELETE `/files/delete?path=`
async fn delete_photo(
    State(state): State<AppState>,
    q: Result<Query<PathQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let q = query(q)?;
    state.photos.delete(&q.path).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/files/view?path=`
async fn view(
    State(state): State<AppState>,
    q: Result<Query<PathQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let q = query(q)?;
    let content = state.photos.fetch(&q.path).await?;
    Ok(stream_photo(content, "inline"))
}

/// GET `/files/download?path=`
async fn download(
    State(state): State<AppState>,
    q: Result<Query<PathQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let q = query(q)?;
    let content = state.photos.fetch(&q.path).await?;
    Ok(stream_photo(content, "attachment"))
}

/// GET `/files/info?path=`
async fn info(
    State(state): State<AppState>,
    q: Result<Query<PathQuery>, QueryRejection>,
) -> Result<Json<PhotoRecord>, ApiError> {
    let q = query(q)?;
    Ok(Json(state.photos.info(&q.path).await?))
}

/// GET `/files/list?productId=`
async fn list(
    State(state): State<AppState>,
    q: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<PhotoRecord>>, ApiError> {
    let q = query(q)?;
    let product_id: ProductId = parse_id("productId", &q.product_id)?;
    Ok(Json(state.photos.list(product_id).await?))
}

/// GET `/files/url?path=&expiryDays=`
async fn presigned_url(
    State(state): State<AppState>,
    q: Result<Query<UrlQuery>, QueryRejection>,
) -> Result<Json<UrlResponse>, ApiError> {
    let q = query(q)?;
    let expiry_days = q.expiry_days.unwrap_or(DEFAULT_EXPIRY_DAYS);
    let presigned = state.photos.presigned_url(&q.path, expiry_days).await?;
    Ok(Json(UrlResponse { url: presigned.url }))
}

/// GET `/files/exists?path=`
async fn exists(
    State(state): State<AppState>,
    q: Result<Query<PathQuery>, QueryRejection>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let q = query(q)?;
    let exists = state.photos.exists(&q.path).await?;
    Ok(Json(ExistsResponse { exists }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_router;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use photostore_core::photo::{PhotoService, PhotoServiceConfig};
    use photostore_core::storage::{StorageConfig, StorageProvider, StorageService};
    use rstest::rstest;
    use std::sync::Arc;
    use tower::ServiceExt;

    const PRODUCT: &str = "550e8400-e29b-41d4-a716-446655440000";
    const FILE: &str = "6ba7b811-9dad-11d1-80b4-00c04fd430c8";
    const BOUNDARY: &str = "photostore-test-boundary";

    fn app_with(config: PhotoServiceConfig) -> Router {
        let storage = Arc::new(
            StorageService::from_config(StorageConfig::new(StorageProvider::Memory))
                .expect("memory store"),
        );
        let photos = PhotoService::new(storage.clone(), config);
        create_router(AppState::new(storage, photos))
    }

    fn app() -> Router {
        app_with(PhotoServiceConfig::default())
    }

    fn photo_path() -> String {
        format!("{PRODUCT}/{FILE}.jpg")
    }

    /// Build a multipart body from text parts and an optional file part.
    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, content_type, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/files/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    async fn upload_test_photo(app: &Router) {
        let response = app
            .clone()
            .oneshot(upload_request(multipart_body(
                &[("productId", PRODUCT), ("fileId", FILE)],
                Some(("photo.jpg", "image/jpeg", b"test")),
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_returns_resolved_path() {
        let app = app();
        let response = app
            .oneshot(upload_request(multipart_body(
                &[("productId", PRODUCT), ("fileId", FILE)],
                Some(("photo.jpg", "image/jpeg", b"test")),
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["path"], photo_path());
        assert_eq!(json["productId"], PRODUCT);
        assert_eq!(json["fileId"], FILE);
        // The in-memory provider cannot presign.
        assert!(json.get("url").is_none());
    }

    #[tokio::test]
    async fn test_upload_then_view_streams_inline() {
        let app = app();
        upload_test_photo(&app).await;

        let response = app
            .oneshot(get(&format!("/files/view?path={}", photo_path())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "4");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            format!("inline; filename=\"{FILE}.jpg\"").as_str()
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"test");
    }

    #[tokio::test]
    async fn test_download_is_attachment() {
        let app = app();
        upload_test_photo(&app).await;

        let response = app
            .oneshot(get(&format!("/files/download?path={}", photo_path())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"{FILE}.jpg\"").as_str()
        );
    }

    #[tokio::test]
    async fn test_view_missing_is_404() {
        let response = app()
            .oneshot(get(&format!("/files/view?path={}", photo_path())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = json_body(response).await;
        assert_eq!(json["error"], "NOT_FOUND");
    }

    #[rstest]
    #[case(&[("fileId", FILE)], Some(("photo.jpg", "image/jpeg", b"test" as &[u8])))]
    #[case(&[("productId", "not-a-uuid")], Some(("photo.jpg", "image/jpeg", b"test" as &[u8])))]
    #[case(&[("productId", PRODUCT)], None)]
    #[case(&[("productId", PRODUCT)], Some(("notes.txt", "text/plain", b"test" as &[u8])))]
    #[case(&[("productId", PRODUCT)], Some(("photo", "image/jpeg", b"test" as &[u8])))]
    #[tokio::test]
    async fn test_upload_rejects_bad_form(
        #[case] fields: &[(&str, &str)],
        #[case] file: Option<(&str, &str, &[u8])>,
    ) {
        let response = app()
            .oneshot(upload_request(multipart_body(fields, file)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_upload_without_file_id_generates_one() {
        let app = app();
        let response = app
            .clone()
            .oneshot(upload_request(multipart_body(
                &[("productId", PRODUCT)],
                Some(("photo.png", "image/png", b"png")),
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        let path = json["path"].as_str().unwrap().to_string();
        assert!(path.starts_with(&format!("{PRODUCT}/")));
        assert!(path.ends_with(".png"));

        let response = app
            .oneshot(get(&format!("/files/exists?path={path}")))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["exists"], true);
    }

    #[tokio::test]
    async fn test_info_reports_metadata() {
        let app = app();
        upload_test_photo(&app).await;

        let response = app
            .oneshot(get(&format!("/files/info?path={}", photo_path())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["path"], photo_path());
        assert_eq!(json["fileName"], format!("{FILE}.jpg"));
        assert_eq!(json["contentType"], "image/jpeg");
        assert_eq!(json["size"], 4);
    }

    #[tokio::test]
    async fn test_list_returns_product_photos() {
        let app = app();
        upload_test_photo(&app).await;

        let response = app
            .clone()
            .oneshot(get(&format!("/files/list?productId={PRODUCT}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["path"], photo_path());

        let response = app
            .oneshot(get("/files/list?productId=nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let app = app();
        upload_test_photo(&app).await;

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("DELETE")
                        .uri(format!("/files/delete?path={}", photo_path()))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }

        let response = app
            .oneshot(get(&format!("/files/exists?path={}", photo_path())))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["exists"], false);
    }

    #[tokio::test]
    async fn test_delete_malformed_path_is_400() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/files/delete?path=../secrets")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[case("0", StatusCode::BAD_REQUEST)]
    #[case("8", StatusCode::BAD_REQUEST)]
    #[case("soon", StatusCode::BAD_REQUEST)]
    #[tokio::test]
    async fn test_url_rejects_bad_expiry(#[case] days: &str, #[case] status: StatusCode) {
        let app = app();
        upload_test_photo(&app).await;

        let response = app
            .oneshot(get(&format!(
                "/files/url?path={}&expiryDays={days}",
                photo_path()
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), status);
    }

    #[tokio::test]
    async fn test_url_missing_photo_is_404() {
        let response = app()
            .oneshot(get(&format!("/files/url?path={}", photo_path())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_url_without_presign_support_is_500() {
        let app = app();
        upload_test_photo(&app).await;

        let response = app
            .oneshot(get(&format!("/files/url?path={}", photo_path())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_exists_on_foreign_path_is_false() {
        let response = app()
            .oneshot(get("/files/exists?path=somewhere/else.txt"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["exists"], false);
    }

    #[tokio::test]
    async fn test_missing_query_is_400() {
        let response = app().oneshot(get("/files/info")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_rejected() {
        let app = app_with(PhotoServiceConfig::default().with_max_file_size(2));
        let response = app
            .oneshot(upload_request(multipart_body(
                &[("productId", PRODUCT)],
                Some(("photo.jpg", "image/jpeg", b"test")),
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_over_body_limit_is_413() {
        let app = app_with(PhotoServiceConfig::default().with_max_file_size(1));
        let large = vec![0_u8; 200 * 1024];
        let response = app
            .oneshot(upload_request(multipart_body(
                &[("productId", PRODUCT)],
                Some(("photo.jpg", "image/jpeg", large.as_slice())),
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(response).await["error"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_health_reports_provider() {
        let response = app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["provider"], "memory");
        assert_eq!(json["bucket"], "memory");
    }
}
