use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::AppState;
use crate::upload::{NormalizeQuery, UploadForm, read_form};
use listing_core::{ArchiveError, ListingError, TransformError, UploadedImage};

const FAILED_COUNT_HEADER: HeaderName = HeaderName::from_static("x-failed-count");
const FAILED_ITEMS_HEADER: HeaderName = HeaderName::from_static("x-failed-items");

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let profiles = state.normalizer.profiles();
    let platforms: Vec<_> = profiles
        .iter()
        .map(|p| {
            serde_json::json!({
                "id": p.id,
                "label": p.label,
                "dimensions": p.dimensions_label(),
            })
        })
        .collect();

    Json(serde_json::json!({
        "message": "Product photo normalizer for e-commerce listings",
        "status": "active",
        "default_platform": profiles.default_profile().id,
        "platforms": platforms,
    }))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// 複数画像を正規化し、zip でまとめて返す
pub async fn process(
    State(state): State<AppState>,
    query: Result<Query<NormalizeQuery>, QueryRejection>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let UploadForm { files, options } = read_form(multipart, query_options(query)?, &state).await?;
    let (params, output) = options.resolve(&state)?;

    tracing::info!(
        platform = %params.platform,
        count = files.len(),
        policy = params.policy.name(),
        crop = params.crop,
        "processing batch"
    );

    let archive = run_blocking(state, move |state| {
        crate::transform::normalize_batch(state, &files, &params, output)
    })
    .await?;

    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, attachment(&archive.file_name)),
        ],
        archive.data,
    )
        .into_response();

    // 除外した画像はヘッダで知らせる
    if !archive.skipped.is_empty() {
        let headers = response.headers_mut();
        headers.insert(FAILED_COUNT_HEADER, HeaderValue::from(archive.skipped.len()));
        if let Ok(value) = HeaderValue::from_str(&archive.skipped.join(",")) {
            headers.insert(FAILED_ITEMS_HEADER, value);
        }
    }

    Ok(response)
}

/// 1枚を正規化し、画像をそのまま返す
pub async fn download(
    State(state): State<AppState>,
    query: Result<Query<NormalizeQuery>, QueryRejection>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let UploadForm { files, options } = read_form(multipart, query_options(query)?, &state).await?;
    let upload = single_file(files)?;
    let (params, output) = options.resolve(&state)?;

    tracing::info!(
        platform = %params.platform,
        file_name = %upload.file_name,
        "normalizing image for download"
    );

    let image = run_blocking(state, move |state| {
        crate::transform::normalize_single(state, &upload, &params, output)
    })
    .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, image.content_type.to_string()),
            (header::CONTENT_DISPOSITION, attachment(&image.file_name)),
        ],
        image.data,
    )
        .into_response())
}

/// 元画像と処理後画像を base64 で返す
pub async fn preview(
    State(state): State<AppState>,
    query: Result<Query<NormalizeQuery>, QueryRejection>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let UploadForm { files, options } = read_form(multipart, query_options(query)?, &state).await?;
    let upload = single_file(files)?;
    let (params, output) = options.resolve(&state)?;

    tracing::info!(
        platform = %params.platform,
        file_name = %upload.file_name,
        "generating preview"
    );

    let payload = run_blocking(state, move |state| {
        crate::transform::preview(state, &upload, &params, output)
    })
    .await?;

    Ok(Json(payload).into_response())
}

/// クエリ文字列の解析エラーも JSON のエラーとして返す
fn query_options(
    query: Result<Query<NormalizeQuery>, QueryRejection>,
) -> Result<NormalizeQuery, AppError> {
    match query {
        Ok(Query(options)) => Ok(options),
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "invalid query string");
            Err(AppError::BadRequest(rejection.body_text()))
        }
    }
}

fn single_file(mut files: Vec<UploadedImage>) -> Result<UploadedImage, AppError> {
    match files.len() {
        1 => Ok(files.remove(0)),
        0 => Err(AppError::BadRequest("no image received".to_string())),
        n => Err(AppError::BadRequest(format!(
            "exactly one image expected, got {n}"
        ))),
    }
}

fn attachment(file_name: &str) -> String {
    format!("attachment; filename=\"{file_name}\"")
}

/// 画像処理をブロッキングスレッドで実行する
async fn run_blocking<T, F>(state: AppState, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| AppError::Internal(format!("worker task failed: {e}")))?
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    PayloadTooLarge(String),
    TransformFailed(String),
    Internal(String),
}

impl From<ListingError> for AppError {
    fn from(err: ListingError) -> Self {
        match err {
            ListingError::Validation(msg) => {
                tracing::warn!(error = %msg, "validation error");
                AppError::BadRequest(msg)
            }
            ListingError::Transform(transform_err) => transform_err.into(),
            ListingError::Archive(archive_err) => archive_err.into(),
        }
    }
}

impl From<TransformError> for AppError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::Decode(msg) => {
                tracing::warn!(error = %msg, "image decode failed");
                AppError::TransformFailed(format!("could not decode image: {msg}"))
            }
            TransformError::InvalidProfile(msg) => {
                tracing::warn!(error = %msg, "invalid platform profile");
                AppError::BadRequest(msg)
            }
            TransformError::DegenerateGeometry {
                stage,
                width,
                height,
            } => {
                tracing::warn!(%stage, width, height, "degenerate geometry");
                AppError::TransformFailed(format!(
                    "{stage} collapsed to {width}x{height}, check the fill percentages"
                ))
            }
            TransformError::ResolutionTooLarge { width, height } => {
                tracing::warn!(width = %width, height = %height, "image resolution too large");
                AppError::BadRequest(format!("image resolution {width}x{height} is too large"))
            }
            TransformError::ProcessingFailed(msg) => {
                tracing::error!(error = %msg, "image processing failed");
                AppError::TransformFailed(msg)
            }
        }
    }
}

impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        AppError::Internal(format!("archive error: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::TransformFailed(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
