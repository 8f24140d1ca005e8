//! Image and video prediction handlers.

use std::path::Path;
use std::time::Instant;

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::Json;
use fakescan_models::{PredictionResponse, VideoPredictionResponse};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

const NO_FILE: &str = "No file uploaded";

/// Classify the primary face of an uploaded image.
pub async fn predict(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<PredictionResponse>> {
    let start = Instant::now();
    let result: ApiResult<PredictionResponse> = async {
        while let Some(field) = multipart.next_field().await? {
            let Some(filename) = upload_filename(&field)? else {
                continue;
            };
            let bytes = field.bytes().await?;
            info!(filename = %filename, size = bytes.len(), "Image received");

            let service = state.service.clone();
            let analysis = tokio::task::spawn_blocking(move || service.predict_image_bytes(&bytes)).await??;
            return Ok(PredictionResponse::from(&analysis.classification));
        }
        Err(ApiError::bad_request(NO_FILE))
    }
    .await;

    observe("/predict", result, start, |response| {
        metrics::record_verdict("/predict", response.verdict, start.elapsed().as_secs_f64());
    })
}

/// Run the voting pipeline over an uploaded video.
///
/// The upload is spooled to a temporary file that is removed when the
/// request ends, whether the analysis succeeded or not.
pub async fn predict_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<VideoPredictionResponse>> {
    let start = Instant::now();
    let result: ApiResult<VideoPredictionResponse> = async {
        while let Some(mut field) = multipart.next_field().await? {
            let Some(filename) = upload_filename(&field)? else {
                continue;
            };
            let spooled = spool_file(state.config.upload_dir.as_deref(), &filename)?;

            let mut writer = tokio::fs::File::from_std(spooled.reopen().map_err(io_internal)?);
            let mut size = 0usize;
            while let Some(chunk) = field.chunk().await? {
                size += chunk.len();
                writer.write_all(&chunk).await.map_err(io_internal)?;
            }
            writer.flush().await.map_err(io_internal)?;
            drop(writer);
            info!(filename = %filename, size, path = %spooled.path().display(), "Video received");

            let service = state.service.clone();
            let report = tokio::task::spawn_blocking(move || {
                let report = service.predict_video(spooled.path(), None, None);
                if let Err(e) = spooled.close() {
                    warn!(error = %e, "Failed to remove spooled upload");
                }
                report
            })
            .await??;

            metrics::record_video_frames(report.frames_sampled);
            return Ok(VideoPredictionResponse::new(&report.verdict, report.frames_sampled));
        }
        Err(ApiError::bad_request(NO_FILE))
    }
    .await;

    observe("/predict_video", result, start, |response| {
        metrics::record_verdict("/predict_video", response.verdict, start.elapsed().as_secs_f64());
    })
}

/// Filename of the upload if `field` is the `file` field.
fn upload_filename(field: &Field<'_>) -> ApiResult<Option<String>> {
    if field.name() != Some(FILE_FIELD) {
        return Ok(None);
    }
    match field.file_name().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(Some(name.to_string())),
        _ => Err(ApiError::bad_request("No file selected")),
    }
}

/// Temporary file keeping the upload's extension so the demuxer can be picked.
fn spool_file(upload_dir: Option<&Path>, filename: &str) -> ApiResult<NamedTempFile> {
    let suffix = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    let mut builder = tempfile::Builder::new();
    builder.prefix("upload_").suffix(&suffix);
    let file = match upload_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(io_internal)?;
            builder.tempfile_in(dir)
        }
        None => builder.tempfile(),
    };
    file.map_err(io_internal)
}

fn io_internal(e: std::io::Error) -> ApiError {
    ApiError::internal(format!("upload spooling failed: {e}"))
}

fn observe<T>(endpoint: &str, result: ApiResult<T>, start: Instant, on_ok: impl FnOnce(&T)) -> ApiResult<Json<T>> {
    match result {
        Ok(response) => {
            on_ok(&response);
            Ok(Json(response))
        }
        Err(e) => {
            let status = e.status_code();
            if status.is_client_error() {
                info!(endpoint, error = %e, duration_ms = start.elapsed().as_millis() as u64, "Prediction rejected");
            }
            metrics::record_prediction_failure(endpoint, status.as_u16());
            Err(e)
        }
    }
}
