use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Extension, Multipart,
    },
    http::StatusCode,
    Json,
};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::listings::{analyze_listing, AnalyzeRequest, ImageUpload, ListingAnalysis};
use crate::server::app::AxumAppState;

/// MIME type assumed when the image part carries none.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// `POST /api/analyze`
///
/// Multipart fields: `image` (required), `description` and `transcription`
/// (optional, merged). Responds with a `ListingAnalysis`; an unusable model
/// reply still yields 200 with the fallback listing.
pub async fn analyze_handler(
    Extension(state): Extension<AxumAppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ListingAnalysis>, ApiError> {
    let request_id = Uuid::new_v4();

    async move {
        let multipart = multipart.map_err(|e| ApiError::InvalidForm(e.body_text()))?;
        let request = read_analyze_form(multipart).await?;

        info!(
            mime_type = %request.image.mime_type,
            bytes = request.image.bytes.len(),
            description_length = request.description.len(),
            "Image received"
        );

        let ai = state.deps.require_vision_ai()?;
        let analysis = analyze_listing(ai.as_ref(), request).await?;

        info!(status = ?analysis.status, "Analysis complete");
        Ok::<_, ApiError>(Json(analysis))
    }
    .instrument(info_span!("analyze", %request_id))
    .await
}

/// Read the multipart body into an `AnalyzeRequest`.
pub async fn read_analyze_form(mut multipart: Multipart) -> Result<AnalyzeRequest, ApiError> {
    let mut image = None;
    let mut description = String::new();
    let mut transcription = String::new();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let mime_type = image_mime_type(field.content_type(), file_name.as_deref());
                let bytes = field.bytes().await.map_err(form_error)?;

                if bytes.is_empty() {
                    continue;
                }
                if !mime_type.starts_with("image/") {
                    return Err(ApiError::InvalidForm(format!(
                        "image field has non-image content type {}",
                        mime_type
                    )));
                }

                image = Some(ImageUpload {
                    bytes,
                    mime_type,
                    file_name,
                });
            }
            "description" => description = field.text().await.map_err(form_error)?,
            "transcription" => transcription = field.text().await.map_err(form_error)?,
            _ => {}
        }
    }

    let image = image.ok_or(ApiError::NoImage)?;

    Ok(AnalyzeRequest {
        image,
        description: merge_description(&description, &transcription),
    })
}

/// Join the typed description and the voice transcript.
pub fn merge_description(description: &str, transcription: &str) -> String {
    let description = description.trim();
    let transcription = transcription.trim();

    match (description.is_empty(), transcription.is_empty()) {
        (false, false) => format!("{}\n\n{}", description, transcription),
        (false, true) => description.to_string(),
        (true, false) => transcription.to_string(),
        (true, true) => String::new(),
    }
}

/// Part content type, else a guess from the file name, else JPEG.
fn image_mime_type(content_type: Option<&str>, file_name: Option<&str>) -> String {
    match content_type {
        Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => ct.to_string(),
        _ => file_name
            .and_then(|name| mime_guess::from_path(name).first())
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
    }
}

fn form_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::ImageTooLarge(err.body_text())
    } else {
        ApiError::InvalidForm(err.body_text())
    }
}
