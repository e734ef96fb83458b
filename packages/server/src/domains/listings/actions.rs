//! Listing generation: prompt the model with the photo, then parse or fall back.

use std::time::Instant;

use gemini_client::{truncate_to_char_boundary, GeminiError};
use tracing::{info, warn};

use super::extract::parse_listing_response;
use super::fallback::fallback_listing;
use super::prompt::build_listing_prompt;
use super::types::{AnalyzeRequest, ListingAnalysis};
use crate::common::ApiError;
use crate::kernel::BaseVisionAI;

const RAW_PREVIEW_BYTES: usize = 200;

/// Generate listings for one photo.
///
/// Upstream failures are errors. A reply that cannot be parsed or validated is
/// not: the static fallback listing is returned instead.
pub async fn analyze_listing(
    ai: &dyn BaseVisionAI,
    request: AnalyzeRequest,
) -> Result<ListingAnalysis, ApiError> {
    let prompt = build_listing_prompt(&request.description);

    let start = Instant::now();
    let reply = match ai.describe_image(&request.image, &prompt).await {
        Ok(reply) => reply,
        Err(GeminiError::Parse(reason)) => {
            warn!(reason = %reason, "Model reply had no usable text, using fallback listing");
            return Ok(fallback_listing());
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        duration_ms = start.elapsed().as_millis(),
        response_length = reply.len(),
        "Model reply received"
    );

    match parse_listing_response(&reply) {
        Ok(analysis) => {
            info!(item_name = %analysis.item_name, "Listing parsed");
            Ok(analysis)
        }
        Err(e) => {
            warn!(
                error = %e,
                raw_preview = %truncate_to_char_boundary(&reply, RAW_PREVIEW_BYTES),
                "Could not parse model reply, using fallback listing"
            );
            Ok(fallback_listing())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::listings::types::{AnalysisStatus, ImageUpload};
    use crate::kernel::test_dependencies::MockVisionAI;

    fn request(description: &str) -> AnalyzeRequest {
        AnalyzeRequest {
            image: ImageUpload {
                bytes: bytes::Bytes::from_static(b"\xff\xd8\xff\xe0fake-jpeg"),
                mime_type: "image/jpeg".to_string(),
                file_name: Some("vase.jpg".to_string()),
            },
            description: description.to_string(),
        }
    }

    #[tokio::test]
    async fn test_prose_reply_falls_back() {
        let ai = MockVisionAI::new().with_reply("I'm not sure what this is.");

        let analysis = analyze_listing(&ai, request("")).await.unwrap();
        assert_eq!(analysis.status, AnalysisStatus::Fallback);
    }

    #[tokio::test]
    async fn test_prompt_carries_description_and_image() {
        let ai = MockVisionAI::new().with_reply("no json");

        analyze_listing(&ai, request("blue ceramic vase, no chips"))
            .await
            .unwrap();

        let calls = ai.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].mime_type, "image/jpeg");
        assert!(calls[0].prompt.contains("blue ceramic vase, no chips"));
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let ai = MockVisionAI::new().with_error(GeminiError::Api {
            status: 503,
            body: "overloaded".into(),
        });

        let err = analyze_listing(&ai, request("")).await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream { status: Some(503), .. }));
    }

    #[tokio::test]
    async fn test_blocked_reply_falls_back() {
        let ai = MockVisionAI::new().with_error(GeminiError::Parse("Prompt blocked: SAFETY".into()));

        let analysis = analyze_listing(&ai, request("")).await.unwrap();
        assert!(analysis.is_fallback());
    }
}
