//! Listing analysis types.
//!
//! The response schema lives in `listing-types` so clients can use it without
//! the server; the request side is server-only.

use bytes::Bytes;

pub use listing_types::{
    AnalysisStatus, ListingAnalysis, ListingDescription, Platform, PlatformListing,
    PlatformListings,
};

/// An uploaded photo.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub mime_type: String,
    pub file_name: Option<String>,
}

/// One `/api/analyze` submission.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub image: ImageUpload,
    /// Free-form text; may be empty
    pub description: String,
}
