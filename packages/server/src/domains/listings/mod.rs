//! Listings domain - turns a photo and a description into marketplace listings
//!
//! Responsibilities:
//! - Prompt construction for the vision model
//! - Extracting and validating the JSON in the model's reply
//! - The static fallback listing used when a reply is unusable

pub mod actions;
pub mod extract;
pub mod fallback;
pub mod prompt;
pub mod types;

pub use actions::analyze_listing;
pub use extract::{parse_listing_response, ListingParseError};
pub use fallback::{fallback_listing, FALLBACK_ITEM_NAME};
pub use types::*;
