//! FlipEasy command-line client.
//!
//! Photo in, marketplace listings out: prepares the photo, collects a
//! description, calls the server and renders the result per platform.

pub mod api;
pub mod collector;
pub mod image_prep;
pub mod progress;
pub mod render;
pub mod session;

pub use api::{ClientError, ListingApiClient, DEFAULT_SERVER_URL};
pub use collector::{DescriptionCollector, Question, Recording};
pub use image_prep::{prepare_file, prepare_image, PreparedImage};
pub use render::{full_listing_text, CopyIndicator, ListingField, ResultView};
pub use session::{ListingSession, SessionError, Step, Submission};
