// FlipEasy - listing generation API
//
// Accepts a photo and a short description of an item and returns marketplace
// listing copy (Facebook, Craigslist, OfferUp) written by a Gemini vision model.
//
// Layout: common (errors), config, domains (listing logic), kernel (AI clients
// behind traits), server (axum routes).

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
