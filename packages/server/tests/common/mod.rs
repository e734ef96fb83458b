// Common test utilities

pub mod harness;
pub mod multipart;

pub use harness::*;
pub use multipart::*;

/// A flat-layout model reply for a blue vase.
pub const VASE_REPLY: &str = r#"Here is your listing:
```json
{
  "item_name": "Blue Ceramic Vase",
  "category": "Home Decor",
  "condition": "Like New",
  "price_suggestion": "$35",
  "detailed_description": "Glazed cobalt vase, no chips or cracks.",
  "key_features": ["Hand-glazed", "No chips"],
  "materials_colors": "ceramic, cobalt blue",
  "dimensions_estimate": "about 10 inches tall",
  "facebook_title": "Blue Ceramic Vase - Like New",
  "facebook_description": "Beautiful cobalt vase with no chips. Porch pickup.",
  "craigslist_title": "Blue ceramic vase - excellent condition",
  "craigslist_description": "Cobalt ceramic vase, about 10in tall. Cash only.",
  "offerup_title": "Cobalt Vase",
  "offerup_description": "Blue vase, like new.",
  "tags": ["vase", "home decor", "ceramic"]
}
```"#;
