//! Prompt for listing generation.

/// Low temperature keeps the JSON layout stable.
pub const TEMPERATURE: f32 = 0.3;

pub const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Connectivity probe used by `/api/debug` and `/api/test`.
pub const PING_PROMPT: &str = "Reply with the single word: OK";

const NO_DESCRIPTION: &str = "No additional description provided.";

/// Build the listing prompt, embedding the seller's description verbatim.
pub fn build_listing_prompt(description: &str) -> String {
    let description = description.trim();
    let description = if description.is_empty() {
        NO_DESCRIPTION
    } else {
        description
    };

    format!(
        r#"You are an expert at selling second-hand items online. Look at the photo and the seller's notes below.

Identify the item, infer its condition, materials, colors and notable features, estimate a realistic used-market price in US dollars, and write marketplace listings.

Seller's notes:
"""
{description}
"""

Return ONLY a JSON object with exactly these fields:
{{
  "item_name": "short name of the item",
  "category": "marketplace category",
  "condition": "New | Like New | Good | Fair | Poor",
  "price_suggestion": "$NN",
  "detailed_description": "2-4 sentences describing the item",
  "key_features": ["feature", "feature"],
  "materials_colors": "materials and colors",
  "dimensions_estimate": "approximate size",
  "facebook_title": "friendly title under 100 characters",
  "facebook_description": "casual, friendly description",
  "craigslist_title": "plain, searchable title",
  "craigslist_description": "straightforward description with condition and pickup details",
  "offerup_title": "concise title",
  "offerup_description": "short, mobile-friendly description",
  "tags": ["search", "keywords"]
}}

Rules:
- Prices are strings starting with "$".
- Trust the seller's notes over what you see when they conflict.
- Do not wrap the JSON in markdown and do not add commentary."#
    )
}
