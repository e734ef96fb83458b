//! Turning the model's free-text reply into a validated `ListingAnalysis`.
//!
//! The model is asked for a flat JSON layout, but replies are free text: the
//! object may be fenced in markdown, surrounded by prose, or written in the
//! older nested layout (`item_analysis` / `pricing_strategy` / `listings`).
//! Everything is deserialized into strict types and validated; any failure is
//! reported as a `ListingParseError` so the caller can substitute the fallback.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use super::types::{
    AnalysisStatus, ListingAnalysis, ListingDescription, Platform, PlatformListing,
    PlatformListings,
};

const MAX_TAGS: usize = 10;

lazy_static! {
    static ref PRICE_AMOUNT: Regex = Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap();
}

#[derive(Debug, Error)]
pub enum ListingParseError {
    #[error("no JSON object found in model response")]
    NoJson,

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("schema mismatch: {0}")]
    Schema(String),
}

/// Parse and validate a model reply.
///
/// The greedy `{..}` slice is tried first. When it does not yield a valid
/// listing, every balanced `{...}` span in the reply is tried in order and the
/// first one that passes the full pipeline wins; otherwise the error from the
/// greedy slice is returned.
pub fn parse_listing_response(text: &str) -> Result<ListingAnalysis, ListingParseError> {
    let primary = extract_json_block(text).ok_or(ListingParseError::NoJson)?;

    let first_error = match parse_candidate(primary) {
        Ok(analysis) => return Ok(analysis),
        Err(e) => e,
    };

    balanced_objects(text)
        .filter(|span| *span != primary)
        .find_map(|span| parse_candidate(span).ok())
        .ok_or(first_error)
}

/// Deserialize, migrate and validate one candidate object.
fn parse_candidate(candidate: &str) -> Result<ListingAnalysis, ListingParseError> {
    let value: Value = serde_json::from_str(candidate)?;
    if !value.is_object() {
        return Err(ListingParseError::Schema("expected a JSON object".into()));
    }

    let analysis = if is_legacy_layout(&value) {
        serde_json::from_value::<LegacyModelListing>(value)
            .map_err(|e| ListingParseError::Schema(e.to_string()))?
            .into_analysis()
    } else {
        serde_json::from_value::<FlatModelListing>(value)
            .map_err(|e| ListingParseError::Schema(e.to_string()))?
            .into_analysis()
    };

    normalize(analysis)
}

/// Locate the JSON object in a reply: a ```json fence, any fence, then the
/// first `{` through the last `}`.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_marker = &trimmed[start + 7..];
        if let Some(end) = after_marker.find("```") {
            let inner = after_marker[..end].trim();
            if inner.starts_with('{') {
                return Some(inner);
            }
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_marker = &trimmed[start + 3..];
        // Skip the language identifier line, if any
        let content_start = after_marker.find('\n').map(|i| i + 1).unwrap_or(0);
        let after_marker = &after_marker[content_start..];
        if let Some(end) = after_marker.find("```") {
            let inner = after_marker[..end].trim();
            if inner.starts_with('{') {
                return Some(inner);
            }
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end > start {
        Some(&trimmed[start..=end])
    } else {
        None
    }
}

fn balanced_objects(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices('{')
        .filter_map(move |(start, _)| balanced_len(&text[start..]).map(|len| &text[start..start + len]))
}

/// Length of the brace-balanced prefix of `s` (which starts with `{`), string-aware.
fn balanced_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

fn is_legacy_layout(value: &Value) -> bool {
    value.get("item_analysis").is_some() || value.get("listings").map_or(false, Value::is_object)
}

// =============================================================================
// Lenient field readers
// =============================================================================

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .into_iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| format!("{}: {}", k, value_to_text(v)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Strings, numbers and lists all read as text.
fn flexible_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(value_to_text).unwrap_or_default())
}

/// Lists, or a comma-separated string.
fn flexible_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let items = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.into_iter().map(value_to_text).collect(),
        Some(Value::String(s)) => s.split(',').map(|part| part.trim().to_string()).collect(),
        Some(other) => vec![value_to_text(other)],
    };

    Ok(items.into_iter().filter(|s| !s.is_empty()).collect())
}

// =============================================================================
// Flat layout (what the prompt asks for)
// =============================================================================

#[derive(Debug, Deserialize)]
struct FlatModelListing {
    #[serde(deserialize_with = "flexible_text")]
    item_name: String,
    #[serde(default, deserialize_with = "flexible_text")]
    category: String,
    #[serde(default, deserialize_with = "flexible_text")]
    condition: String,
    #[serde(deserialize_with = "flexible_text")]
    price_suggestion: String,
    #[serde(default, deserialize_with = "flexible_text")]
    detailed_description: String,
    #[serde(default, deserialize_with = "flexible_list")]
    key_features: Vec<String>,
    #[serde(default, deserialize_with = "flexible_text")]
    materials_colors: String,
    #[serde(default, deserialize_with = "flexible_text")]
    dimensions_estimate: String,
    #[serde(deserialize_with = "flexible_text")]
    facebook_title: String,
    #[serde(default)]
    facebook_description: Option<ListingDescription>,
    #[serde(deserialize_with = "flexible_text")]
    craigslist_title: String,
    #[serde(default)]
    craigslist_description: Option<ListingDescription>,
    #[serde(default, deserialize_with = "flexible_text")]
    offerup_title: String,
    #[serde(default)]
    offerup_description: Option<ListingDescription>,
    #[serde(default, deserialize_with = "flexible_list")]
    tags: Vec<String>,
}

impl FlatModelListing {
    fn into_analysis(self) -> ListingAnalysis {
        let detailed = self.detailed_description;
        let describe = |description: Option<ListingDescription>| {
            description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| ListingDescription::Text(detailed.clone()))
        };

        let facebook_description = describe(self.facebook_description);
        let craigslist_description = describe(self.craigslist_description);
        // OfferUp was added to the prompt later; older replies omit it.
        let offerup_description = match self.offerup_description.filter(|d| !d.is_empty()) {
            Some(description) => description,
            None => facebook_description.clone(),
        };
        let offerup_title = if self.offerup_title.is_empty() {
            self.facebook_title.clone()
        } else {
            self.offerup_title
        };

        let listing = |title: String, description: ListingDescription| PlatformListing {
            title,
            description,
            price: String::new(),
            tags: self.tags.clone(),
        };

        ListingAnalysis {
            status: AnalysisStatus::Generated,
            item_name: self.item_name,
            category: self.category,
            condition: self.condition,
            price_suggestion: self.price_suggestion,
            key_features: self.key_features,
            materials_colors: self.materials_colors,
            dimensions_estimate: self.dimensions_estimate,
            listings: PlatformListings {
                facebook: listing(self.facebook_title, facebook_description),
                craigslist: listing(self.craigslist_title, craigslist_description),
                offerup: listing(offerup_title, offerup_description),
            },
            detailed_description: detailed,
        }
    }
}

// =============================================================================
// Legacy nested layout
// =============================================================================

#[derive(Debug, Deserialize)]
struct LegacyModelListing {
    item_analysis: LegacyItemAnalysis,
    #[serde(default)]
    pricing_strategy: Option<LegacyPricing>,
    listings: LegacyListings,
}

#[derive(Debug, Deserialize)]
struct LegacyItemAnalysis {
    #[serde(alias = "name", deserialize_with = "flexible_text")]
    item_name: String,
    #[serde(default, deserialize_with = "flexible_text")]
    category: String,
    #[serde(default, deserialize_with = "flexible_text")]
    condition: String,
    #[serde(default, alias = "description", deserialize_with = "flexible_text")]
    detailed_description: String,
    #[serde(default, alias = "features", deserialize_with = "flexible_list")]
    key_features: Vec<String>,
    #[serde(default, alias = "materials", deserialize_with = "flexible_text")]
    materials_colors: String,
    #[serde(default, alias = "dimensions", deserialize_with = "flexible_text")]
    dimensions_estimate: String,
}

#[derive(Debug, Deserialize)]
struct LegacyPricing {
    #[serde(
        default,
        alias = "recommended_price",
        alias = "listing_price",
        deserialize_with = "flexible_text"
    )]
    suggested_price: String,
}

#[derive(Debug, Deserialize)]
struct LegacyListings {
    facebook: LegacyPlatformListing,
    craigslist: LegacyPlatformListing,
    #[serde(default)]
    offerup: Option<LegacyPlatformListing>,
}

#[derive(Debug, Clone, Deserialize)]
struct LegacyPlatformListing {
    #[serde(deserialize_with = "flexible_text")]
    title: String,
    #[serde(default)]
    description: Option<ListingDescription>,
    #[serde(default, deserialize_with = "flexible_text")]
    price: String,
    #[serde(default, deserialize_with = "flexible_list")]
    tags: Vec<String>,
}

impl LegacyPlatformListing {
    fn into_listing(self, fallback_description: &str) -> PlatformListing {
        PlatformListing {
            title: self.title,
            description: self
                .description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| ListingDescription::Text(fallback_description.to_string())),
            price: self.price,
            tags: self.tags,
        }
    }
}

impl LegacyModelListing {
    fn into_analysis(self) -> ListingAnalysis {
        let item = self.item_analysis;
        let listings = self.listings;

        let price_suggestion = self
            .pricing_strategy
            .map(|p| p.suggested_price)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| listings.facebook.price.clone());

        let offerup = listings
            .offerup
            .unwrap_or_else(|| listings.facebook.clone());

        ListingAnalysis {
            status: AnalysisStatus::Generated,
            listings: PlatformListings {
                facebook: listings.facebook.into_listing(&item.detailed_description),
                craigslist: listings.craigslist.into_listing(&item.detailed_description),
                offerup: offerup.into_listing(&item.detailed_description),
            },
            item_name: item.item_name,
            category: item.category,
            condition: item.condition,
            price_suggestion,
            detailed_description: item.detailed_description,
            key_features: item.key_features,
            materials_colors: item.materials_colors,
            dimensions_estimate: item.dimensions_estimate,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Ensure the price carries a `$` amount: `"45"` becomes `"$45"`, `"35 USD"`
/// becomes `"$35 USD"`. Anything without an amount is rejected.
pub fn normalize_price(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let amount = PRICE_AMOUNT.find(trimmed)?;

    if trimmed.contains('$') {
        return Some(trimmed.to_string());
    }

    Some(format!(
        "{}${}",
        &trimmed[..amount.start()],
        &trimmed[amount.start()..]
    ))
}

/// Lowercase, strip `#`, dedupe in order, cap at ten.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();

    for tag in tags {
        let tag = tag.trim().trim_start_matches('#').trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
        if normalized.len() == MAX_TAGS {
            break;
        }
    }

    normalized
}

fn normalize(mut analysis: ListingAnalysis) -> Result<ListingAnalysis, ListingParseError> {
    analysis.item_name = analysis.item_name.trim().to_string();
    if analysis.item_name.is_empty() {
        return Err(ListingParseError::Schema("item_name is empty".into()));
    }

    analysis.price_suggestion = normalize_price(&analysis.price_suggestion).ok_or_else(|| {
        ListingParseError::Schema(format!(
            "price_suggestion has no amount: {:?}",
            analysis.price_suggestion
        ))
    })?;

    for platform in Platform::ALL {
        let price_suggestion = analysis.price_suggestion.clone();
        let listing = analysis.listings.get_mut(platform);

        listing.title = listing.title.trim().to_string();
        if listing.title.is_empty() {
            return Err(ListingParseError::Schema(format!(
                "{} title is empty",
                platform.label()
            )));
        }

        listing.price = normalize_price(&listing.price).unwrap_or(price_suggestion);
        listing.tags = normalize_tags(&listing.tags);
    }

    Ok(analysis)
}
