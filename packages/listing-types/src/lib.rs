//! The `/api/analyze` response schema, shared by the server and its clients.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Whether a response reflects the model's output or the static fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Generated,
    Fallback,
}

/// Marketplaces a listing is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Craigslist,
    OfferUp,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Facebook, Platform::Craigslist, Platform::OfferUp];

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook Marketplace",
            Platform::Craigslist => "Craigslist",
            Platform::OfferUp => "OfferUp",
        }
    }
}

/// A listing description: flat text, or named sections in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListingDescription {
    Text(String),
    Sections(IndexMap<String, String>),
}

impl ListingDescription {
    pub fn is_empty(&self) -> bool {
        match self {
            ListingDescription::Text(text) => text.trim().is_empty(),
            ListingDescription::Sections(sections) => {
                sections.values().all(|text| text.trim().is_empty())
            }
        }
    }

    /// Plain-text rendering; sections become `Name:\ntext` blocks separated by blank lines.
    pub fn to_plain_text(&self) -> String {
        match self {
            ListingDescription::Text(text) => text.clone(),
            ListingDescription::Sections(sections) => sections
                .iter()
                .map(|(name, text)| format!("{}:\n{}", name, text))
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

impl From<&str> for ListingDescription {
    fn from(text: &str) -> Self {
        ListingDescription::Text(text.to_string())
    }
}

/// Listing copy for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformListing {
    pub title: String,
    pub description: ListingDescription,
    pub price: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Per-platform listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformListings {
    pub facebook: PlatformListing,
    pub craigslist: PlatformListing,
    pub offerup: PlatformListing,
}

impl PlatformListings {
    pub fn get(&self, platform: Platform) -> &PlatformListing {
        match platform {
            Platform::Facebook => &self.facebook,
            Platform::Craigslist => &self.craigslist,
            Platform::OfferUp => &self.offerup,
        }
    }

    pub fn get_mut(&mut self, platform: Platform) -> &mut PlatformListing {
        match platform {
            Platform::Facebook => &mut self.facebook,
            Platform::Craigslist => &mut self.craigslist,
            Platform::OfferUp => &mut self.offerup,
        }
    }
}

/// Normalized analysis of one photographed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingAnalysis {
    pub status: AnalysisStatus,
    pub item_name: String,
    pub category: String,
    pub condition: String,
    pub price_suggestion: String,
    pub detailed_description: String,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub materials_colors: String,
    #[serde(default)]
    pub dimensions_estimate: String,
    pub listings: PlatformListings,
}

impl ListingAnalysis {
    pub fn is_fallback(&self) -> bool {
        self.status == AnalysisStatus::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Platform::OfferUp).unwrap(), "\"offerup\"");
        assert_eq!(
            serde_json::from_str::<Platform>("\"craigslist\"").unwrap(),
            Platform::Craigslist
        );
    }

    #[test]
    fn test_description_accepts_text_or_sections() {
        let text: ListingDescription = serde_json::from_str("\"Nice vase\"").unwrap();
        assert_eq!(text, ListingDescription::Text("Nice vase".into()));

        let sections: ListingDescription =
            serde_json::from_str(r#"{"Overview": "Blue vase", "Condition": "No chips"}"#).unwrap();
        assert_eq!(
            sections.to_plain_text(),
            "Overview:\nBlue vase\n\nCondition:\nNo chips"
        );
    }

    #[test]
    fn test_blank_description_is_empty() {
        assert!(ListingDescription::Text("  ".into()).is_empty());

        let mut sections = IndexMap::new();
        sections.insert("Overview".to_string(), String::new());
        assert!(ListingDescription::Sections(sections).is_empty());
    }
}
