//! Static listing returned when the model's reply cannot be used.

use super::types::{
    AnalysisStatus, ListingAnalysis, ListingDescription, PlatformListing, PlatformListings,
};

pub const FALLBACK_ITEM_NAME: &str = "ANALYSIS FAILED";

const FALLBACK_PRICE: &str = "$0";

const FALLBACK_DESCRIPTION: &str = "We couldn't analyze this photo automatically. \
Please add the item's name, condition and price before posting.";

fn placeholder_listing(title: &str) -> PlatformListing {
    PlatformListing {
        title: title.to_string(),
        description: ListingDescription::Text(FALLBACK_DESCRIPTION.to_string()),
        price: FALLBACK_PRICE.to_string(),
        tags: Vec::new(),
    }
}

/// The fallback listing. Always identical; marked with `status: fallback`.
pub fn fallback_listing() -> ListingAnalysis {
    ListingAnalysis {
        status: AnalysisStatus::Fallback,
        item_name: FALLBACK_ITEM_NAME.to_string(),
        category: "Unknown".to_string(),
        condition: "Unknown".to_string(),
        price_suggestion: FALLBACK_PRICE.to_string(),
        detailed_description: FALLBACK_DESCRIPTION.to_string(),
        key_features: Vec::new(),
        materials_colors: String::new(),
        dimensions_estimate: String::new(),
        listings: PlatformListings {
            facebook: placeholder_listing("Item for sale - details needed"),
            craigslist: placeholder_listing("Item for sale - details needed"),
            offerup: placeholder_listing("Item for sale"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_marked() {
        let listing = fallback_listing();
        assert!(listing.is_fallback());
        assert_eq!(listing.item_name, FALLBACK_ITEM_NAME);
    }

    #[test]
    fn test_fallback_is_byte_identical() {
        let a = serde_json::to_vec(&fallback_listing()).unwrap();
        let b = serde_json::to_vec(&fallback_listing()).unwrap();
        assert_eq!(a, b);
    }
}
