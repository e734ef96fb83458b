//! Result presentation: platform tabs, copyable fields, the copy indicator.

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use colored::Colorize;
use listing_types::{ListingAnalysis, Platform, PlatformListing};

/// How long "Copied" stays visible.
pub const COPY_INDICATOR_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingField {
    Title,
    Price,
    Description,
    Tags,
    FullListing,
}

impl ListingField {
    pub const ALL: [ListingField; 5] = [
        ListingField::Title,
        ListingField::Price,
        ListingField::Description,
        ListingField::Tags,
        ListingField::FullListing,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ListingField::Title => "title",
            ListingField::Price => "price",
            ListingField::Description => "description",
            ListingField::Tags => "tags",
            ListingField::FullListing => "full listing",
        }
    }
}

/// `"{title}\n\nPrice: {price}\n\n{description}"`
pub fn full_listing_text(listing: &PlatformListing) -> String {
    format!(
        "{}\n\nPrice: {}\n\n{}",
        listing.title,
        listing.price,
        listing.description.to_plain_text()
    )
}

/// Text placed on the clipboard for one field.
pub fn field_text(listing: &PlatformListing, field: ListingField) -> String {
    match field {
        ListingField::Title => listing.title.clone(),
        ListingField::Price => listing.price.clone(),
        ListingField::Description => listing.description.to_plain_text(),
        ListingField::Tags => listing.tags.join(", "),
        ListingField::FullListing => full_listing_text(listing),
    }
}

/// Remembers the last copied field until the TTL passes.
#[derive(Debug, Default, Clone)]
pub struct CopyIndicator {
    copied: Option<(Platform, ListingField, Instant)>,
}

impl CopyIndicator {
    pub fn mark(&mut self, platform: Platform, field: ListingField, now: Instant) {
        self.copied = Some((platform, field, now));
    }

    /// The field still flagged as copied at `now`.
    pub fn active(&self, now: Instant) -> Option<(Platform, ListingField)> {
        self.copied
            .filter(|(_, _, at)| now.saturating_duration_since(*at) < COPY_INDICATOR_TTL)
            .map(|(platform, field, _)| (platform, field))
    }

    pub fn is_copied(&self, platform: Platform, field: ListingField, now: Instant) -> bool {
        self.active(now) == Some((platform, field))
    }
}

/// Results screen state: the active tab and the copy indicator.
#[derive(Debug, Clone)]
pub struct ResultView {
    analysis: ListingAnalysis,
    active: Platform,
    copy: CopyIndicator,
}

impl ResultView {
    pub fn new(analysis: ListingAnalysis) -> Self {
        Self {
            analysis,
            active: Platform::Facebook,
            copy: CopyIndicator::default(),
        }
    }

    pub fn analysis(&self) -> &ListingAnalysis {
        &self.analysis
    }

    pub fn active_platform(&self) -> Platform {
        self.active
    }

    pub fn select(&mut self, platform: Platform) {
        self.active = platform;
    }

    pub fn active_listing(&self) -> &PlatformListing {
        self.analysis.listings.get(self.active)
    }

    /// Copy a field of the active tab; returns the clipboard payload.
    pub fn copy(&mut self, field: ListingField, now: Instant) -> String {
        self.copy.mark(self.active, field, now);
        field_text(self.active_listing(), field)
    }

    pub fn copy_indicator(&self) -> &CopyIndicator {
        &self.copy
    }

    /// Render the active tab.
    pub fn render(&self, now: Instant) -> String {
        let mut out = String::new();
        let analysis = &self.analysis;

        if analysis.is_fallback() {
            let _ = writeln!(
                out,
                "{}",
                "⚠ The photo could not be analyzed. This is placeholder text; edit it before posting."
                    .yellow()
                    .bold()
            );
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "{}", analysis.item_name.bold());
        let _ = writeln!(
            out,
            "{} · {} · suggested {}",
            analysis.category,
            analysis.condition,
            analysis.price_suggestion.green()
        );
        if !analysis.detailed_description.is_empty() {
            let _ = writeln!(out, "{}", analysis.detailed_description.dimmed());
        }
        for feature in &analysis.key_features {
            let _ = writeln!(out, "  • {}", feature);
        }
        let _ = writeln!(out);

        let tabs: Vec<String> = Platform::ALL
            .iter()
            .map(|p| {
                if *p == self.active {
                    format!("[{}]", p.label()).cyan().bold().to_string()
                } else {
                    format!(" {} ", p.label()).dimmed().to_string()
                }
            })
            .collect();
        let _ = writeln!(out, "{}", tabs.join("  "));
        let _ = writeln!(out);

        let listing = self.active_listing();
        let copied = |field| {
            if self.copy.is_copied(self.active, field, now) {
                format!(" {}", "✓ Copied".green())
            } else {
                String::new()
            }
        };

        let _ = writeln!(out, "{}{}", "Title".bold(), copied(ListingField::Title));
        let _ = writeln!(out, "{}", listing.title);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}{}", "Price".bold(), copied(ListingField::Price));
        let _ = writeln!(out, "{}", listing.price);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}{}",
            "Description".bold(),
            copied(ListingField::Description)
        );
        let _ = writeln!(out, "{}", listing.description.to_plain_text());
        if !listing.tags.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}{}", "Tags".bold(), copied(ListingField::Tags));
            let _ = writeln!(out, "{}", listing.tags.join(", "));
        }
        if self
            .copy
            .is_copied(self.active, ListingField::FullListing, now)
        {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", "✓ Full listing copied".green());
        }

        out
    }
}
