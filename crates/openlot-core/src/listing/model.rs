//! Listing domain model.
//!
//! A listing is a vehicle record as the catalog service reports it. From
//! the client's perspective listings are immutable: they only change
//! through explicit user action routed via the mutation controller, and
//! the server's accepted representation always wins after a round trip.

use serde::{Deserialize, Serialize};

/// A media reference attached to a listing, discriminated by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaRef {
    Image { url: String },
    Video { url: String },
}

impl MediaRef {
    /// The URL behind this media reference, regardless of kind.
    pub fn url(&self) -> &str {
        match self {
            Self::Image { url } | Self::Video { url } => url,
        }
    }
}

/// Optional specification bag observed on some listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specs {
    #[serde(default)]
    pub body_style: Option<String>,
    #[serde(default)]
    pub horsepower: Option<u32>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub fuel_economy: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// A vehicle record in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Server-assigned numeric identity
    pub id: u64,
    pub make: String,
    pub model: String,
    pub year: u32,
    pub price: f64,
    /// Currency code the price is denominated in
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub specs: Option<Specs>,
    /// Odometer reading, when reported
    #[serde(default)]
    pub mileage: Option<u64>,
    /// Identity that owns this listing, when it is a user listing
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

/// The user-editable portion of a listing, sent on create/update.
///
/// The server assigns `id` (and may normalize fields such as price), which
/// is why creation is always followed by a fresh list pull rather than
/// trusting the optimistic local copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub make: String,
    pub model: String,
    pub year: u32,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub specs: Option<Specs>,
    #[serde(default)]
    pub mileage: Option<u64>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ListingDraft {
    /// Builds a provisional listing from this draft for optimistic display.
    ///
    /// The provisional identity is 0, which the server never assigns; it is
    /// replaced by the post-create refresh.
    pub fn into_provisional(self, owner_id: Option<String>) -> Listing {
        Listing {
            id: 0,
            make: self.make,
            model: self.model,
            year: self.year,
            price: self.price,
            currency: self.currency,
            media: self.media,
            specs: self.specs,
            mileage: self.mileage,
            owner_id,
            rating: None,
            category: self.category,
        }
    }

    /// Overlays this draft onto an existing listing, keeping server-owned
    /// fields (identity, owner, rating) untouched.
    pub fn apply_to(&self, listing: &mut Listing) {
        listing.make = self.make.clone();
        listing.model = self.model.clone();
        listing.year = self.year;
        listing.price = self.price;
        listing.currency = self.currency.clone();
        listing.media = self.media.clone();
        listing.specs = self.specs.clone();
        listing.mileage = self.mileage;
        listing.category = self.category.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_ref_is_kind_discriminated() {
        let json = r#"{"kind":"image","url":"https://cdn.example/1.jpg"}"#;
        let media: MediaRef = serde_json::from_str(json).unwrap();
        assert_eq!(
            media,
            MediaRef::Image {
                url: "https://cdn.example/1.jpg".to_string()
            }
        );
    }

    #[test]
    fn listing_defaults_fill_missing_fields() {
        let json = r#"{"id":7,"make":"Honda","model":"Civic","year":2020,"price":18500.0}"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.currency, "USD");
        assert!(listing.media.is_empty());
        assert!(listing.specs.is_none());
    }

    #[test]
    fn draft_overlay_preserves_server_owned_fields() {
        let mut listing = Listing {
            id: 42,
            make: "Honda".into(),
            model: "Civic".into(),
            year: 2020,
            price: 18500.0,
            currency: "USD".into(),
            media: vec![],
            specs: None,
            mileage: Some(30_000),
            owner_id: Some("u-1".into()),
            rating: Some(4.5),
            category: None,
        };
        let draft = ListingDraft {
            make: "Honda".into(),
            model: "Civic".into(),
            year: 2021,
            price: 19000.0,
            currency: "USD".into(),
            ..Default::default()
        };
        draft.apply_to(&mut listing);
        assert_eq!(listing.year, 2021);
        assert_eq!(listing.id, 42);
        assert_eq!(listing.owner_id.as_deref(), Some("u-1"));
        assert_eq!(listing.rating, Some(4.5));
    }
}
