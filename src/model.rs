//! Listing payload types
//!
//! Every field carries an explicit wire name. The thumbnail key (`184x184`)
//! is not identifier-shaped, so no naming convention could produce it; the
//! rest are spelled out the same way to keep the mapping in one place.

use serde::{Deserialize, Deserializer};

/// Top-level listing document: `{ "data": [ ... ] }`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListingEnvelope {
    #[serde(rename = "data")]
    pub items: Vec<Item>,
}

impl ListingEnvelope {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Thumbnail URLs of every item that has a photo, in listing order.
    pub fn thumbnail_urls(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .filter_map(|item| item.photo.as_ref())
            .map(|photo| photo.thumbnail.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Item {
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "uuid")]
    pub id: String,
    #[serde(rename = "serves_cuisine")]
    pub category: String,
    #[serde(rename = "price_range")]
    pub price_tier: i64,
    #[serde(rename = "address")]
    pub location: Location,
    #[serde(rename = "aggregate_ratings", deserialize_with = "rating_from_aggregate")]
    pub rating: Rating,
    #[serde(rename = "best_offer")]
    pub offer: Offer,
    #[serde(rename = "main_photo", default)]
    pub photo: Option<Photo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    #[serde(rename = "street")]
    pub street: String,
    #[serde(rename = "locality")]
    pub locality: String,
    #[serde(rename = "country")]
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Rating {
    #[serde(rename = "rating_value")]
    pub value: f64,
    #[serde(rename = "review_count")]
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Offer {
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "label")]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Photo {
    #[serde(rename = "source")]
    pub source: String,
    #[serde(rename = "184x184")]
    pub thumbnail: String,
}

/// Ratings arrive nested per provider; only the `tripadvisor` block is used.
fn rating_from_aggregate<'de, D>(deserializer: D) -> Result<Rating, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Aggregate {
        #[serde(rename = "tripadvisor")]
        tripadvisor: Rating,
    }

    Aggregate::deserialize(deserializer).map(|aggregate| aggregate.tripadvisor)
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// One-item listing matching the wire format.
    pub const SINGLE_ITEM_LISTING: &str = r#"{
        "data": [
            {
                "name": "Test Bistro",
                "uuid": "6f1c2a9e-0b43-4b8e-9c57-1d2f3a4b5c6d",
                "serves_cuisine": "French",
                "price_range": 35,
                "address": {
                    "street": "12 Rue de la Paix",
                    "locality": "Paris",
                    "country": "France"
                },
                "aggregate_ratings": {
                    "thefork": { "rating_value": 9.1, "review_count": 310 },
                    "tripadvisor": { "rating_value": 4.5, "review_count": 120 }
                },
                "best_offer": { "name": "-30% on the menu", "label": "-30%" },
                "main_photo": {
                    "source": "https://img.example.com/bistro/full.jpg",
                    "184x184": "https://img.example.com/bistro/184.jpg",
                    "612x344": "https://img.example.com/bistro/612.jpg"
                }
            }
        ]
    }"#;
}
