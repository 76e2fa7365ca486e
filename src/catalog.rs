//! Catalog

use std::fmt::{self, Display, Formatter};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identity of a catalog entry, as issued by the backend.
///
/// Products and livestock share one identity space in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an item id from a backend identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A product listing such as feed, produce, or equipment.
    Product,

    /// An individual animal.
    Livestock,
}

impl ItemKind {
    /// Wire name of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Livestock => "livestock",
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListing {
    /// Listing identity
    pub id: ItemId,

    /// Display title
    pub title: String,

    /// Category, e.g. `goat` or `feed`
    #[serde(default)]
    pub category: String,

    /// Unit price
    pub price: Decimal,

    /// Units the seller still has on offer
    #[serde(default = "one")]
    pub available_quantity: u32,

    /// Free-text description (truncated in search results)
    #[serde(default)]
    pub description: String,

    /// Listing image
    #[serde(default)]
    pub image_url: String,

    /// Listing status, e.g. `active`, `reserved` or `sold`
    #[serde(default)]
    pub status: Option<String>,

    /// Where the listing is located
    #[serde(default)]
    pub location: Option<String>,

    /// Seller account id
    #[serde(default)]
    pub seller_id: Option<String>,

    /// Price before market adjustments
    #[serde(default)]
    pub base_price: Option<Decimal>,

    /// Seller-provided return estimate
    #[serde(default)]
    pub roi_estimate: Option<Decimal>,

    /// Seller-provided risk level
    #[serde(default)]
    pub risk_level: Option<String>,

    /// Animal the listing is backed by, when there is one
    #[serde(default)]
    pub animal_details: Option<AnimalDetails>,
}

/// Attributes of the animal behind a product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalDetails {
    /// Breed
    #[serde(default)]
    pub breed: Option<String>,

    /// Age in months
    #[serde(default)]
    pub age_months: Option<u32>,

    /// Current weight in kilograms
    #[serde(default)]
    pub weight: Option<Decimal>,

    /// Latest recorded health status
    #[serde(default)]
    pub health_status: Option<String>,

    /// Sex of the animal
    #[serde(default)]
    pub gender: Option<String>,
}

/// A single animal offered for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivestockListing {
    /// Animal identity
    pub id: ItemId,

    /// Display title, e.g. `Kali (Goat)`
    pub title: String,

    /// Species, e.g. `goat`, `chicken`, `buffalo`
    #[serde(default)]
    pub category: String,

    /// Asking price
    pub price: Decimal,

    /// Always one for an individual animal
    #[serde(default = "one")]
    pub available_quantity: u32,

    /// Summary line
    #[serde(default)]
    pub description: String,

    /// Breed
    #[serde(default)]
    pub breed: Option<String>,

    /// Age in months
    #[serde(default)]
    pub age_months: Option<u32>,

    /// Current weight in kilograms
    #[serde(default)]
    pub weight: Option<Decimal>,

    /// Latest recorded health status
    #[serde(default)]
    pub health_status: Option<String>,

    /// Sex of the animal
    #[serde(default)]
    pub gender: Option<String>,

    /// Ear tag
    #[serde(default)]
    pub tag_number: Option<String>,

    /// Farm the animal is kept on
    #[serde(default)]
    pub farm_id: Option<String>,

    /// Current owner
    #[serde(default)]
    pub owner_id: Option<String>,

    /// Listing status
    #[serde(default)]
    pub status: Option<String>,
}

/// An entry returned by catalog search, explore, or detail lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogItem {
    /// A product listing
    Product(ProductListing),

    /// An individual animal
    Livestock(LivestockListing),
}

impl CatalogItem {
    /// Identity of the entry.
    pub fn id(&self) -> &ItemId {
        match self {
            Self::Product(product) => &product.id,
            Self::Livestock(animal) => &animal.id,
        }
    }

    /// Kind of the entry.
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Product(_) => ItemKind::Product,
            Self::Livestock(_) => ItemKind::Livestock,
        }
    }

    /// Display title.
    pub fn title(&self) -> &str {
        match self {
            Self::Product(product) => &product.title,
            Self::Livestock(animal) => &animal.title,
        }
    }

    /// Category or species.
    pub fn category(&self) -> &str {
        match self {
            Self::Product(product) => &product.category,
            Self::Livestock(animal) => &animal.category,
        }
    }

    /// Unit price.
    pub fn price(&self) -> Decimal {
        match self {
            Self::Product(product) => product.price,
            Self::Livestock(animal) => animal.price,
        }
    }

    /// Upper bound on how many units can be bought. Never below one.
    pub fn available_quantity(&self) -> u32 {
        let available = match self {
            Self::Product(product) => product.available_quantity,
            Self::Livestock(animal) => animal.available_quantity,
        };

        available.max(1)
    }

    /// Short description.
    pub fn description(&self) -> &str {
        match self {
            Self::Product(product) => &product.description,
            Self::Livestock(animal) => &animal.description,
        }
    }
}

const fn one() -> u32 {
    1
}


#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn product_deserializes_from_search_result() -> TestResult {
        let item: CatalogItem = serde_json::from_str(
            r#"{
                "id": "PRD-1",
                "type": "product",
                "title": "Goat feed",
                "description": "Mixed grain...",
                "price": 1250.5,
                "available_quantity": 4,
                "image_url": "",
                "category": "feed",
                "url": "/product/PRD-1"
            }"#,
        )?;

        assert_eq!(item.kind(), ItemKind::Product);
        assert_eq!(item.id(), &ItemId::from("PRD-1"));
        assert_eq!(item.price(), Decimal::new(12505, 1));
        assert_eq!(item.available_quantity(), 4);

        Ok(())
    }

    #[test]
    fn livestock_defaults_to_single_unit() -> TestResult {
        let item: CatalogItem = serde_json::from_str(
            r#"{
                "id": "ANM-7",
                "type": "livestock",
                "title": "Kali (Goat)",
                "price": 18000,
                "category": "goat",
                "breed": "Khari"
            }"#,
        )?;

        let CatalogItem::Livestock(animal) = &item else {
            return Err("expected livestock".into());
        };

        assert_eq!(animal.breed.as_deref(), Some("Khari"));
        assert_eq!(item.available_quantity(), 1);

        Ok(())
    }

    #[test]
    fn zero_availability_is_treated_as_one() -> TestResult {
        let item: CatalogItem = serde_json::from_str(
            r#"{"id": "PRD-2", "type": "product", "title": "Hay", "price": 10, "available_quantity": 0}"#,
        )?;

        assert_eq!(item.available_quantity(), 1);

        Ok(())
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = serde_json::from_str::<CatalogItem>(
            r#"{"id": "X", "type": "service", "title": "Vet visit", "price": 10}"#,
        );

        assert!(result.is_err(), "unknown item types must not deserialize");
    }
}
