//! Test Helpers

use investomart::{
    catalog::{CatalogItem, ItemId, LivestockListing, ProductListing},
    session::{AuthToken, Session, UserProfile},
};
use rust_decimal::Decimal;

use crate::test::{TEST_EMAIL, TEST_TOKEN};

pub(crate) fn user() -> UserProfile {
    UserProfile {
        id: 7,
        username: "sita".to_string(),
        email: TEST_EMAIL.to_string(),
        name: "Sita Sharma".to_string(),
        is_superuser: false,
        is_staff: false,
        kyc_status: Some("pending".to_string()),
        is_email_verified: true,
    }
}

pub(crate) fn session() -> Session {
    Session::new(user(), AuthToken::new(TEST_TOKEN))
}

pub(crate) fn product(id: &str, price: i64, available_quantity: u32) -> CatalogItem {
    CatalogItem::Product(ProductListing {
        id: ItemId::from(id),
        title: format!("Product {id}"),
        category: "feed".to_string(),
        price: Decimal::from(price),
        available_quantity,
        description: String::new(),
        image_url: String::new(),
        status: Some("active".to_string()),
        location: None,
        seller_id: None,
        base_price: None,
        roi_estimate: None,
        risk_level: None,
        animal_details: None,
    })
}

pub(crate) fn livestock(id: &str, price: i64) -> CatalogItem {
    CatalogItem::Livestock(LivestockListing {
        id: ItemId::from(id),
        title: format!("Animal {id}"),
        category: "goat".to_string(),
        price: Decimal::from(price),
        available_quantity: 1,
        description: String::new(),
        breed: None,
        age_months: None,
        weight: None,
        health_status: None,
        gender: None,
        tag_number: None,
        farm_id: None,
        owner_id: None,
        status: None,
    })
}
