//! Checkout totals over the fixture catalog.

use rust_decimal::Decimal;
use testresult::TestResult;

use investomart::{
    cart::Cart,
    catalog::{CatalogItem, ItemKind},
    checkout::{OrderSummary, PaymentMethod, PaymentRequest},
};

fn catalog() -> Result<Vec<CatalogItem>, serde_norway::Error> {
    serde_norway::from_str(include_str!("fixtures/catalog.yaml"))
}

#[test]
fn mixed_cart_checkout() -> TestResult {
    let catalog = catalog()?;
    let mut cart = Cart::new();

    for item in &catalog {
        cart.add_item(item);
    }

    let feed = catalog.first().ok_or("empty catalog")?;

    cart.update_quantity(feed.id(), 1);

    // 2 x 1250.50 + 450 + 18000 + 145000
    let summary = OrderSummary::from_cart(&cart);

    assert_eq!(summary.subtotal, Decimal::new(16_595_100, 2));
    assert_eq!(summary.platform_fee, Decimal::new(829_755, 2));
    assert_eq!(summary.total, summary.subtotal + summary.platform_fee);

    let request = PaymentRequest::from_cart(&cart, PaymentMethod::Card)?;

    assert_eq!(request.amount, summary.total);
    assert_eq!(
        request
            .items
            .iter()
            .filter(|line| line.item_type == ItemKind::Livestock)
            .count(),
        2
    );

    Ok(())
}

#[test]
fn livestock_weight_accepts_string_values() -> TestResult {
    let catalog = catalog()?;

    let Some(CatalogItem::Livestock(goat)) = catalog.get(2) else {
        return Err("expected the goat fixture".into());
    };

    assert_eq!(goat.weight, Some(Decimal::new(385, 1)));
    assert_eq!(goat.available_quantity, 1);

    Ok(())
}
