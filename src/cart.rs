//! Cart

use rust_decimal::Decimal;

use crate::catalog::{CatalogItem, ItemId, ItemKind};

/// One catalog entry in the cart.
///
/// The quantity is always within `1..=available_quantity`.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    id: ItemId,
    title: String,
    category: String,
    price: Decimal,
    quantity: u32,
    available_quantity: u32,
    kind: ItemKind,
}

impl CartLine {
    fn from_item(item: &CatalogItem) -> Self {
        Self {
            id: item.id().clone(),
            title: item.title().to_string(),
            category: item.category().to_string(),
            price: item.price(),
            quantity: 1,
            available_quantity: item.available_quantity(),
            kind: item.kind(),
        }
    }

    /// Identity of the catalog entry.
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// Display title captured when the line was created.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Category captured when the line was created.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Unit price.
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Units in the cart.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Upper bound on the quantity.
    pub fn available_quantity(&self) -> u32 {
        self.available_quantity
    }

    /// Product or livestock.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// `price * quantity`
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    fn set_quantity(&mut self, quantity: i64) {
        let clamped = quantity.clamp(1, i64::from(self.available_quantity));

        self.quantity = u32::try_from(clamped).unwrap_or(self.available_quantity);
    }
}

/// In-memory shopping cart.
///
/// Lines keep the order in which they were first added. Mutations never fail;
/// quantities outside the allowed range are clamped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a catalog item.
    ///
    /// A new line starts at quantity one. For an item already in the cart the
    /// quantity is incremented, and capped at the availability reported by `item`.
    pub fn add_item(&mut self, item: &CatalogItem) {
        match self.line_mut(item.id()) {
            Some(line) => {
                line.available_quantity = item.available_quantity();
                line.set_quantity(i64::from(line.quantity) + 1);
            }
            None => self.lines.push(CartLine::from_item(item)),
        }
    }

    /// Adjust the quantity of a line by `delta`, clamped to `1..=available_quantity`.
    ///
    /// Does nothing if the item is not in the cart.
    pub fn update_quantity(&mut self, id: &ItemId, delta: i32) {
        if let Some(line) = self.line_mut(id) {
            line.set_quantity(i64::from(line.quantity) + i64::from(delta));
        }
    }

    /// Remove a line regardless of its quantity.
    pub fn remove_item(&mut self, id: &ItemId) {
        self.lines.retain(|line| &line.id != id);
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of `price * quantity` over all lines.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities over all lines, for the badge count.
    pub fn count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// All lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up a single line.
    pub fn line(&self, id: &ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn line_mut(&mut self, id: &ItemId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| &line.id == id)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::catalog::fixtures::{livestock, product};

    use super::*;

    #[test]
    fn new_cart_is_empty() {
        let cart = Cart::new();

        assert!(cart.is_empty());
        assert_eq!(cart.count(), 0);
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn add_item_inserts_line_with_quantity_one() {
        let mut cart = Cart::new();

        cart.add_item(&product("p1", 100, 5));

        let line = cart.line(&ItemId::from("p1"));

        assert_eq!(line.map(CartLine::quantity), Some(1));
        assert_eq!(line.map(CartLine::kind), Some(ItemKind::Product));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn add_existing_item_increments_quantity() {
        let mut cart = Cart::new();
        let item = product("p1", 100, 5);

        cart.add_item(&item);
        cart.add_item(&item);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.count(), 2);
    }

    #[test]
    fn add_beyond_availability_is_capped() {
        let mut cart = Cart::new();
        let item = product("p1", 100, 2);

        for _ in 0..5 {
            cart.add_item(&item);
        }

        assert_eq!(cart.count(), 2);
    }

    #[test]
    fn re_add_with_lower_availability_lowers_quantity() {
        let mut cart = Cart::new();

        for _ in 0..4 {
            cart.add_item(&product("p1", 100, 5));
        }

        cart.add_item(&product("p1", 100, 2));

        let line = cart.line(&ItemId::from("p1"));

        assert_eq!(line.map(CartLine::quantity), Some(2));
        assert_eq!(line.map(CartLine::available_quantity), Some(2));
    }

    #[test]
    fn update_quantity_caps_livestock_at_availability() {
        let mut cart = Cart::new();
        let id = ItemId::from("a1");

        cart.add_item(&livestock("a1", 18_000, 3));

        for _ in 0..3 {
            cart.update_quantity(&id, 1);
        }

        assert_eq!(cart.line(&id).map(CartLine::quantity), Some(3));
    }

    #[test]
    fn update_quantity_never_drops_below_one() {
        let mut cart = Cart::new();
        let id = ItemId::from("p1");

        cart.add_item(&product("p1", 100, 5));
        cart.update_quantity(&id, -1);
        cart.update_quantity(&id, -10);

        assert_eq!(cart.line(&id).map(CartLine::quantity), Some(1));
    }

    #[test]
    fn update_quantity_of_unknown_item_is_noop() {
        let mut cart = Cart::new();

        cart.add_item(&product("p1", 100, 5));
        cart.update_quantity(&ItemId::from("missing"), 1);

        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn remove_then_add_resets_quantity() {
        let mut cart = Cart::new();
        let item = product("p1", 100, 5);
        let id = ItemId::from("p1");

        cart.add_item(&item);
        cart.update_quantity(&id, 3);
        cart.remove_item(&id);

        assert!(cart.line(&id).is_none());

        cart.add_item(&item);

        assert_eq!(cart.line(&id).map(CartLine::quantity), Some(1));
    }

    #[test]
    fn remove_unknown_item_is_noop() {
        let mut cart = Cart::new();

        cart.add_item(&product("p1", 100, 5));
        cart.remove_item(&ItemId::from("p2"));

        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn total_sums_price_times_quantity() {
        let mut cart = Cart::new();

        cart.add_item(&product("p1", 250, 5));
        cart.add_item(&product("p1", 250, 5));
        cart.add_item(&livestock("a1", 18_000, 1));

        assert_eq!(cart.total(), Decimal::from(18_500));
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn clear_empties_cart() {
        let mut cart = Cart::new();

        cart.add_item(&product("p1", 250, 5));
        cart.add_item(&livestock("a1", 18_000, 1));
        cart.clear();

        assert_eq!(cart.count(), 0);
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn lines_keep_insertion_order() {
        let mut cart = Cart::new();

        cart.add_item(&product("p2", 1, 5));
        cart.add_item(&product("p1", 1, 5));
        cart.add_item(&product("p2", 1, 5));

        let ids: Vec<&str> = cart.lines().iter().map(|line| line.id().as_str()).collect();

        assert_eq!(ids, ["p2", "p1"]);
    }
}
