//! Shopping cart state machine.
//!
//! A [`CartState`] is an ordered list of [`CartLineItem`]s plus two derived
//! figures, the total and the item count. The state changes only through the
//! four [`CartAction`]s (add, remove, set quantity, clear); each transition
//! recomputes the derived figures from the items, so they can never drift
//! from a fresh recomputation.
//!
//! ```
//! use savron_core::cart::{CartAction, CartItemInput, CartState};
//! use savron_core::{Money, ProductId};
//!
//! let truffle = CartItemInput {
//!     id: ProductId::new("1"),
//!     name: "Dark Truffle".to_string(),
//!     price: Money::from(45),
//!     image: String::new(),
//!     description: String::new(),
//!     in_stock: true,
//! };
//!
//! let cart = CartState::new()
//!     .apply(CartAction::Add { item: truffle.clone(), quantity: 1 })
//!     .apply(CartAction::Add { item: truffle, quantity: 2 });
//!
//! assert_eq!(cart.items().len(), 1);
//! assert_eq!(cart.item_count(), 3);
//! assert_eq!(cart.total(), Money::from(135));
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{Money, Product, ProductId};

/// A line-item descriptor without a quantity, as handed to [`CartAction::Add`].
///
/// This is a snapshot of the product taken when it is added; later changes to
/// the product never reach the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub image: String,
    pub description: String,
    pub in_stock: bool,
}

impl From<&Product> for CartItemInput {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.primary_image().unwrap_or_default().to_owned(),
            description: product.description.clone(),
            in_stock: product.in_stock,
        }
    }
}

/// One product entry in the cart.
///
/// `quantity` is always at least 1 while the item is in a [`CartState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub image: String,
    pub description: String,
    pub in_stock: bool,
}

impl CartLineItem {
    fn from_input(item: CartItemInput, quantity: u32) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            quantity,
            image: item.image,
            description: item.description,
            in_stock: item.in_stock,
        }
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

/// A transition of the cart state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Append the item, or add to the quantity of the entry with the same id.
    Add { item: CartItemInput, quantity: u32 },
    /// Drop the entry with this id, if any.
    Remove(ProductId),
    /// Replace the quantity of an entry; zero or below removes it.
    SetQuantity { id: ProductId, quantity: i64 },
    /// Empty the cart.
    Clear,
}

/// The cart: ordered line items plus their derived total and count.
///
/// Deserialization only reads `items` and recomputes everything else, so a
/// cart restored from the session cannot carry stale totals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredCart")]
pub struct CartState {
    items: Vec<CartLineItem>,
    total: Money,
    item_count: u32,
}

#[derive(Deserialize)]
struct StoredCart {
    #[serde(default)]
    items: Vec<CartLineItem>,
}

impl From<StoredCart> for CartState {
    fn from(stored: StoredCart) -> Self {
        Self::load(stored.items)
    }
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from previously stored items.
    ///
    /// Entries sharing an id are merged additively in first-seen order and
    /// entries with a zero quantity are dropped.
    #[must_use]
    pub fn load(items: Vec<CartLineItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            let quantity = item.quantity;
            let input = CartItemInput {
                id: item.id,
                name: item.name,
                price: item.price,
                image: item.image,
                description: item.description,
                in_stock: item.in_stock,
            };
            cart.add_item(input, quantity);
        }
        cart
    }

    /// Apply one action and return the resulting state.
    #[must_use]
    pub fn apply(mut self, action: CartAction) -> Self {
        match action {
            CartAction::Add { item, quantity } => self.add_item(item, quantity),
            CartAction::Remove(id) => self.remove_item(&id),
            CartAction::SetQuantity { id, quantity } => self.set_quantity(&id, quantity),
            CartAction::Clear => self.clear(),
        }
        self
    }

    /// Add `quantity` of an item.
    ///
    /// An existing entry keeps the name, price and description it was first
    /// added with; only its quantity grows. A quantity of zero changes nothing.
    pub fn add_item(&mut self, item: CartItemInput, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.items.push(CartLineItem::from_input(item, quantity)),
        }
        self.refresh();
    }

    /// Remove the entry with `id`. Absent ids are a no-op.
    pub fn remove_item(&mut self, id: &ProductId) {
        self.items.retain(|line| &line.id != id);
        self.refresh();
    }

    /// Set the quantity of the entry with `id`.
    ///
    /// A quantity of zero or below is the same as [`Self::remove_item`].
    /// Absent ids are a no-op.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.items.iter_mut().find(|line| &line.id == id) {
            line.quantity = quantity;
        }
        self.refresh();
    }

    /// Reset to the empty cart.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Take paid lines out of a cart that may have changed since payment
    /// started.
    ///
    /// Each paid line lowers the matching entry by the quantity paid for and
    /// entries that reach zero are dropped. Items added in the meantime stay.
    #[must_use]
    pub fn settle(mut self, paid: &[CartLineItem]) -> Self {
        for line in paid {
            if let Some(current) = self.get(&line.id).map(|entry| entry.quantity) {
                self.set_quantity(&line.id, i64::from(current) - i64::from(line.quantity));
            }
        }
        self
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Sum of line totals.
    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }

    /// Sum of quantities.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        self.item_count
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the entry for a product.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|line| &line.id == id)
    }

    fn refresh(&mut self) {
        self.total = self.items.iter().map(CartLineItem::line_total).sum();
        self.item_count = self
            .items
            .iter()
            .fold(0u32, |count, line| count.saturating_add(line.quantity));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, name: &str, price: i64) -> CartItemInput {
        CartItemInput {
            id: ProductId::new(id),
            name: name.to_string(),
            price: Money::from(price),
            image: format!("/{id}.jpg"),
            description: format!("{name} description"),
            in_stock: true,
        }
    }

    fn two_item_cart() -> CartState {
        CartState::new()
            .apply(CartAction::Add {
                item: item("1", "Dark Truffle", 45),
                quantity: 1,
            })
            .apply(CartAction::Add {
                item: item("2", "Milk Bar", 38),
                quantity: 2,
            })
    }

    #[test]
    fn test_add_same_id_accumulates() {
        let cart = CartState::new()
            .apply(CartAction::Add {
                item: item("1", "Dark Truffle", 45),
                quantity: 1,
            })
            .apply(CartAction::Add {
                item: item("1", "Dark Truffle", 45),
                quantity: 2,
            });

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.get(&ProductId::new("1")).unwrap().quantity, 3);
        assert_eq!(cart.total(), Money::from(135));
    }

    #[test]
    fn test_add_keeps_original_snapshot() {
        let cart = CartState::new()
            .apply(CartAction::Add {
                item: item("1", "Dark Truffle", 45),
                quantity: 1,
            })
            .apply(CartAction::Add {
                item: item("1", "Renamed Truffle", 99),
                quantity: 1,
            });

        let line = cart.get(&ProductId::new("1")).unwrap();
        assert_eq!(line.name, "Dark Truffle");
        assert_eq!(line.price, Money::from(45));
        assert_eq!(cart.total(), Money::from(90));
    }

    #[test]
    fn test_add_appends_in_order() {
        let cart = two_item_cart().apply(CartAction::Add {
            item: item("3", "White Bonbon", 10),
            quantity: 1,
        });
        let ids: Vec<&str> = cart.items().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let cart = two_item_cart();
        let after = cart.clone().apply(CartAction::Add {
            item: item("9", "Ghost", 1),
            quantity: 0,
        });
        assert_eq!(after, cart);
    }

    #[test]
    fn test_two_items_totals() {
        let cart = two_item_cart();
        assert_eq!(cart.total(), Money::from(121));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let cart = two_item_cart().apply(CartAction::SetQuantity {
            id: ProductId::new("2"),
            quantity: 0,
        });
        assert!(cart.get(&ProductId::new("2")).is_none());
        assert_eq!(cart.total(), Money::from(45));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_set_quantity_negative_matches_remove() {
        let removed = two_item_cart().apply(CartAction::Remove(ProductId::new("1")));
        let set = two_item_cart().apply(CartAction::SetQuantity {
            id: ProductId::new("1"),
            quantity: -4,
        });
        assert_eq!(removed, set);
    }

    #[test]
    fn test_set_quantity_replaces() {
        let cart = two_item_cart().apply(CartAction::SetQuantity {
            id: ProductId::new("1"),
            quantity: 5,
        });
        assert_eq!(cart.get(&ProductId::new("1")).unwrap().quantity, 5);
        assert_eq!(cart.total(), Money::from(5 * 45 + 2 * 38));
        assert_eq!(cart.item_count(), 7);
    }

    #[test]
    fn test_set_quantity_unknown_is_noop() {
        let cart = two_item_cart();
        let after = cart.clone().apply(CartAction::SetQuantity {
            id: ProductId::new("missing"),
            quantity: 3,
        });
        assert_eq!(after, cart);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let cart = two_item_cart();
        let after = cart.clone().apply(CartAction::Remove(ProductId::new("missing")));
        assert_eq!(after, cart);
    }

    #[test]
    fn test_clear() {
        let cart = two_item_cart().apply(CartAction::Clear);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(two_item_cart()).unwrap();
        assert_eq!(json["itemCount"], 3);
        assert_eq!(json["total"], "121.00");
        assert_eq!(json["items"][1]["inStock"], true);
    }

    #[test]
    fn test_deserialize_recomputes_totals() {
        let json = r#"{
            "items": [
                {"id": "1", "name": "Dark Truffle", "price": 45, "quantity": 1,
                 "image": "", "description": "", "inStock": true},
                {"id": "1", "name": "Dark Truffle", "price": 45, "quantity": 1,
                 "image": "", "description": "", "inStock": true},
                {"id": "2", "name": "Milk Bar", "price": 38, "quantity": 0,
                 "image": "", "description": "", "inStock": true}
            ],
            "total": "9999",
            "itemCount": 42
        }"#;
        let cart: CartState = serde_json::from_str(json).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), Money::from(90));
    }

    #[test]
    fn test_snapshot_from_product() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "default-1",
            "name": "Premium Dark Chocolate Truffles Collection",
            "description": "Truffles",
            "price": 3849,
            "category": "Dark Chocolate",
            "images": ["/truffles.jpg", "/box.jpg"]
        }))
        .unwrap();
        let input = CartItemInput::from(&product);
        assert_eq!(input.image, "/truffles.jpg");
        assert!(input.in_stock);
    }

    #[test]
    fn test_settle_keeps_items_added_after_payment() {
        let paid = two_item_cart();
        let current = paid
            .clone()
            .apply(CartAction::Add {
                item: item("2", "Milk Bar", 38),
                quantity: 1,
            })
            .apply(CartAction::Add {
                item: item("3", "Praline Box", 60),
                quantity: 1,
            });

        let settled = current.settle(paid.items());

        assert!(settled.get(&ProductId::new("1")).is_none());
        assert_eq!(settled.get(&ProductId::new("2")).unwrap().quantity, 1);
        assert_eq!(settled.get(&ProductId::new("3")).unwrap().quantity, 1);
        assert_eq!(settled.item_count(), 2);
        assert_eq!(settled.total(), Money::from(98));
    }

    #[test]
    fn test_settle_unchanged_cart_is_empty() {
        let paid = two_item_cart();
        let settled = paid.clone().settle(paid.items());
        assert_eq!(settled, CartState::new());
    }

    #[test]
    fn test_settle_ignores_lines_removed_meanwhile() {
        let paid = two_item_cart();
        let current = paid.clone().apply(CartAction::Remove(ProductId::new("1")));

        let settled = current.settle(paid.items());
        assert!(settled.is_empty());
        assert_eq!(settled.total(), Money::ZERO);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod property_tests {
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use super::*;
    use crate::checkout::{ShippingMethod, compute_quote};

    fn priced(id: &str, price: Money) -> CartItemInput {
        CartItemInput {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price,
            image: String::new(),
            description: String::new(),
            in_stock: true,
        }
    }

    #[test]
    fn test_overflowing_line_total_saturates() {
        let price = Money::new("40000000000000000000000000000".parse::<Decimal>().unwrap());
        let cart = CartState::new().apply(CartAction::Add {
            item: priced("1", price),
            quantity: 2,
        });

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), Money::new(Decimal::MAX));
        let quote = compute_quote(&cart, ShippingMethod::Overnight, true);
        assert_eq!(quote.total, Money::new(Decimal::MAX));
    }

    fn arbitrary_action() -> impl Strategy<Value = CartAction> {
        let id = (1u8..5).prop_map(|n| ProductId::new(n.to_string()));
        prop_oneof![
            (id.clone(), 1i64..500, 0u32..6).prop_map(|(id, cents, quantity)| CartAction::Add {
                item: CartItemInput {
                    name: format!("Product {id}"),
                    id,
                    price: Money::from_cents(cents),
                    image: String::new(),
                    description: String::new(),
                    in_stock: true,
                },
                quantity,
            }),
            id.clone().prop_map(CartAction::Remove),
            (id, -3i64..6).prop_map(|(id, quantity)| CartAction::SetQuantity { id, quantity }),
            Just(CartAction::Clear),
        ]
    }

    fn assert_consistent(cart: &CartState) -> Result<(), TestCaseError> {
        let total: Money = cart.items().iter().map(|l| l.price * l.quantity).sum();
        let count: u32 = cart.items().iter().map(|l| l.quantity).sum();
        prop_assert_eq!(cart.total(), total);
        prop_assert_eq!(cart.item_count(), count);
        prop_assert!(cart.items().iter().all(|l| l.quantity >= 1));
        let mut ids: Vec<&ProductId> = cart.items().iter().map(|l| &l.id).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), cart.items().len());
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_derived_fields_never_diverge(
            actions in prop::collection::vec(arbitrary_action(), 0..40)
        ) {
            let mut cart = CartState::new();
            for action in actions {
                cart = cart.apply(action);
                assert_consistent(&cart)?;
            }
        }

        #[test]
        fn prop_repeated_adds_sum_quantities(
            quantities in prop::collection::vec(1u32..10, 1..15)
        ) {
            let input = CartItemInput {
                id: ProductId::new("1"),
                name: "Dark Truffle".to_string(),
                price: Money::from(45),
                image: String::new(),
                description: String::new(),
                in_stock: true,
            };
            let mut cart = CartState::new();
            for &quantity in &quantities {
                cart = cart.apply(CartAction::Add { item: input.clone(), quantity });
            }
            prop_assert_eq!(cart.items().len(), 1);
            prop_assert_eq!(cart.item_count(), quantities.iter().sum::<u32>());
        }

        #[test]
        fn prop_non_positive_set_quantity_is_remove(
            actions in prop::collection::vec(arbitrary_action(), 0..20),
            target in 1u8..7,
            quantity in -5i64..=0
        ) {
            let mut cart = CartState::new();
            for action in actions {
                cart = cart.apply(action);
            }
            let id = ProductId::new(target.to_string());
            let removed = cart.clone().apply(CartAction::Remove(id.clone()));
            let set = cart.apply(CartAction::SetQuantity { id, quantity });
            prop_assert_eq!(removed, set);
        }

        #[test]
        fn prop_clear_always_empty(
            actions in prop::collection::vec(arbitrary_action(), 0..20)
        ) {
            let mut cart = CartState::new();
            for action in actions {
                cart = cart.apply(action);
            }
            let cleared = cart.apply(CartAction::Clear);
            prop_assert_eq!(cleared, CartState::new());
        }

        #[test]
        fn prop_huge_prices_never_panic(
            lines in prop::collection::vec(
                (any::<u32>(), any::<u32>(), any::<u32>(), 0u32..=28, 1u32..=u32::MAX),
                1..6
            ),
            method in prop_oneof![
                Just(ShippingMethod::Standard),
                Just(ShippingMethod::Express),
                Just(ShippingMethod::Overnight),
            ],
            gift_wrap in any::<bool>()
        ) {
            let mut cart = CartState::new();
            for (i, (lo, mid, hi, scale, quantity)) in lines.into_iter().enumerate() {
                let item = priced(&i.to_string(), Money::new(Decimal::from_parts(lo, mid, hi, false, scale)));
                cart = cart
                    .apply(CartAction::Add { item: item.clone(), quantity })
                    .apply(CartAction::Add { item, quantity });
            }

            let largest = cart.items().iter().map(CartLineItem::line_total).max().unwrap_or(Money::ZERO);
            prop_assert!(cart.total() >= largest);

            let quote = compute_quote(&cart, method, gift_wrap);
            prop_assert!(quote.total >= quote.subtotal);
            prop_assert!(serde_json::to_string(&quote).is_ok());
        }

        #[test]
        fn prop_session_round_trip_preserves_state(
            actions in prop::collection::vec(arbitrary_action(), 0..20)
        ) {
            let mut cart = CartState::new();
            for action in actions {
                cart = cart.apply(action);
            }
            let json = serde_json::to_string(&cart).map_err(|e| TestCaseError::fail(e.to_string()))?;
            let restored: CartState = serde_json::from_str(&json).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(restored, cart);
        }
    }
}
