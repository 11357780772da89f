//! The shopping cart aggregate.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s keyed by [`LineKey`]. Adding
//! the same product and variant twice merges into one line; a line whose
//! quantity would drop to zero is removed. Totals are derived from the lines
//! on every call to [`Cart::totals`], so they cannot go stale.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, Product};
use crate::types::{CurrencyCode, Price, ProductId};

/// Replaces each run of whitespace in a variant label inside a line key.
const VARIANT_SEPARATOR: char = '-';

/// Errors that leave the cart untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),
    #[error("Product {product_id} has no variant {variant:?}")]
    UnknownVariant {
        product_id: ProductId,
        variant: String,
    },
    #[error("Product {0} has no price")]
    PriceUnavailable(ProductId),
}

/// Identity of a cart line: the product ID, plus the normalized variant
/// label when one was chosen (`"7"`, `"7-Doce-de-Leite"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineKey(String);

impl LineKey {
    #[must_use]
    pub fn new(product_id: ProductId, variant: Option<&str>) -> Self {
        match variant {
            Some(label) => Self(format!(
                "{product_id}{VARIANT_SEPARATOR}{}",
                normalize_variant(label)
            )),
            None => Self(product_id.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for LineKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

fn normalize_variant(label: &str) -> String {
    let mut normalized = String::with_capacity(label.len());
    let mut in_whitespace = false;
    for c in label.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                normalized.push(VARIANT_SEPARATOR);
            }
            in_whitespace = true;
        } else {
            normalized.push(c);
            in_whitespace = false;
        }
    }
    normalized
}

/// One row of the cart.
///
/// Name, unit price and image are captured when the line is created; later
/// catalog changes do not affect existing lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub key: LineKey,
    pub product_id: ProductId,
    /// Display name, with the variant in parentheses when present.
    pub name: String,
    pub variant: Option<String>,
    pub unit_price: Price,
    pub image: String,
    quantity: u32,
}

impl CartLine {
    fn new(key: LineKey, product: &Product, variant: Option<&str>, unit_price: Price) -> Self {
        let name = match variant {
            Some(label) => format!("{} ({label})", product.name),
            None => product.name.clone(),
        };
        Self {
            key,
            product_id: product.id,
            name,
            variant: variant.map(str::to_string),
            unit_price,
            image: product.image.clone(),
            quantity: 1,
        }
    }

    /// Always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Outcome of [`Cart::change_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line is still present with this quantity.
    Updated(u32),
    /// The quantity reached zero and the line was removed.
    Removed,
    /// No line has the given key; nothing changed.
    NotInCart,
}

/// Derived cart figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    /// Sum of line quantities.
    pub item_count: u32,
    /// Sum of unit price times quantity.
    pub total: Price,
}

/// The cart for one shopping session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.key == key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of a catalog product, optionally in a given variant.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownProduct` if the ID is not in the catalog,
    /// plus every error of [`Cart::add_product`]. The cart is unchanged on
    /// error.
    pub fn add(
        &mut self,
        catalog: &Catalog,
        product_id: ProductId,
        variant: Option<&str>,
    ) -> Result<LineKey, CartError> {
        let product = catalog
            .find(product_id)
            .ok_or(CartError::UnknownProduct(product_id))?;
        self.add_product(product, variant)
    }

    /// Add one unit of `product`. A blank variant counts as no variant.
    ///
    /// Returns the key of the created or incremented line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownVariant` if the variant is not offered by
    /// the product, or `CartError::PriceUnavailable` if a new line would have
    /// no unit price. The cart is unchanged on error.
    pub fn add_product(
        &mut self,
        product: &Product,
        variant: Option<&str>,
    ) -> Result<LineKey, CartError> {
        let variant = variant.map(str::trim).filter(|label| !label.is_empty());
        if let Some(label) = variant
            && !product.has_variant(label)
        {
            return Err(CartError::UnknownVariant {
                product_id: product.id,
                variant: label.to_string(),
            });
        }

        let key = LineKey::new(product.id, variant);
        match self.lines.iter_mut().find(|line| line.key == key) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => {
                let unit_price = product
                    .unit_price()
                    .ok_or(CartError::PriceUnavailable(product.id))?;
                self.lines
                    .push(CartLine::new(key.clone(), product, variant, unit_price));
            }
        }
        Ok(key)
    }

    /// Apply a signed quantity delta to a line.
    ///
    /// A resulting quantity of zero or less removes the line.
    pub fn change_quantity(&mut self, key: &LineKey, delta: i32) -> QuantityChange {
        let Some(line) = self.lines.iter_mut().find(|line| &line.key == key) else {
            return QuantityChange::NotInCart;
        };

        let next = i64::from(line.quantity) + i64::from(delta);
        if next <= 0 {
            self.remove(key);
            return QuantityChange::Removed;
        }

        line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        QuantityChange::Updated(line.quantity)
    }

    /// Remove a line. Returns `false` if no line had the key.
    pub fn remove(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.key != key);
        self.lines.len() != before
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Item count and total price, computed from the current lines.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        let currency = self
            .lines
            .first()
            .map_or_else(CurrencyCode::default, |line| line.unit_price.currency_code);

        self.lines.iter().fold(
            CartTotals {
                item_count: 0,
                total: Price::zero(currency),
            },
            |acc, line| CartTotals {
                item_count: acc.item_count.saturating_add(line.quantity),
                total: acc.total + line.line_total(),
            },
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(
            br#"[
                {"id": 1, "name": "X-Burguer", "price": 10.00, "category": "Lanches", "img": "a.jpg"},
                {"id": 2, "name": "Milkshake", "price": 5.50, "category": "Bebidas", "img": "b.jpg",
                 "options": {"title": "Tamanho", "flavors": ["Grande", "Doce de  Leite"]}},
                {"id": 3, "name": "Combo", "category": "Combos", "img": "c.jpg"}
            ]"#,
        )
        .unwrap()
    }

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_line_key_without_variant() {
        assert_eq!(LineKey::new(ProductId::new(12), None).as_str(), "12");
    }

    #[test]
    fn test_line_key_collapses_whitespace_runs() {
        let key = LineKey::new(ProductId::new(2), Some("Doce de  Leite"));
        assert_eq!(key.as_str(), "2-Doce-de-Leite");
    }

    #[test]
    fn test_worked_example() {
        let catalog = catalog();
        let mut cart = Cart::new();

        let burger = cart.add(&catalog, ProductId::new(1), None).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.totals().total.amount, money(1000));
        assert_eq!(cart.totals().item_count, 1);

        cart.add(&catalog, ProductId::new(1), None).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.get(&burger).unwrap().quantity(), 2);
        assert_eq!(cart.totals().total.amount, money(2000));

        cart.add(&catalog, ProductId::new(2), Some("Grande")).unwrap();
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.totals().total.amount, money(2550));
        assert_eq!(cart.totals().item_count, 3);

        assert_eq!(
            cart.change_quantity(&burger, -1),
            QuantityChange::Updated(1)
        );
        assert_eq!(cart.totals().total.amount, money(1550));

        assert_eq!(cart.change_quantity(&burger, -1), QuantityChange::Removed);
        assert!(cart.get(&burger).is_none());
        assert_eq!(cart.totals().total.amount, money(550));
        assert_eq!(cart.totals().item_count, 1);
    }

    #[test]
    fn test_variant_line_name_and_captured_fields() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let key = cart.add(&catalog, ProductId::new(2), Some("Grande")).unwrap();

        let line = cart.get(&key).unwrap();
        assert_eq!(line.name, "Milkshake (Grande)");
        assert_eq!(line.variant.as_deref(), Some("Grande"));
        assert_eq!(line.unit_price.amount, money(550));
        assert_eq!(line.image, "b.jpg");
    }

    #[test]
    fn test_distinct_variants_are_distinct_lines() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(&catalog, ProductId::new(2), Some("Grande")).unwrap();
        cart.add(&catalog, ProductId::new(2), Some("Doce de  Leite"))
            .unwrap();
        cart.add(&catalog, ProductId::new(2), None).unwrap();
        cart.add(&catalog, ProductId::new(2), Some("Grande")).unwrap();

        let keys: Vec<&str> = cart.lines().iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, ["2-Grande", "2-Doce-de-Leite", "2"]);
        assert_eq!(cart.totals().item_count, 4);
    }

    #[test]
    fn test_blank_variant_is_no_variant() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let key = cart.add(&catalog, ProductId::new(1), Some("  ")).unwrap();
        assert_eq!(key.as_str(), "1");
        assert_eq!(cart.get(&key).unwrap().name, "X-Burguer");
    }

    #[test]
    fn test_unknown_product_leaves_cart_unchanged() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(&catalog, ProductId::new(1), None).unwrap();
        let before = cart.clone();

        let err = cart.add(&catalog, ProductId::new(404), None).unwrap_err();
        assert_eq!(err, CartError::UnknownProduct(ProductId::new(404)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let err = cart
            .add(&catalog, ProductId::new(1), Some("Grande"))
            .unwrap_err();
        assert!(matches!(err, CartError::UnknownVariant { .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_unpriced_product_rejected() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let err = cart.add(&catalog, ProductId::new(3), None).unwrap_err();
        assert_eq!(err, CartError::PriceUnavailable(ProductId::new(3)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_price_captured_at_add_time() {
        let mut cart = Cart::new();
        let mut product = catalog().find(ProductId::new(1)).unwrap().clone();
        let key = cart.add_product(&product, None).unwrap();

        product.price = Some(money(9900));
        cart.add_product(&product, None).unwrap();

        assert_eq!(cart.get(&key).unwrap().unit_price.amount, money(1000));
        assert_eq!(cart.totals().total.amount, money(2000));
    }

    #[test]
    fn test_large_negative_delta_removes_line() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let key = cart.add(&catalog, ProductId::new(1), None).unwrap();
        cart.change_quantity(&key, 4);
        assert_eq!(cart.get(&key).unwrap().quantity(), 5);

        assert_eq!(cart.change_quantity(&key, -50), QuantityChange::Removed);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_change_quantity_unknown_key_is_noop() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(&catalog, ProductId::new(1), None).unwrap();
        let before = cart.clone();

        let missing = LineKey::from("99".to_string());
        assert_eq!(cart.change_quantity(&missing, -1), QuantityChange::NotInCart);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let burger = cart.add(&catalog, ProductId::new(1), None).unwrap();
        cart.add(&catalog, ProductId::new(2), Some("Grande")).unwrap();
        let before = cart.clone();

        assert!(!cart.remove(&LineKey::from("nope".to_string())));
        assert_eq!(cart, before);

        assert!(cart.remove(&burger));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.totals().total.amount, money(550));
    }

    #[test]
    fn test_totals_of_empty_cart() {
        let totals = Cart::new().totals();
        assert_eq!(totals.item_count, 0);
        assert_eq!(totals.total, Price::zero(CurrencyCode::BRL));
    }

    #[test]
    fn test_serde_round_trip_preserves_order_and_quantity() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(&catalog, ProductId::new(2), Some("Grande")).unwrap();
        cart.add(&catalog, ProductId::new(1), None).unwrap();
        cart.add(&catalog, ProductId::new(1), None).unwrap();

        let json = serde_json::to_value(&cart).unwrap();
        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }

    fn assert_consistent(cart: &Cart) {
        let mut keys: Vec<&LineKey> = cart.lines().iter().map(|line| &line.key).collect();
        keys.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        keys.dedup();
        assert_eq!(keys.len(), cart.lines().len(), "duplicate line keys");
        assert!(cart.lines().iter().all(|line| line.quantity() >= 1));

        let totals = cart.totals();
        let count: u32 = cart.lines().iter().map(CartLine::quantity).sum();
        let sum: Decimal = cart
            .lines()
            .iter()
            .map(|line| line.unit_price.amount * Decimal::from(line.quantity()))
            .sum();
        assert_eq!(totals.item_count, count);
        assert_eq!(totals.total.amount, sum);
    }

    #[test]
    fn test_long_operation_sequence_keeps_cart_consistent() {
        let catalog = catalog();
        let adds: [(i32, Option<&str>); 6] = [
            (1, None),
            (2, Some("Grande")),
            (2, Some("Doce de  Leite")),
            (2, Some("  ")),
            (3, None),
            (9, None),
        ];
        let keys = [
            LineKey::from("1".to_string()),
            LineKey::from("2-Grande".to_string()),
            LineKey::from("2-Doce-de-Leite".to_string()),
            LineKey::from("2".to_string()),
            LineKey::from("3".to_string()),
        ];

        // Linear congruential sequence so every run replays the same steps.
        let mut seed: u32 = 0x2545_f491;
        let mut next = |bound: u32| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 16) % bound
        };

        let mut cart = Cart::new();
        let mut expected: Vec<(LineKey, u32)> = Vec::new();

        for _ in 0..2_000 {
            match next(3) {
                0 => {
                    let (id, variant) = adds[next(6) as usize];
                    match cart.add(&catalog, ProductId::new(id), variant) {
                        Ok(key) => match expected.iter_mut().find(|(k, _)| *k == key) {
                            Some((_, quantity)) => *quantity += 1,
                            None => expected.push((key, 1)),
                        },
                        Err(_) => assert!(id == 3 || id == 9),
                    }
                }
                1 => {
                    let key = &keys[next(5) as usize];
                    let delta = i32::try_from(next(7)).unwrap() - 3;
                    let change = cart.change_quantity(key, delta);
                    match expected.iter().position(|(k, _)| k == key) {
                        None => assert_eq!(change, QuantityChange::NotInCart),
                        Some(at) => {
                            let quantity = i64::from(expected[at].1) + i64::from(delta);
                            if quantity <= 0 {
                                expected.remove(at);
                                assert_eq!(change, QuantityChange::Removed);
                            } else {
                                expected[at].1 = u32::try_from(quantity).unwrap();
                                assert_eq!(change, QuantityChange::Updated(expected[at].1));
                            }
                        }
                    }
                }
                _ => {
                    let key = &keys[next(5) as usize];
                    let present = expected.iter().position(|(k, _)| k == key);
                    assert_eq!(cart.remove(key), present.is_some());
                    if let Some(at) = present {
                        expected.remove(at);
                    }
                }
            }

            assert_consistent(&cart);
            let actual: Vec<(LineKey, u32)> = cart
                .lines()
                .iter()
                .map(|line| (line.key.clone(), line.quantity()))
                .collect();
            assert_eq!(actual, expected);
        }
    }
}
