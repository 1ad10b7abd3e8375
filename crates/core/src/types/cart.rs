//! Cart data model and wire types.
//!
//! [`CartLine`] is the unit of cart state on the client side and the shape
//! persisted to the guest's local store (a JSON array of lines, camelCase
//! keys). [`CartRow`] is the server-side row as returned by the cart REST
//! service. Both sides of the wire share these definitions.
//!
//! The line's cart-internal key is its [`ProductId`]. Once a line has been
//! persisted remotely, the server-issued [`CartRowId`] is recorded alongside
//! it in `remote_id` - the two id spaces are kept in distinct types and never
//! conflated.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::{CartRowId, ProductId, UserId};

/// One product's presence in a cart.
///
/// Name, price, image, and category are a denormalized display snapshot
/// captured at add-time; they are not guaranteed to match current catalog
/// state. `remote_id` is session-scoped bookkeeping and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Stable catalog identifier; also the cart-internal line key.
    /// Older persisted carts used the key `id` for this field.
    #[serde(alias = "id")]
    pub product_id: ProductId,
    /// Server-issued row id, once this line has been persisted remotely.
    #[serde(skip)]
    pub remote_id: Option<CartRowId>,
    /// Product display name at add-time.
    pub name: String,
    /// Unit price at add-time.
    pub price: Decimal,
    /// Product image reference at add-time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Category label at add-time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Always >= 1; a line that would reach 0 is removed instead.
    pub quantity: u32,
}

impl CartLine {
    /// Create a new line with no image or category.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            remote_id: None,
            name: name.into(),
            price,
            image: None,
            category: None,
            quantity,
        }
    }

    /// Line subtotal: quantity x unit price.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Ordered collection of [`CartLine`]s, unique by product, for one owner.
///
/// All invariants of the data model are enforced here: at most one line per
/// product (re-adding increments), quantity always >= 1 (anything that would
/// drive it to 0 or below deletes the line), totals derived on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from persisted lines.
    ///
    /// Goes through [`Self::add_line`] so that duplicated or zero-quantity
    /// lines in a stale persisted copy collapse back into a valid cart.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            cart.add_line(line);
        }
        cart
    }

    /// Current lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct product lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Look up a line by product.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    /// Add a line, merging with an existing line for the same product.
    ///
    /// Merging increments the quantity and keeps the existing add-time
    /// snapshot (name, price, image, category). A zero-quantity line is
    /// ignored entirely - it must not exist in a cart.
    pub fn add_line(&mut self, line: CartLine) {
        if line.quantity == 0 {
            return;
        }
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            self.lines.push(line);
        }
    }

    /// Set a line's quantity; anything <= 0 removes the line.
    ///
    /// Returns the removed line when the update turned into a removal,
    /// `None` otherwise (including when no such line exists).
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> Option<CartLine> {
        if quantity <= 0 {
            return self.remove_line(product_id);
        }
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| &l.product_id == product_id)
        {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
        None
    }

    /// Remove a line, returning it so callers can reach its `remote_id`.
    ///
    /// Removing a product that is not in the cart is a no-op.
    pub fn remove_line(&mut self, product_id: &ProductId) -> Option<CartLine> {
        let idx = self
            .lines
            .iter()
            .position(|l| &l.product_id == product_id)?;
        Some(self.lines.remove(idx))
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Record the server-issued row id for a product's line.
    ///
    /// Returns `false` when the line no longer exists (it was removed while
    /// the persistence round-trip was in flight).
    pub fn set_remote_id(&mut self, product_id: &ProductId, remote_id: CartRowId) -> bool {
        match self
            .lines
            .iter_mut()
            .find(|l| &l.product_id == product_id)
        {
            Some(line) => {
                line.remote_id = Some(remote_id);
                true
            }
            None => false,
        }
    }

    /// Total item count: the sum of all quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |acc, l| acc.saturating_add(l.quantity))
    }

    /// Total price: the sum of quantity x unit price over all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }
}

/// A persisted cart row as stored by the cart service and returned over REST.
///
/// Carries the full denormalized product snapshot so clients can hydrate a
/// [`CartLine`] without a catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRow {
    pub id: CartRowId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartRow {
    /// Hydrate a client-side line, recording this row's id as its remote id.
    #[must_use]
    pub fn into_line(self) -> CartLine {
        CartLine {
            product_id: self.product_id,
            remote_id: Some(self.id),
            name: self.name,
            price: self.price,
            image: self.image,
            category: self.category,
            quantity: self.quantity,
        }
    }
}

/// Request body for the add-or-increment endpoint (`POST /api/cart`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartUpsert {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub quantity: u32,
}

/// Request body for the bulk-replace endpoint (`POST /api/cart/sync`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSyncRequest {
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(product: &str, price: i64, quantity: u32) -> CartLine {
        CartLine::new(product, format!("{product} name"), Decimal::new(price, 0), quantity)
    }

    #[test]
    fn test_add_same_product_merges_quantities() {
        let mut cart = Cart::new();
        cart.add_line(line("brake-pad", 100, 1));
        cart.add_line(line("brake-pad", 100, 2));

        assert_eq!(cart.line_count(), 1);
        let merged = cart.get(&ProductId::new("brake-pad")).unwrap();
        assert_eq!(merged.quantity, 3);
        assert_eq!(cart.total_price(), Decimal::new(300, 0));
    }

    #[test]
    fn test_merge_keeps_add_time_snapshot() {
        let mut cart = Cart::new();
        let mut first = line("wiper-blade", 25, 1);
        first.category = Some("Exterior".to_owned());
        cart.add_line(first);

        let mut second = line("wiper-blade", 30, 1);
        second.name = "renamed".to_owned();
        cart.add_line(second);

        let merged = cart.get(&ProductId::new("wiper-blade")).unwrap();
        assert_eq!(merged.price, Decimal::new(25, 0));
        assert_eq!(merged.name, "wiper-blade name");
        assert_eq!(merged.category.as_deref(), Some("Exterior"));
        assert_eq!(merged.quantity, 2);
    }

    #[test]
    fn test_zero_quantity_add_is_ignored() {
        let mut cart = Cart::new();
        cart.add_line(line("air-filter", 15, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes() {
        let mut cart = Cart::new();
        cart.add_line(line("alternator", 180, 2));

        let removed = cart.set_quantity(&ProductId::new("alternator"), 0);
        assert!(removed.is_some());
        assert!(cart.is_empty());

        cart.add_line(line("alternator", 180, 2));
        cart.set_quantity(&ProductId::new("alternator"), -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_updates_in_place() {
        let mut cart = Cart::new();
        cart.add_line(line("spark-plug", 9, 4));
        cart.set_quantity(&ProductId::new("spark-plug"), 2);

        assert_eq!(cart.get(&ProductId::new("spark-plug")).unwrap().quantity, 2);
        assert_eq!(cart.total_items(), 2);
    }

    #[test]
    fn test_remove_missing_product_is_noop() {
        let mut cart = Cart::new();
        cart.add_line(line("radiator", 210, 1));

        assert!(cart.remove_line(&ProductId::new("not-in-cart")).is_none());
        assert_eq!(cart.line_count(), 1);
    }

    #[test]
    fn test_totals_are_derived() {
        let mut cart = Cart::new();
        cart.add_line(line("oil-filter", 12, 2));
        cart.add_line(line("cabin-filter", 18, 1));

        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price(), Decimal::new(42, 0));

        cart.remove_line(&ProductId::new("oil-filter"));
        assert_eq!(cart.total_items(), 1);
        assert_eq!(cart.total_price(), Decimal::new(18, 0));

        cart.clear();
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
    }

    #[test]
    fn test_from_lines_collapses_stale_duplicates() {
        let cart = Cart::from_lines(vec![
            line("battery", 95, 1),
            line("battery", 95, 2),
            line("fuse-kit", 8, 0),
        ]);

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_local_wire_roundtrip() {
        let mut cart = Cart::new();
        let mut l = line("strut-assembly", 140, 2);
        l.image = Some("https://cdn.axleparts.dev/strut.jpg".to_owned());
        l.remote_id = Some(CartRowId::new(7));
        cart.add_line(l);

        let json = serde_json::to_string(cart.lines()).unwrap();
        // remote_id is session-scoped and must not leak into the wire format
        assert!(!json.contains("remote"));
        assert!(json.contains("\"productId\""));

        let lines: Vec<CartLine> = serde_json::from_str(&json).unwrap();
        let reloaded = Cart::from_lines(lines);

        assert_eq!(reloaded.line_count(), 1);
        let back = reloaded.get(&ProductId::new("strut-assembly")).unwrap();
        assert_eq!(back.quantity, 2);
        assert_eq!(back.remote_id, None);
        assert_eq!(back.image.as_deref(), Some("https://cdn.axleparts.dev/strut.jpg"));
    }

    #[test]
    fn test_legacy_id_key_accepted() {
        let json = r#"[{"id":"brake-rotor","name":"Brake Rotor","price":"61.50","quantity":1}]"#;
        let lines: Vec<CartLine> = serde_json::from_str(json).unwrap();
        assert_eq!(lines[0].product_id, ProductId::new("brake-rotor"));
        assert_eq!(lines[0].price, Decimal::new(6150, 2));
    }

    #[test]
    fn test_cart_row_hydrates_line_with_remote_id() {
        let row = CartRow {
            id: CartRowId::new(33),
            user_id: UserId::new("user-9"),
            product_id: ProductId::new("serpentine-belt"),
            name: "Serpentine Belt".to_owned(),
            price: Decimal::new(2799, 2),
            image: None,
            category: Some("Engine".to_owned()),
            quantity: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let hydrated = row.into_line();
        assert_eq!(hydrated.remote_id, Some(CartRowId::new(33)));
        assert_eq!(hydrated.subtotal(), Decimal::new(5598, 2));
    }
}
