//! Domain types for the booking cart.
//!
//! The cart holds one line per bookable item (rooms, cottages, experiences,
//! dining). Lines keep their insertion order with the newest first, the way
//! the booking page renders them, and the whole line list is the shape that
//! gets mirrored to persistent storage.

use serde::{Deserialize, Serialize};

/// Unique identifier for a bookable item
///
/// Item ids come from the catalog (`"r1"`, `"cottage-lakeview"`, ...) and are
/// opaque to the cart.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Creates an `ItemId` from a catalog identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Catalog details supplied when adding an item to the cart
///
/// A second add for the same id only accumulates quantity; the details of
/// the line already in the cart always win.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemDetails {
    /// Catalog identifier
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Unit price in the resort currency
    pub price: f64,
    /// Optional portion/variant label (e.g. spa session length, table size)
    pub portion: Option<String>,
}

impl ItemDetails {
    /// Creates item details for an add
    #[must_use]
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            portion: None,
        }
    }

    /// Sets the portion/variant label
    #[must_use]
    pub fn with_portion(mut self, portion: impl Into<String>) -> Self {
        self.portion = Some(portion.into());
        self
    }
}

/// A single cart line
///
/// This is the persisted wire shape: carts are stored as a JSON array of
/// these objects under a single storage key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Catalog identifier (at most one line per id)
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Quantity
    ///
    /// Stored verbatim: `update_qty` writes zero and negative values without
    /// removing the line, and the total reflects them arithmetically.
    pub qty: i64,
    /// Optional portion/variant label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portion: Option<String>,
    /// Whether this line has been paid
    #[serde(default)]
    pub paid: bool,
}

impl CartLine {
    /// Creates a new cart line from catalog details
    #[must_use]
    pub fn new(details: ItemDetails, qty: i64, paid: bool) -> Self {
        Self {
            id: details.id,
            name: details.name,
            price: details.price,
            qty,
            portion: details.portion,
            paid,
        }
    }

    /// Price contribution of this line (`price * qty`)
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Quantities stay far below f64's exact integer range
    pub fn line_total(&self) -> f64 {
        self.price * self.qty as f64
    }
}

/// State of the booking cart
///
/// Lines keep insertion order with the newest first. The invariant is at
/// most one line per item id; every operation that inserts goes through an
/// existence check first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CartState {
    /// Cart lines, newest first
    pub lines: Vec<CartLine>,
}

impl CartState {
    /// Creates a new empty cart
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Creates a cart from previously persisted lines
    #[must_use]
    pub const fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Returns the number of lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Checks whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns a line by item id
    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    /// Checks whether a line exists for the item id
    #[must_use]
    pub fn exists(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Grand total of the cart
    ///
    /// Always recomputed from the lines; the total is never stored, so it
    /// cannot drift from the line data.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

/// Scope of a payment confirmation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentScope {
    /// Confirm a single cart line
    Line(ItemId),
    /// Confirm every line present when the confirmation settles
    All,
}

/// Actions representing commands and feedback events for the booking cart
///
/// Commands come from the UI layer; `PaymentSettled` is fed back by the
/// payment gateway effect once a confirmation completes.
#[derive(Clone, Debug)]
pub enum BookingAction {
    // ========== Commands ==========
    /// Command: Add an item to the cart
    ///
    /// An existing line for the same id accumulates quantity and keeps its
    /// details. With `pay_now` the line is marked paid immediately and a
    /// confirmation is still scheduled for it.
    AddItem {
        /// Catalog details for the item
        item: ItemDetails,
        /// Quantity to add
        qty: i64,
        /// Mark the line paid immediately and schedule a confirmation
        pay_now: bool,
    },

    /// Command: Remove a line from the cart (no-op when absent)
    RemoveItem {
        /// Line to remove
        id: ItemId,
    },

    /// Command: Set a line's quantity verbatim (no-op when absent)
    UpdateQty {
        /// Line to update
        id: ItemId,
        /// New quantity, stored as given (zero and negative included)
        qty: i64,
    },

    /// Command: Start a payment confirmation for a single line
    PayItem {
        /// Line to pay
        id: ItemId,
    },

    /// Command: Start a payment confirmation for the whole cart
    PayAll,

    /// Command: Remove every line
    Clear,

    // ========== Events ==========
    /// Event: A payment confirmation settled
    ///
    /// Marks the scoped lines paid. A settled line that has since been
    /// removed is skipped silently.
    PaymentSettled {
        /// What the confirmation covered
        scope: PaymentScope,
        /// Gateway reference for the confirmation (logged, never persisted)
        reference: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, price: f64, qty: i64) -> CartLine {
        CartLine::new(ItemDetails::new(id, format!("Item {id}"), price), qty, false)
    }

    #[test]
    fn item_id_display() {
        let id = ItemId::new("r1");
        assert_eq!(format!("{id}"), "r1");
        assert_eq!(id.as_str(), "r1");
    }

    #[test]
    fn cart_line_totals() {
        assert_eq!(line("r1", 500.0, 3).line_total(), 1500.0);
        assert_eq!(line("r1", 500.0, 0).line_total(), 0.0);
        assert_eq!(line("r1", 500.0, -2).line_total(), -1000.0);
    }

    #[test]
    fn cart_total_sums_all_lines() {
        let state = CartState::from_lines(vec![
            line("spa", 120.0, 2),
            line("r1", 500.0, 3),
        ]);

        assert_eq!(state.total(), 1740.0);
        assert_eq!(state.len(), 2);
        assert!(state.exists(&ItemId::new("spa")));
        assert!(!state.exists(&ItemId::new("dinner")));
    }

    #[test]
    fn empty_cart_total_is_zero() {
        let state = CartState::new();
        assert!(state.is_empty());
        assert_eq!(state.total(), 0.0);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn cart_line_serializes_to_the_stored_shape() {
        let mut with_portion = line("spa", 120.0, 1);
        with_portion.portion = Some("90 min".to_string());

        let json = serde_json::to_value(&with_portion).unwrap();
        assert_eq!(json["id"], "spa");
        assert_eq!(json["name"], "Item spa");
        assert_eq!(json["price"], 120.0);
        assert_eq!(json["qty"], 1);
        assert_eq!(json["portion"], "90 min");
        assert_eq!(json["paid"], false);

        // Absent portion is omitted entirely, not serialized as null
        let without_portion = line("r1", 500.0, 2);
        let json = serde_json::to_value(&without_portion).unwrap();
        assert!(json.get("portion").is_none());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn cart_line_deserializes_with_missing_optionals() {
        let parsed: CartLine =
            serde_json::from_str(r#"{"id":"r1","name":"Lakeview Room","price":500.0,"qty":2}"#)
                .unwrap();

        assert_eq!(parsed.id, ItemId::new("r1"));
        assert_eq!(parsed.qty, 2);
        assert_eq!(parsed.portion, None);
        assert!(!parsed.paid);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn cart_lines_round_trip() {
        let lines = vec![
            CartLine::new(
                ItemDetails::new("spa", "Forest Spa", 120.5).with_portion("60 min"),
                2,
                true,
            ),
            line("r1", 500.0, 3),
        ];

        let json = serde_json::to_string(&lines).unwrap();
        let parsed: Vec<CartLine> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, lines);
    }
}
