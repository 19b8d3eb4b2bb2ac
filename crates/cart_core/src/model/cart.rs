//! Cart and item records.
//!
//! # Invariants
//! - `checked_out` is terminal: once set, the cart is never resolved from a
//!   session again.
//! - `ItemRecord::total_price` is derived by the store as
//!   `unit_price * quantity` and is read-only for callers.

use crate::model::money::Money;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned cart identifier.
pub type CartId = i64;

/// Store-assigned item identifier.
pub type ItemId = i64;

/// Authenticated user identity that owns a cart.
pub type OwnerId = Uuid;

/// Product reference held by an item.
pub type ProductId = Uuid;

/// Persisted cart aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartRecord {
    pub id: CartId,
    pub owner: OwnerId,
    /// Unix epoch milliseconds, set by the store on insert.
    pub created_at: i64,
    pub checked_out: bool,
}

impl CartRecord {
    /// Returns whether this cart can still be resolved from a session.
    pub fn is_open(&self) -> bool {
        !self.checked_out
    }
}

/// Persisted line entry linking a cart to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub cart_id: CartId,
    pub product: ProductId,
    pub unit_price: Money,
    pub quantity: i64,
    pub total_price: Money,
}

/// Insert payload for a new item; the store assigns `id` and `total_price`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub cart_id: CartId,
    pub product: ProductId,
    pub unit_price: Money,
    pub quantity: i64,
}
