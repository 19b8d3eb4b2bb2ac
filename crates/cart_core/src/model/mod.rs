//! Cart domain model.
//!
//! # Responsibility
//! - Define the persisted cart and line-item records.
//! - Define value types shared by repository and service layers.
//!
//! # Invariants
//! - Cart and item ids are assigned by the store, never by callers.
//! - An item belongs to exactly one cart.

pub mod cart;
pub mod money;
pub mod quantity;
