//! Session binding between a visitor and the active cart.
//!
//! # Responsibility
//! - Define the minimal session mapping the cart reads and writes.
//! - Carry the authenticated owner alongside the session for one request.
//!
//! # Invariants
//! - The cart only touches one key (`CART-ID` by default).
//! - Session lifetime is managed by the caller, never by the cart.

use crate::model::cart::{CartId, OwnerId};
use std::collections::HashMap;

/// Default session key holding the active cart id.
pub const CART_ID_KEY: &str = "CART-ID";

/// String-keyed session mapping.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// In-process session map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySession {
    values: HashMap<String, String>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

impl SessionStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }
}

/// Request-scoped view handed to the cart on construction.
pub struct CartRequest<'a> {
    session: &'a mut dyn SessionStore,
    user: OwnerId,
}

impl<'a> CartRequest<'a> {
    pub fn new(session: &'a mut dyn SessionStore, user: OwnerId) -> Self {
        Self { session, user }
    }

    pub fn user(&self) -> OwnerId {
        self.user
    }

    /// Reads the stored cart id.
    ///
    /// Values that are not a valid cart id are treated as absent.
    pub fn stored_cart_id(&self, key: &str) -> Option<CartId> {
        self.session
            .get(key)
            .and_then(|value| value.trim().parse::<CartId>().ok())
    }

    pub fn store_cart_id(&mut self, key: &str, id: CartId) {
        self.session.set(key, id.to_string());
    }
}
