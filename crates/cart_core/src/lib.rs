//! Session-bound shopping cart core.
//!
//! A [`Cart`] is built per request from a session and a user identity,
//! resolves (or creates) the active persisted cart, and mutates its items
//! through an injected [`CartRepository`].

pub mod config;
pub mod db;
pub mod hooks;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;

pub use config::{CartConfig, ConfigError, UpdateMode};
pub use hooks::{
    AddEvent, CartEvent, CartObserver, CartObservers, HookError, HookPoint, HookResult,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::cart::{CartId, CartRecord, ItemId, ItemRecord, NewItem, OwnerId, ProductId};
pub use model::money::Money;
pub use model::quantity::{coerce_quantity, QuantityInput, DEFAULT_QUANTITY};
pub use repo::cart_repo::{CartRepository, RecordKind, RepoError, RepoResult, SqliteCartRepository};
pub use service::cart_service::{Cart, CartError, CartItems, CartResolution, CartResult};
pub use session::{CartRequest, MemorySession, SessionStore, CART_ID_KEY};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
