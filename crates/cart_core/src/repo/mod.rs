//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data-access contract the cart facade depends on.
//! - Isolate SQLite query details from cart orchestration.
//!
//! # Invariants
//! - Lookups return `Ok(None)` for missing rows; `NotFound` is reserved for
//!   writes that target a row that no longer exists.

pub mod cart_repo;
