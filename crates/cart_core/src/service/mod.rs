//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, session and hook calls into cart operations.
//! - Keep request-handling layers decoupled from storage details.

pub mod cart_service;
