//! CLI smoke entry point.
//!
//! Runs one scripted cart session against an in-memory store to verify
//! `cart_core` wiring end to end.

use cart_core::db::open_db_in_memory;
use cart_core::{Cart, CartRequest, MemorySession, Money, SqliteCartRepository};
use std::process::ExitCode;
use uuid::Uuid;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cart_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("cart_core version={}", cart_core::core_version());

    let conn = open_db_in_memory()?;
    let repo = SqliteCartRepository::new(&conn);
    let mut session = MemorySession::new();
    let mut request = CartRequest::new(&mut session, Uuid::new_v4());
    let mut cart = Cart::new(&repo, &mut request)?;

    let book = Uuid::new_v4();
    let pen = Uuid::new_v4();
    cart.add(book, Money::from_minor(1000), 2)?;
    cart.add(pen, Money::from_minor(500), "3")?;
    println!("cart_id={} total={}", cart.id(), cart.get_total()?);

    cart.remove(book)?;
    println!("after_remove total={} items={}", cart.get_total()?, cart.item_count()?);

    cart.checkout()?;
    println!("checked_out={}", cart.is_checked_out());
    Ok(())
}
