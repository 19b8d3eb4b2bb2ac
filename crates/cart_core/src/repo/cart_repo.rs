//! Cart repository contract and SQLite implementation.
//!
//! # Invariants
//! - `find_active_cart` never returns a checked-out cart.
//! - Item totals are projected by SQL, not computed by callers.
//! - Quantity increments are single-statement updates.

use crate::db::DbError;
use crate::model::cart::{CartId, CartRecord, ItemId, ItemRecord, NewItem, OwnerId, ProductId};
use crate::model::money::Money;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CART_SELECT_SQL: &str = "SELECT
    id,
    owner,
    created_at,
    checked_out
FROM carts";

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    cart_id,
    product,
    unit_price,
    quantity,
    unit_price * quantity AS total_price
FROM items";

pub type RepoResult<T> = Result<T, RepoError>;

/// Row kind used in `NotFound` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Cart,
    Item,
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cart => f.write_str("cart"),
            Self::Item => f.write_str("item"),
        }
    }
}

/// Repository error for cart persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { kind: RecordKind, id: i64 },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted cart data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data-access contract consumed by the cart facade.
///
/// Implementations own identity assignment and the derived item total.
pub trait CartRepository {
    /// Inserts a new open cart for `owner` and returns the stored record.
    fn create_cart(&self, owner: OwnerId) -> RepoResult<CartRecord>;
    /// Finds a cart by id that belongs to `owner` and is not checked out.
    fn find_active_cart(&self, id: CartId, owner: OwnerId) -> RepoResult<Option<CartRecord>>;
    /// Persists mutable cart fields.
    fn save_cart(&self, cart: &CartRecord) -> RepoResult<()>;
    fn find_item(&self, cart_id: CartId, product: ProductId) -> RepoResult<Option<ItemRecord>>;
    /// Lists all items of one cart ordered by insertion.
    fn list_items(&self, cart_id: CartId) -> RepoResult<Vec<ItemRecord>>;
    fn create_item(&self, item: &NewItem) -> RepoResult<ItemRecord>;
    /// Persists quantity and unit price of an existing item.
    fn save_item(&self, item: &ItemRecord) -> RepoResult<()>;
    /// Adds `delta` to the stored quantity without a read-modify-write.
    fn increment_item_quantity(&self, id: ItemId, delta: i64) -> RepoResult<()>;
    fn delete_item(&self, id: ItemId) -> RepoResult<()>;
}

impl<R: CartRepository + ?Sized> CartRepository for &R {
    fn create_cart(&self, owner: OwnerId) -> RepoResult<CartRecord> {
        (**self).create_cart(owner)
    }

    fn find_active_cart(&self, id: CartId, owner: OwnerId) -> RepoResult<Option<CartRecord>> {
        (**self).find_active_cart(id, owner)
    }

    fn save_cart(&self, cart: &CartRecord) -> RepoResult<()> {
        (**self).save_cart(cart)
    }

    fn find_item(&self, cart_id: CartId, product: ProductId) -> RepoResult<Option<ItemRecord>> {
        (**self).find_item(cart_id, product)
    }

    fn list_items(&self, cart_id: CartId) -> RepoResult<Vec<ItemRecord>> {
        (**self).list_items(cart_id)
    }

    fn create_item(&self, item: &NewItem) -> RepoResult<ItemRecord> {
        (**self).create_item(item)
    }

    fn save_item(&self, item: &ItemRecord) -> RepoResult<()> {
        (**self).save_item(item)
    }

    fn increment_item_quantity(&self, id: ItemId, delta: i64) -> RepoResult<()> {
        (**self).increment_item_quantity(id, delta)
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        (**self).delete_item(id)
    }
}

/// SQLite-backed cart repository.
pub struct SqliteCartRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCartRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn get_cart(&self, id: CartId) -> RepoResult<CartRecord> {
        let cart = self
            .conn
            .query_row(
                &format!("{CART_SELECT_SQL} WHERE id = ?1;"),
                [id],
                read_cart_row,
            )
            .optional()?;
        cart.ok_or(RepoError::NotFound {
            kind: RecordKind::Cart,
            id,
        })?
    }

    fn get_item(&self, id: ItemId) -> RepoResult<ItemRecord> {
        let item = self
            .conn
            .query_row(
                &format!("{ITEM_SELECT_SQL} WHERE id = ?1;"),
                [id],
                read_item_row,
            )
            .optional()?;
        item.ok_or(RepoError::NotFound {
            kind: RecordKind::Item,
            id,
        })?
    }
}

impl CartRepository for SqliteCartRepository<'_> {
    fn create_cart(&self, owner: OwnerId) -> RepoResult<CartRecord> {
        self.conn.execute(
            "INSERT INTO carts (owner, checked_out) VALUES (?1, 0);",
            [owner.to_string()],
        )?;
        self.get_cart(self.conn.last_insert_rowid())
    }

    fn find_active_cart(&self, id: CartId, owner: OwnerId) -> RepoResult<Option<CartRecord>> {
        let cart = self
            .conn
            .query_row(
                &format!(
                    "{CART_SELECT_SQL}
                     WHERE id = ?1
                       AND owner = ?2
                       AND checked_out = 0;"
                ),
                params![id, owner.to_string()],
                read_cart_row,
            )
            .optional()?;
        cart.transpose()
    }

    fn save_cart(&self, cart: &CartRecord) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE carts
             SET
                owner = ?1,
                checked_out = ?2
             WHERE id = ?3;",
            params![cart.owner.to_string(), bool_to_int(cart.checked_out), cart.id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: RecordKind::Cart,
                id: cart.id,
            });
        }

        Ok(())
    }

    fn find_item(&self, cart_id: CartId, product: ProductId) -> RepoResult<Option<ItemRecord>> {
        let item = self
            .conn
            .query_row(
                &format!(
                    "{ITEM_SELECT_SQL}
                     WHERE cart_id = ?1
                       AND product = ?2;"
                ),
                params![cart_id, product.to_string()],
                read_item_row,
            )
            .optional()?;
        item.transpose()
    }

    fn list_items(&self, cart_id: CartId) -> RepoResult<Vec<ItemRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE cart_id = ?1
             ORDER BY id ASC;"
        ))?;

        let mut rows = stmt.query([cart_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }

        Ok(items)
    }

    fn create_item(&self, item: &NewItem) -> RepoResult<ItemRecord> {
        self.conn.execute(
            "INSERT INTO items (
                cart_id,
                product,
                unit_price,
                quantity
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                item.cart_id,
                item.product.to_string(),
                item.unit_price.minor_units(),
                item.quantity,
            ],
        )?;
        self.get_item(self.conn.last_insert_rowid())
    }

    fn save_item(&self, item: &ItemRecord) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET
                unit_price = ?1,
                quantity = ?2
             WHERE id = ?3;",
            params![item.unit_price.minor_units(), item.quantity, item.id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: RecordKind::Item,
                id: item.id,
            });
        }

        Ok(())
    }

    fn increment_item_quantity(&self, id: ItemId, delta: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items SET quantity = quantity + ?1 WHERE id = ?2;",
            params![delta, id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: RecordKind::Item,
                id,
            });
        }

        Ok(())
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM items WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: RecordKind::Item,
                id,
            });
        }

        Ok(())
    }
}

// The parse result is the callback value, so malformed rows surface as
// `InvalidData` rather than as SQL errors.
fn read_cart_row(row: &Row<'_>) -> rusqlite::Result<RepoResult<CartRecord>> {
    Ok(parse_cart_row(row))
}

fn read_item_row(row: &Row<'_>) -> rusqlite::Result<RepoResult<ItemRecord>> {
    Ok(parse_item_row(row))
}

fn parse_cart_row(row: &Row<'_>) -> RepoResult<CartRecord> {
    let owner_text: String = row.get("owner")?;
    let owner = parse_uuid(&owner_text, "carts.owner")?;

    Ok(CartRecord {
        id: row.get("id")?,
        owner,
        created_at: row.get("created_at")?,
        checked_out: parse_bool(row.get("checked_out")?, "carts.checked_out")?,
    })
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<ItemRecord> {
    let product_text: String = row.get("product")?;
    let product = parse_uuid(&product_text, "items.product")?;

    Ok(ItemRecord {
        id: row.get("id")?,
        cart_id: row.get("cart_id")?,
        product,
        unit_price: Money::from_minor(row.get("unit_price")?),
        quantity: row.get("quantity")?,
        total_price: Money::from_minor(row.get("total_price")?),
    })
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}"))
    })
}

fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
