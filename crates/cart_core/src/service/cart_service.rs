//! Session-bound cart facade.
//!
//! # Responsibility
//! - Resolve (or create) the active cart for one request.
//! - Sequence item mutations against the repository and notify observers.
//!
//! # Invariants
//! - Every mutation is persisted before the call returns; nothing is cached
//!   except the resolved cart record.
//! - Item reads always re-query the repository.
//! - Only "not found" during cart and item resolution is recovered locally;
//!   every other repository or observer failure propagates unchanged.

use crate::config::{CartConfig, ConfigError, UpdateMode};
use crate::hooks::{AddEvent, CartEvent, CartObservers, HookError, HookPoint};
use crate::model::cart::{CartId, CartRecord, ItemRecord, NewItem, OwnerId, ProductId};
use crate::model::money::Money;
use crate::model::quantity::QuantityInput;
use crate::repo::cart_repo::{CartRepository, RepoError};
use crate::session::CartRequest;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CartResult<T> = Result<T, CartError>;

/// Error surface of cart operations.
#[derive(Debug)]
pub enum CartError {
    /// `remove`/`update` targeted a product with no item in this cart.
    ItemDoesNotExist(ProductId),
    /// An amount or quantity would leave the `i64` range; nothing was written.
    Overflow {
        product: Option<ProductId>,
        what: &'static str,
    },
    Config(ConfigError),
    Repo(RepoError),
    Hook(HookError),
}

impl Display for CartError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemDoesNotExist(product) => write!(f, "item does not exist: {product}"),
            Self::Overflow {
                product: Some(product),
                what,
            } => write!(f, "{what} overflows for product {product}"),
            Self::Overflow {
                product: None,
                what,
            } => write!(f, "{what} overflows"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Hook(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CartError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ItemDoesNotExist(_) | Self::Overflow { .. } => None,
            Self::Config(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Hook(err) => Some(err),
        }
    }
}

impl From<RepoError> for CartError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ConfigError> for CartError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<HookError> for CartError {
    fn from(value: HookError) -> Self {
        Self::Hook(value)
    }
}

/// How the backing cart was obtained at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartResolution {
    /// The session pointed at an open cart of this user.
    Resumed,
    /// No usable session entry; a new cart was stored and linked.
    Created,
}

/// Per-request cart facade over a [`CartRepository`].
pub struct Cart<R: CartRepository> {
    repo: R,
    cart: CartRecord,
    resolution: CartResolution,
    observers: CartObservers,
    config: CartConfig,
}

impl<R: CartRepository> Cart<R> {
    /// Resolves the active cart with default config and no observers.
    pub fn new(repo: R, request: &mut CartRequest<'_>) -> CartResult<Self> {
        Self::open(repo, request, CartObservers::new(), CartConfig::default())
    }

    /// Resolves the active cart for `request`, creating one when needed.
    ///
    /// The session's cart id is honored only when it names an open cart owned
    /// by the request user. Otherwise a new cart is created and its id is
    /// written back to the session.
    pub fn open(
        repo: R,
        request: &mut CartRequest<'_>,
        observers: CartObservers,
        config: CartConfig,
    ) -> CartResult<Self> {
        config.validate()?;
        let owner = request.user();
        let key = config.session_key.as_str();

        let existing = match request.stored_cart_id(key) {
            Some(id) => {
                let found = repo.find_active_cart(id, owner)?;
                if found.is_none() {
                    debug!(
                        "event=cart_resolve module=cart status=miss cart_id={id} reason=not_open_or_not_owned"
                    );
                }
                found
            }
            None => None,
        };

        let (cart, resolution) = match existing {
            Some(cart) => (cart, CartResolution::Resumed),
            None => {
                let cart = repo.create_cart(owner)?;
                request.store_cart_id(key, cart.id);
                (cart, CartResolution::Created)
            }
        };

        info!(
            "event=cart_resolve module=cart status=ok cart_id={} resolution={:?} observers={}",
            cart.id,
            resolution,
            observers.len()
        );

        Ok(Self {
            repo,
            cart,
            resolution,
            observers,
            config,
        })
    }

    pub fn id(&self) -> CartId {
        self.cart.id
    }

    pub fn owner(&self) -> OwnerId {
        self.cart.owner
    }

    /// Backing cart record as last persisted by this facade.
    pub fn record(&self) -> &CartRecord {
        &self.cart
    }

    pub fn resolution(&self) -> CartResolution {
        self.resolution
    }

    pub fn config(&self) -> &CartConfig {
        &self.config
    }

    pub fn is_checked_out(&self) -> bool {
        self.cart.checked_out
    }

    /// Current items, freshly read from the repository.
    pub fn items(&self) -> CartResult<Vec<ItemRecord>> {
        Ok(self.repo.list_items(self.cart.id)?)
    }

    /// Lazy item sequence; the repository is queried when iteration starts.
    pub fn iter(&self) -> CartItems<'_, R> {
        CartItems {
            cart: self,
            state: ItemsState::Pending,
        }
    }

    pub fn get_item(&self, product: ProductId) -> CartResult<Option<ItemRecord>> {
        Ok(self.repo.find_item(self.cart.id, product)?)
    }

    /// Sum of item totals; zero for an empty cart.
    pub fn get_total(&self) -> CartResult<Money> {
        let items = self.items()?;
        Money::checked_sum(items.iter().map(|item| item.total_price)).ok_or(CartError::Overflow {
            product: None,
            what: "cart total",
        })
    }

    /// Sum of item quantities.
    pub fn item_count(&self) -> CartResult<i64> {
        self.items()?
            .iter()
            .try_fold(0i64, |count, item| count.checked_add(item.quantity))
            .ok_or(CartError::Overflow {
                product: None,
                what: "item count",
            })
    }

    pub fn is_empty(&self) -> CartResult<bool> {
        Ok(self.items()?.is_empty())
    }

    /// Adds `quantity` of `product`.
    ///
    /// Malformed quantities become 1. A repeat add increments the existing
    /// item's quantity and keeps its original unit price. An add whose
    /// quantity or line total would overflow is rejected before any write.
    pub fn add(
        &self,
        product: ProductId,
        unit_price: Money,
        quantity: impl Into<QuantityInput>,
    ) -> CartResult<()> {
        let raw_quantity = quantity.into();
        let event = AddEvent {
            cart: &self.cart,
            product,
            unit_price,
            quantity: &raw_quantity,
        };
        self.observers.emit_add(HookPoint::PreAdd, &event)?;

        let quantity = raw_quantity.coerce();
        match self.repo.find_item(self.cart.id, product)? {
            None => {
                ensure_line_total(product, unit_price, quantity)?;
                self.repo.create_item(&NewItem {
                    cart_id: self.cart.id,
                    product,
                    unit_price,
                    quantity,
                })?;
                debug!(
                    "event=cart_add module=cart status=ok cart_id={} product={product} quantity={quantity} mode=create",
                    self.cart.id
                );
            }
            Some(item) => {
                if item.unit_price != unit_price {
                    warn!(
                        "event=cart_add module=cart status=ok cart_id={} product={product} price_mismatch=true kept_unit_price={} ignored_unit_price={unit_price}",
                        self.cart.id, item.unit_price
                    );
                }
                let merged = item.quantity.checked_add(quantity).ok_or(CartError::Overflow {
                    product: Some(product),
                    what: "item quantity",
                })?;
                ensure_line_total(product, item.unit_price, merged)?;
                self.repo.increment_item_quantity(item.id, quantity)?;
                debug!(
                    "event=cart_add module=cart status=ok cart_id={} product={product} quantity={quantity} mode=increment",
                    self.cart.id
                );
            }
        }

        self.observers.emit_add(HookPoint::PostAdd, &event)?;
        Ok(())
    }

    /// Deletes the item for `product`.
    pub fn remove(&self, product: ProductId) -> CartResult<()> {
        let item = self.require_item(product)?;
        self.repo.delete_item(item.id)?;
        debug!(
            "event=cart_remove module=cart status=ok cart_id={} product={product}",
            self.cart.id
        );
        Ok(())
    }

    /// Updates the item for `product` according to the configured mode.
    ///
    /// Under [`UpdateMode::Legacy`] an existing item is left untouched.
    pub fn update(
        &self,
        product: ProductId,
        quantity: impl Into<QuantityInput>,
        unit_price: Option<Money>,
    ) -> CartResult<()> {
        let mut item = self.require_item(product)?;

        match self.config.update_mode {
            UpdateMode::Legacy => {
                debug!(
                    "event=cart_update module=cart status=ok cart_id={} product={product} mode=legacy changed=false",
                    self.cart.id
                );
            }
            UpdateMode::Apply => {
                item.quantity = quantity.into().coerce();
                if let Some(price) = unit_price {
                    item.unit_price = price;
                }
                ensure_line_total(product, item.unit_price, item.quantity)?;
                self.repo.save_item(&item)?;
                debug!(
                    "event=cart_update module=cart status=ok cart_id={} product={product} mode=apply quantity={}",
                    self.cart.id, item.quantity
                );
            }
        }

        Ok(())
    }

    /// Deletes every item of this cart and returns how many were removed.
    pub fn clear(&self) -> CartResult<usize> {
        let event = CartEvent { cart: &self.cart };
        self.observers.emit_cart(HookPoint::PreClear, &event)?;

        let items = self.items()?;
        for item in &items {
            self.repo.delete_item(item.id)?;
        }

        info!(
            "event=cart_clear module=cart status=ok cart_id={} removed={}",
            self.cart.id,
            items.len()
        );
        self.observers.emit_cart(HookPoint::PostClear, &event)?;
        Ok(items.len())
    }

    /// Marks the cart as checked out and persists it.
    ///
    /// The cart will not be resolved from a session afterwards.
    pub fn checkout(&mut self) -> CartResult<bool> {
        self.observers
            .emit_cart(HookPoint::PreCheckout, &CartEvent { cart: &self.cart })?;

        let mut updated = self.cart.clone();
        updated.checked_out = true;
        self.repo.save_cart(&updated)?;
        self.cart = updated;

        info!(
            "event=cart_checkout module=cart status=ok cart_id={}",
            self.cart.id
        );
        self.observers
            .emit_cart(HookPoint::PostCheckout, &CartEvent { cart: &self.cart })?;
        Ok(true)
    }

    fn require_item(&self, product: ProductId) -> CartResult<ItemRecord> {
        self.repo
            .find_item(self.cart.id, product)?
            .ok_or(CartError::ItemDoesNotExist(product))
    }
}

fn ensure_line_total(product: ProductId, unit_price: Money, quantity: i64) -> CartResult<()> {
    unit_price
        .checked_mul(quantity)
        .map(|_| ())
        .ok_or(CartError::Overflow {
            product: Some(product),
            what: "item total",
        })
}

impl<R: CartRepository> std::fmt::Debug for Cart<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart")
            .field("cart", &self.cart)
            .field("resolution", &self.resolution)
            .field("observers", &self.observers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Item sequence produced by [`Cart::iter`].
pub struct CartItems<'a, R: CartRepository> {
    cart: &'a Cart<R>,
    state: ItemsState,
}

enum ItemsState {
    Pending,
    Loaded(std::vec::IntoIter<ItemRecord>),
    Done,
}

impl<R: CartRepository> Iterator for CartItems<'_, R> {
    type Item = CartResult<ItemRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if let ItemsState::Pending = self.state {
            match self.cart.items() {
                Ok(items) => self.state = ItemsState::Loaded(items.into_iter()),
                Err(err) => {
                    self.state = ItemsState::Done;
                    return Some(Err(err));
                }
            }
        }

        match &mut self.state {
            ItemsState::Loaded(items) => items.next().map(Ok),
            ItemsState::Pending | ItemsState::Done => None,
        }
    }
}

impl<'a, R: CartRepository> IntoIterator for &'a Cart<R> {
    type Item = CartResult<ItemRecord>;
    type IntoIter = CartItems<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
