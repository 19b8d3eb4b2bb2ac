//! Synchronous pre/post notifications around cart mutations.
//!
//! # Responsibility
//! - Define the observer contract for cart publish points.
//! - Dispatch events in registration order on the caller's thread.
//!
//! # Invariants
//! - Observers are injected per cart; there is no process-wide registry.
//! - The first failing observer stops dispatch and its error aborts the
//!   triggering cart operation.

use crate::model::cart::{CartRecord, ProductId};
use crate::model::money::Money;
use crate::model::quantity::QuantityInput;
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type HookResult = Result<(), HookError>;

/// Publish points exposed by the cart facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    PreAdd,
    PostAdd,
    PreClear,
    PostClear,
    PreCheckout,
    PostCheckout,
}

impl HookPoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreAdd => "pre_add",
            Self::PostAdd => "post_add",
            Self::PreClear => "pre_clear",
            Self::PostClear => "post_clear",
            Self::PreCheckout => "pre_checkout",
            Self::PostCheckout => "post_checkout",
        }
    }
}

impl Display for HookPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observer failure raised from a hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookError {
    pub observer: String,
    pub point: Option<HookPoint>,
    pub message: String,
}

impl HookError {
    /// Builds an error from inside an observer; dispatch fills in identity.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            observer: String::new(),
            point: None,
            message: message.into(),
        }
    }
}

impl Display for HookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.point {
            Some(point) => write!(
                f,
                "observer `{}` failed at {point}: {}",
                self.observer, self.message
            ),
            None => write!(f, "observer `{}` failed: {}", self.observer, self.message),
        }
    }
}

impl Error for HookError {}

/// Arguments of an add notification.
///
/// `quantity` is the caller's raw input, before coercion.
#[derive(Debug, Clone, Copy)]
pub struct AddEvent<'a> {
    pub cart: &'a CartRecord,
    pub product: ProductId,
    pub unit_price: Money,
    pub quantity: &'a QuantityInput,
}

/// Arguments of a whole-cart notification (clear, checkout).
#[derive(Debug, Clone, Copy)]
pub struct CartEvent<'a> {
    pub cart: &'a CartRecord,
}

/// Listener for cart publish points. Every method defaults to a no-op.
pub trait CartObserver {
    /// Stable name used in logs and errors.
    fn name(&self) -> &str;

    fn pre_add(&self, _event: &AddEvent<'_>) -> HookResult {
        Ok(())
    }

    fn post_add(&self, _event: &AddEvent<'_>) -> HookResult {
        Ok(())
    }

    fn pre_clear(&self, _event: &CartEvent<'_>) -> HookResult {
        Ok(())
    }

    fn post_clear(&self, _event: &CartEvent<'_>) -> HookResult {
        Ok(())
    }

    fn pre_checkout(&self, _event: &CartEvent<'_>) -> HookResult {
        Ok(())
    }

    fn post_checkout(&self, _event: &CartEvent<'_>) -> HookResult {
        Ok(())
    }
}

/// Ordered set of observers handed to a cart at construction.
#[derive(Clone, Default)]
pub struct CartObservers {
    observers: Vec<Arc<dyn CartObserver>>,
}

impl CartObservers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observer; dispatch follows registration order.
    pub fn register(&mut self, observer: Arc<dyn CartObserver>) {
        self.observers.push(observer);
    }

    pub fn with(mut self, observer: Arc<dyn CartObserver>) -> Self {
        self.register(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Returns observer names in dispatch order.
    pub fn names(&self) -> Vec<String> {
        self.observers
            .iter()
            .map(|observer| observer.name().to_string())
            .collect()
    }

    pub(crate) fn emit_add(&self, point: HookPoint, event: &AddEvent<'_>) -> HookResult {
        self.dispatch(point, event.cart, |observer| match point {
            HookPoint::PreAdd => observer.pre_add(event),
            HookPoint::PostAdd => observer.post_add(event),
            HookPoint::PreClear
            | HookPoint::PostClear
            | HookPoint::PreCheckout
            | HookPoint::PostCheckout => Ok(()),
        })
    }

    pub(crate) fn emit_cart(&self, point: HookPoint, event: &CartEvent<'_>) -> HookResult {
        self.dispatch(point, event.cart, |observer| match point {
            HookPoint::PreClear => observer.pre_clear(event),
            HookPoint::PostClear => observer.post_clear(event),
            HookPoint::PreCheckout => observer.pre_checkout(event),
            HookPoint::PostCheckout => observer.post_checkout(event),
            HookPoint::PreAdd | HookPoint::PostAdd => Ok(()),
        })
    }

    fn dispatch(
        &self,
        point: HookPoint,
        cart: &CartRecord,
        call: impl Fn(&dyn CartObserver) -> HookResult,
    ) -> HookResult {
        if self.is_empty() {
            return Ok(());
        }
        for observer in &self.observers {
            debug!(
                "event=hook_dispatch module=hooks status=start point={point} observer={} cart_id={}",
                observer.name(),
                cart.id
            );
            if let Err(mut err) = call(observer.as_ref()) {
                err.observer = observer.name().to_string();
                err.point = Some(point);
                error!(
                    "event=hook_dispatch module=hooks status=error point={point} observer={} cart_id={} error={}",
                    err.observer, cart.id, err.message
                );
                return Err(err);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for CartObservers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartObservers")
            .field("observers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{CartEvent, CartObserver, CartObservers, HookError, HookPoint, HookResult};
    use crate::model::cart::CartRecord;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    struct Probe {
        name: &'static str,
        fail: bool,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl CartObserver for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn pre_clear(&self, _event: &CartEvent<'_>) -> HookResult {
            self.calls.lock().unwrap().push(self.name.to_string());
            if self.fail {
                return Err(HookError::new("refused"));
            }
            Ok(())
        }
    }

    fn cart() -> CartRecord {
        CartRecord {
            id: 7,
            owner: Uuid::new_v4(),
            created_at: 0,
            checked_out: false,
        }
    }

    #[test]
    fn dispatch_stops_at_first_failure_and_tags_error() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let observers = CartObservers::new()
            .with(Arc::new(Probe {
                name: "first",
                fail: false,
                calls: Arc::clone(&calls),
            }))
            .with(Arc::new(Probe {
                name: "second",
                fail: true,
                calls: Arc::clone(&calls),
            }))
            .with(Arc::new(Probe {
                name: "third",
                fail: false,
                calls: Arc::clone(&calls),
            }));

        let record = cart();
        let err = observers
            .emit_cart(HookPoint::PreClear, &CartEvent { cart: &record })
            .unwrap_err();

        assert_eq!(err.observer, "second");
        assert_eq!(err.point, Some(HookPoint::PreClear));
        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
        assert!(err.to_string().contains("pre_clear"));
    }

    #[test]
    fn unimplemented_points_are_no_ops() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let observers = CartObservers::new().with(Arc::new(Probe {
            name: "only_clear",
            fail: true,
            calls: Arc::clone(&calls),
        }));

        let record = cart();
        observers
            .emit_cart(HookPoint::PostCheckout, &CartEvent { cart: &record })
            .unwrap();
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(observers.names(), vec!["only_clear"]);
        assert_eq!(observers.len(), 1);
        assert!(CartObservers::new().is_empty());
    }
}
