use cart_core::db::open_db_in_memory;
use cart_core::{
    AddEvent, Cart, CartConfig, CartError, CartEvent, CartObserver, CartObservers, CartRequest,
    HookError, HookPoint, HookResult, MemorySession, Money, QuantityInput, SqliteCartRepository,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
    fail_on: Option<HookPoint>,
}

impl Recorder {
    fn failing_on(point: HookPoint) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail_on: Some(point),
        }
    }

    fn record(&self, point: HookPoint, detail: String) -> HookResult {
        self.events.lock().unwrap().push(format!("{point}:{detail}"));
        if self.fail_on == Some(point) {
            return Err(HookError::new("listener refused"));
        }
        Ok(())
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

fn describe_add(event: &AddEvent<'_>) -> String {
    let quantity = match event.quantity {
        QuantityInput::Integer(value) => value.to_string(),
        QuantityInput::Text(value) => format!("{value:?}"),
        other => format!("{other:?}"),
    };
    format!("{}x{}@{}", quantity, event.product, event.unit_price)
}

impl CartObserver for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn pre_add(&self, event: &AddEvent<'_>) -> HookResult {
        self.record(HookPoint::PreAdd, describe_add(event))
    }

    fn post_add(&self, event: &AddEvent<'_>) -> HookResult {
        self.record(HookPoint::PostAdd, describe_add(event))
    }

    fn pre_clear(&self, event: &CartEvent<'_>) -> HookResult {
        self.record(HookPoint::PreClear, event.cart.id.to_string())
    }

    fn post_clear(&self, event: &CartEvent<'_>) -> HookResult {
        self.record(HookPoint::PostClear, event.cart.id.to_string())
    }

    fn pre_checkout(&self, event: &CartEvent<'_>) -> HookResult {
        self.record(
            HookPoint::PreCheckout,
            format!("{}:{}", event.cart.id, event.cart.checked_out),
        )
    }

    fn post_checkout(&self, event: &CartEvent<'_>) -> HookResult {
        self.record(
            HookPoint::PostCheckout,
            format!("{}:{}", event.cart.id, event.cart.checked_out),
        )
    }
}

fn observed_cart<'c>(
    repo: &'c SqliteCartRepository<'c>,
    recorder: Arc<Recorder>,
) -> Cart<&'c SqliteCartRepository<'c>> {
    let mut session = MemorySession::new();
    let mut request = CartRequest::new(&mut session, Uuid::new_v4());
    let observers = CartObservers::new().with(recorder);
    Cart::open(repo, &mut request, observers, CartConfig::default()).unwrap()
}

#[test]
fn add_emits_pre_and_post_with_raw_arguments() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCartRepository::new(&conn);
    let recorder = Arc::new(Recorder::default());
    let cart = observed_cart(&repo, Arc::clone(&recorder));
    let product = Uuid::new_v4();

    cart.add(product, Money::from_minor(200), "x").unwrap();

    let expected = format!("\"x\"x{product}@2.00");
    assert_eq!(
        recorder.events(),
        vec![format!("pre_add:{expected}"), format!("post_add:{expected}")]
    );
}

#[test]
fn remove_and_update_emit_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCartRepository::new(&conn);
    let recorder = Arc::new(Recorder::default());
    let cart = observed_cart(&repo, Arc::clone(&recorder));
    let product = Uuid::new_v4();

    cart.add(product, Money::from_minor(100), 1).unwrap();
    let after_add = recorder.events().len();
    cart.update(product, 2, None).unwrap();
    cart.remove(product).unwrap();

    assert_eq!(recorder.events().len(), after_add);
}

#[test]
fn clear_emits_pre_then_post_once_each() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCartRepository::new(&conn);
    let recorder = Arc::new(Recorder::default());
    let cart = observed_cart(&repo, Arc::clone(&recorder));
    let id = cart.id();

    cart.clear().unwrap();

    assert_eq!(
        recorder.events(),
        vec![format!("pre_clear:{id}"), format!("post_clear:{id}")]
    );
}

#[test]
fn checkout_emits_post_checkout_after_flag_is_persisted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCartRepository::new(&conn);
    let recorder = Arc::new(Recorder::default());
    let mut cart = observed_cart(&repo, Arc::clone(&recorder));
    let id = cart.id();

    cart.checkout().unwrap();

    assert_eq!(
        recorder.events(),
        vec![
            format!("pre_checkout:{id}:false"),
            format!("post_checkout:{id}:true"),
        ]
    );
}

#[test]
fn failing_pre_add_aborts_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCartRepository::new(&conn);
    let recorder = Arc::new(Recorder::failing_on(HookPoint::PreAdd));
    let cart = observed_cart(&repo, Arc::clone(&recorder));

    let err = cart.add(Uuid::new_v4(), Money::from_minor(100), 1).unwrap_err();

    match err {
        CartError::Hook(hook) => {
            assert_eq!(hook.observer, "recorder");
            assert_eq!(hook.point, Some(HookPoint::PreAdd));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(cart.is_empty().unwrap());
}

#[test]
fn failing_post_add_surfaces_after_the_write() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCartRepository::new(&conn);
    let recorder = Arc::new(Recorder::failing_on(HookPoint::PostAdd));
    let cart = observed_cart(&repo, Arc::clone(&recorder));
    let product = Uuid::new_v4();

    let err = cart.add(product, Money::from_minor(100), 1).unwrap_err();

    assert!(matches!(err, CartError::Hook(_)));
    assert_eq!(cart.get_item(product).unwrap().unwrap().quantity, 1);
}

#[test]
fn failing_pre_checkout_keeps_cart_open() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCartRepository::new(&conn);
    let recorder = Arc::new(Recorder::failing_on(HookPoint::PreCheckout));
    let mut cart = observed_cart(&repo, Arc::clone(&recorder));

    assert!(matches!(cart.checkout(), Err(CartError::Hook(_))));
    assert!(!cart.is_checked_out());
    assert!(cart.record().is_open());
}

#[test]
fn failing_pre_clear_keeps_items() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCartRepository::new(&conn);
    let recorder = Arc::new(Recorder::failing_on(HookPoint::PreClear));
    let cart = observed_cart(&repo, Arc::clone(&recorder));

    cart.add(Uuid::new_v4(), Money::from_minor(100), 2).unwrap();
    assert!(cart.clear().is_err());
    assert_eq!(cart.item_count().unwrap(), 2);
}
