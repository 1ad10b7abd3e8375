//! Guest-cart persistence tests: debounced local writes, flush hooks, and
//! fresh-session round-trips through the JSON file store.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use axle_cart::auth::{AuthHandle, auth_channel};
use axle_cart::service::{AddItem, CartService};
use axle_cart::store::{JsonFileStore, LocalStore, MemoryStore};
use axle_core::ProductId;
use rust_decimal::Decimal;

use axle_integration_tests::{ScriptedRemote, eventually};

const DEBOUNCE: Duration = Duration::from_millis(20);

fn item(product: &str, price: i64) -> AddItem {
    AddItem {
        product_id: Some(ProductId::new(product)),
        name: Some(format!("{product} name")),
        price: Some(Decimal::new(price, 0)),
        image: None,
        category: None,
    }
}

fn guest_engine(store: Arc<dyn LocalStore>) -> (AuthHandle, CartService) {
    let (auth, rx) = auth_channel();
    let service = CartService::start(store, Arc::new(ScriptedRemote::new()), rx, DEBOUNCE);
    (auth, service)
}

#[tokio::test]
async fn guest_cart_round_trips_across_sessions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cart.json");

    {
        let (_auth, cart) = guest_engine(Arc::new(JsonFileStore::new(path.clone())));
        cart.load().await;
        cart.add(item("brake-pad", 49), 2);
        cart.add(item("oil-filter", 12), 1);
        cart.wait_for_save().await;
    }

    // Fresh session, same store: the cart comes back equal by
    // product and quantity.
    let (_auth, cart) = guest_engine(Arc::new(JsonFileStore::new(path)));
    cart.load().await;

    assert_eq!(cart.total_items(), 3);
    let lines = cart.lines();
    assert_eq!(lines.len(), 2);
    assert!(
        lines
            .iter()
            .any(|l| l.product_id == ProductId::new("brake-pad") && l.quantity == 2)
    );
    assert_eq!(cart.total_price(), Decimal::new(110, 0));
}

#[tokio::test]
async fn rapid_adds_coalesce_into_one_local_write() {
    let store = Arc::new(MemoryStore::new());
    let (_auth, cart) = guest_engine(store.clone());

    for i in 0..5 {
        cart.add(item(&format!("part-{i}"), 10), 1);
    }

    eventually("debounced write lands", || store.save_count() > 0).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(store.save_count(), 1, "burst must coalesce into one write");
    let saved = store.load().expect("load").expect("saved value");
    assert_eq!(saved.len(), 5);
}

#[tokio::test]
async fn corrupt_local_cart_loads_as_empty_and_self_heals() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cart.json");
    fs::write(&path, "{definitely not json").expect("write garbage");

    let (_auth, cart) = guest_engine(Arc::new(JsonFileStore::new(path.clone())));
    cart.load().await;
    assert!(cart.is_empty(), "corrupt data must read as an empty cart");

    // The cart keeps working, and the next write replaces the garbage.
    cart.add(item("radiator", 210), 1);
    cart.wait_for_save().await;

    let store = JsonFileStore::new(path);
    let lines = store.load().expect("readable again").expect("saved");
    assert_eq!(lines.len(), 1);
}

#[tokio::test]
async fn clear_erases_the_local_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cart.json");

    let (_auth, cart) = guest_engine(Arc::new(JsonFileStore::new(path.clone())));
    cart.add(item("coolant", 22), 1);
    cart.wait_for_save().await;
    assert!(path.exists());

    cart.clear();
    cart.wait_for_save().await;
    assert!(!path.exists(), "clear must erase the persisted key");
}

#[tokio::test]
async fn force_save_lands_without_awaiting() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cart.json");

    let (_auth, cart) = guest_engine(Arc::new(JsonFileStore::new(path.clone())));
    cart.add(item("tie-rod", 48), 1);
    cart.force_save();

    eventually("forced write lands", || path.exists()).await;
}
