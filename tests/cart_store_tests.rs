use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use shopcart_rs::models::{Cart, CartError, CartOperation, OUT_OF_STOCK_MESSAGE};
use shopcart_rs::repositories::FileCartRepository;
use shopcart_rs::services::{InMemoryInventory, Notification, TracingNotifier};
use shopcart_rs::{CartStore, MutationOutcome};
use tokio::sync::broadcast;

mod common;
use common::*;

fn cart_of(lines: &[(u64, u32)]) -> Cart {
    let catalog = catalog();
    Cart::from(
        lines
            .iter()
            .map(|&(id, amount)| {
                let (_, title, price, _) = catalog
                    .iter()
                    .copied()
                    .find(|(cid, ..)| *cid == id)
                    .unwrap();
                catalog_product(id, title, price).into_cart_product(amount)
            })
            .collect::<Vec<_>>(),
    )
}

async fn next_notification(receiver: &mut broadcast::Receiver<Notification>) -> Notification {
    tokio::time::timeout(Duration::from_secs(1), receiver.recv())
        .await
        .expect("No notification received")
        .unwrap()
}

#[tokio::test]
async fn test_add_to_empty_cart() {
    let fixture = StoreFixture::new().await;
    fixture.inventory.set_stock(1, 5).await;

    let outcome = fixture.store.add_product(1).await;

    assert!(outcome.is_committed());
    let cart = fixture.store.cart();
    assert_eq!(cart.len(), 1);
    let line = cart.get(1).unwrap();
    assert_eq!(line.amount, 1);
    assert_eq!(line.title, "Tênis de Caminhada Leve Confortável");
    assert_eq!(line.price, dec!(179.90));
    assert_eq!(fixture.persisted_cart().await.unwrap(), *cart);
}

#[tokio::test]
async fn test_add_beyond_stock_reports_out_of_stock() {
    let fixture = StoreFixture::with_cart(&cart_of(&[(1, 5)])).await;
    fixture.inventory.set_stock(1, 5).await;
    let mut notifications = fixture.notifier.subscribe();

    let outcome = fixture.store.add_product(1).await;

    assert!(matches!(
        outcome,
        MutationOutcome::Rejected(CartError::OutOfStock { .. })
    ));
    assert_eq!(*fixture.store.cart(), cart_of(&[(1, 5)]));
    assert_eq!(
        next_notification(&mut notifications).await.message,
        OUT_OF_STOCK_MESSAGE
    );
}

#[tokio::test]
async fn test_remove_product_line() {
    let fixture = StoreFixture::with_cart(&cart_of(&[(1, 2)])).await;

    let outcome = fixture.store.remove_product(1).await;

    assert!(outcome.is_committed());
    assert!(fixture.store.cart().is_empty());
    assert!(fixture.persisted_cart().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_from_empty_cart_reports_failure() {
    let fixture = StoreFixture::new().await;
    let mut notifications = fixture.notifier.subscribe();

    let outcome = fixture.store.remove_product(1).await;

    assert!(matches!(
        outcome.error(),
        Some(CartError::ProductNotFound {
            operation: CartOperation::Remove,
            ..
        })
    ));
    assert!(fixture.store.cart().is_empty());
    assert_eq!(
        next_notification(&mut notifications).await.message,
        "Failed to remove product"
    );
}

#[tokio::test]
async fn test_update_to_zero_is_silently_ignored() {
    let fixture = StoreFixture::with_cart(&cart_of(&[(1, 2), (2, 1)])).await;
    let mut notifications = fixture.notifier.subscribe();

    let outcome = fixture.store.update_product_amount(1, 0).await;

    assert!(matches!(outcome, MutationOutcome::Skipped));
    assert_eq!(*fixture.store.cart(), cart_of(&[(1, 2), (2, 1)]));
    assert!(matches!(
        notifications.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn test_line_order_is_preserved() {
    let fixture = StoreFixture::new().await;

    for id in [2, 1, 3, 1] {
        assert!(fixture.store.add_product(id).await.is_committed());
    }
    assert!(fixture.store.update_product_amount(2, 4).await.is_committed());

    let ids: Vec<u64> = fixture.store.cart().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2, 1, 3]);
    assert_eq!(fixture.store.cart().amount_of(1), 2);
    assert_eq!(fixture.store.cart().amount_of(2), 4);
}

#[tokio::test]
async fn test_unknown_product_add_fails() {
    let fixture = StoreFixture::new().await;
    let mut notifications = fixture.notifier.subscribe();

    let outcome = fixture.store.add_product(999).await;

    assert_eq!(outcome.error().map(CartError::kind), Some("lookup_failed"));
    assert_eq!(
        next_notification(&mut notifications).await.message,
        "Failed to add product"
    );
}

#[tokio::test]
async fn test_sold_out_product_cannot_be_added() {
    let fixture = StoreFixture::new().await;

    let outcome = fixture.store.add_product(4).await;

    assert_eq!(outcome.error().map(CartError::kind), Some("out_of_stock"));
    assert!(fixture.store.cart().is_empty());
    assert!(fixture.persisted_cart().await.is_none());
}

#[tokio::test]
async fn test_stock_drop_blocks_further_adds() {
    let fixture = StoreFixture::new().await;
    assert!(fixture.store.add_product(2).await.is_committed());
    assert!(fixture.store.add_product(2).await.is_committed());

    fixture.inventory.set_stock(2, 2).await;

    assert!(fixture.store.add_product(2).await.is_rejected());
    assert_eq!(fixture.store.cart().amount_of(2), 2);
}

#[tokio::test]
async fn test_concurrent_mutations_respect_stock() {
    let fixture = StoreFixture::new().await;

    // Product 2 has five units in stock
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = fixture.store.clone();
            tokio::spawn(async move { store.add_product(2).await.is_committed() })
        })
        .collect();

    let mut committed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            committed += 1;
        }
    }

    assert_eq!(committed, 5);
    assert_eq!(fixture.store.cart().amount_of(2), 5);
    assert_eq!(
        fixture.persisted_cart().await.unwrap().amount_of(2),
        5
    );
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let inventory = seeded_inventory().await;

    {
        let store = CartStore::open(
            inventory.clone(),
            inventory.clone(),
            Arc::new(FileCartRepository::new(dir.path(), "shopcart:cart")),
            Arc::new(TracingNotifier),
        )
        .await
        .unwrap();
        store.add_product(1).await;
        store.add_product(3).await;
        store.update_product_amount(3, 2).await;
    }

    let reopened = CartStore::open(
        inventory.clone(),
        inventory,
        Arc::new(FileCartRepository::new(dir.path(), "shopcart:cart")),
        Arc::new(TracingNotifier),
    )
    .await
    .unwrap();

    assert_eq!(*reopened.cart(), cart_of(&[(1, 1), (3, 2)]));
    assert_eq!(reopened.cart().subtotal(), dec!(619.70));
}

#[tokio::test]
async fn test_subscriber_sees_each_commit() {
    let fixture = StoreFixture::new().await;
    let mut updates = fixture.store.subscribe();

    fixture.store.add_product(1).await;
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().amount_of(1), 1);

    fixture.store.remove_product(2).await;
    assert!(!updates.has_changed().unwrap());

    fixture.store.remove_product(1).await;
    updates.changed().await.unwrap();
    assert!(updates.borrow_and_update().is_empty());
}

#[tokio::test]
async fn test_empty_inventory_rejects_everything() {
    let inventory = Arc::new(InMemoryInventory::new());
    let store = CartStore::open(
        inventory.clone(),
        inventory,
        Arc::new(shopcart_rs::repositories::InMemoryCartRepository::new()),
        Arc::new(TracingNotifier),
    )
    .await
    .unwrap();

    assert!(store.add_product(1).await.is_rejected());
    assert!(store.update_product_amount(1, 1).await.is_rejected());
    assert!(store.remove_product(1).await.is_rejected());
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_lines_at_full_stock_are_counted_with_metrics_attached() {
    let inventory = seeded_inventory().await;
    inventory.set_stock(1, u32::MAX).await;
    inventory.set_stock(2, u32::MAX).await;
    let metrics = Arc::new(shopcart_rs::Metrics::new().unwrap());
    let store = CartStore::open(
        inventory.clone(),
        inventory,
        Arc::new(shopcart_rs::repositories::InMemoryCartRepository::new()),
        Arc::new(TracingNotifier),
    )
    .await
    .unwrap()
    .with_metrics(metrics.clone());

    store.add_product(1).await;
    store.add_product(2).await;
    let max = i64::from(u32::MAX);
    assert!(store.update_product_amount(1, max).await.is_committed());
    assert!(store.update_product_amount(2, max).await.is_committed());

    let summary = store.cart().summary();
    assert_eq!(summary.total_items, 2 * u64::from(u32::MAX));
    assert!(metrics
        .encode()
        .unwrap()
        .contains("cart_items 8589934590"));
}
