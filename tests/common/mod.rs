#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::net::TcpListener;

use shopcart_rs::handlers::create_app;
use shopcart_rs::models::{Cart, CatalogProduct, ProductId};
use shopcart_rs::repositories::{CartRepository, InMemoryCartRepository};
use shopcart_rs::services::{BroadcastNotifier, InMemoryInventory};
use shopcart_rs::{CartStore, Metrics};

/// Catalog used across the tests: (id, title, price, stock)
pub fn catalog() -> Vec<(ProductId, &'static str, Decimal, u32)> {
    vec![
        (1, "Tênis de Caminhada Leve Confortável", dec!(179.90), 3),
        (2, "Tênis VR Caminhada Confortável Detalhes Couro", dec!(139.90), 5),
        (3, "Tênis Adidas Duramo Lite 2.0", dec!(219.90), 2),
        (4, "Tênis Adidas Sold Out", dec!(99.90), 0),
    ]
}

pub fn catalog_product(id: ProductId, title: &str, price: Decimal) -> CatalogProduct {
    CatalogProduct {
        id,
        title: title.to_string(),
        price,
        image_url: format!("https://cdn.example.com/shoes/{}.jpg", id),
    }
}

pub async fn seeded_inventory() -> Arc<InMemoryInventory> {
    let inventory = Arc::new(InMemoryInventory::new());
    for (id, title, price, stock) in catalog() {
        inventory
            .insert(catalog_product(id, title, price), stock)
            .await;
    }
    inventory
}

/// A store wired to in-memory collaborators
pub struct StoreFixture {
    pub store: Arc<CartStore>,
    pub inventory: Arc<InMemoryInventory>,
    pub repository: Arc<InMemoryCartRepository>,
    pub notifier: Arc<BroadcastNotifier>,
}

impl StoreFixture {
    pub async fn new() -> Self {
        Self::with_repository(Arc::new(InMemoryCartRepository::new())).await
    }

    pub async fn with_cart(cart: &Cart) -> Self {
        let repository = InMemoryCartRepository::with_cart(cart).expect("Failed to seed cart");
        Self::with_repository(Arc::new(repository)).await
    }

    pub async fn with_repository(repository: Arc<InMemoryCartRepository>) -> Self {
        let inventory = seeded_inventory().await;
        let notifier = Arc::new(BroadcastNotifier::new(32));
        let store = CartStore::open(
            inventory.clone(),
            inventory.clone(),
            repository.clone(),
            notifier.clone(),
        )
        .await
        .expect("Failed to open cart store");

        Self {
            store: Arc::new(store),
            inventory,
            repository,
            notifier,
        }
    }

    pub async fn persisted_cart(&self) -> Option<Cart> {
        self.repository
            .load_cart()
            .await
            .expect("Failed to read persisted cart")
    }
}

/// The full application served on an ephemeral port
pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub fixture: StoreFixture,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let fixture = StoreFixture::new().await;
        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
        let app = create_app(fixture.store.clone(), metrics, Duration::from_secs(5));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server failed");
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{}", addr),
            fixture,
        }
    }
}
