//! In-memory store and request helpers for handler tests.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use crate::api::{app, state::AppState};
use crate::db::PoolStats;
use crate::error::DataError;
use crate::models::{Product, ProductRequest};
use crate::services::{health, HealthReport, ProductStore};

#[derive(Clone, Default)]
pub struct MemoryStore {
    products: Arc<Mutex<Vec<Product>>>,
    writes: Arc<AtomicUsize>,
    failing: bool,
    delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(Mutex::new(products)),
            ..Self::default()
        }
    }

    /// Every operation fails as if the database were unreachable.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Health checks stall for `delay` before answering.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn products(&self) -> Vec<Product> {
        self.products.lock().unwrap().clone()
    }

    /// Number of create/update/delete calls that reached the store.
    pub fn calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), DataError> {
        if self.failing {
            return Err(DataError::Query(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, DataError> {
        self.check()?;
        Ok(self.products())
    }

    async fn get_product(&self, id: &str) -> Result<Product, DataError> {
        self.check()?;
        self.products()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(DataError::Query(sqlx::Error::RowNotFound))
    }

    async fn create_product(&self, req: ProductRequest) -> Result<(), DataError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.products.lock().unwrap().push(Product {
            id: uuid::Uuid::new_v4().to_string(),
            name: req.name,
            price: req.price,
        });
        Ok(())
    }

    async fn update_product(&self, id: &str, req: ProductRequest) -> Result<(), DataError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        for product in self.products.lock().unwrap().iter_mut().filter(|p| p.id == id) {
            product.name = req.name.clone();
            product.price = req.price;
        }
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> Result<(), DataError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.products.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    async fn health_check(&self) -> HealthReport {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return health::down("connection refused");
        }
        health::diagnose(&PoolStats::default())
    }
}

/// Sends a request, labelling any body as `application/json`.
pub async fn send(
    store: MemoryStore,
    method: &str,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    call(app(AppState::new(store)), request).await
}

/// Sends a body with no Content-Type header at all.
pub async fn send_untyped(
    store: MemoryStore,
    method: &str,
    uri: &str,
    body: &str,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap();

    call(app(AppState::new(store)), request).await
}

/// Runs one request through a router and decodes the JSON reply.
pub async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&bytes).unwrap())
}

pub async fn get(store: MemoryStore, uri: &str) -> (StatusCode, Value) {
    send(store, "GET", uri, None).await
}
