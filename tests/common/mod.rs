//! Shared harness for the HTTP integration tests.
//!
//! Tests run against a real PostgreSQL database named by `TEST_DATABASE_URL`.
//! When it is unset every test logs a notice and returns early.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceExt;

use stockroom_backend::{build_app, config::Config, database, state::AppState};

static COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
}

/// Builds the app against the test database, or `None` when no database is configured.
pub async fn spawn_app() -> Option<TestApp> {
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping database integration test");
        return None;
    };

    let config = Config::for_database(database_url);
    let pool = database::create_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to TEST_DATABASE_URL");
    database::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(TestApp {
        router: build_app(AppState::new(pool.clone(), config)),
        pool,
    })
}

/// Builds the app over a lazy pool that never connects. Only requests that are
/// rejected before reaching the database can be sent through it.
pub fn offline_app() -> TestApp {
    let database_url = "postgres://stockroom@127.0.0.1:1/offline".to_string();
    let pool = PgPoolOptions::new()
        .connect_lazy(&database_url)
        .expect("Failed to build lazy pool");
    let config = Config::for_database(database_url);

    TestApp {
        router: build_app(AppState::new(pool.clone(), config)),
        pool,
    }
}

pub fn in_record(product_id: i64, supplier_id: i64, quantity: f64, price: f64) -> Value {
    json!({
        "productId": product_id,
        "supplierId": supplier_id,
        "quantity": quantity,
        "price": price,
    })
}

pub fn out_record(product_id: i64, customer_id: i64, quantity: f64, price: f64) -> Value {
    json!({
        "productId": product_id,
        "customerId": customer_id,
        "quantity": quantity,
        "price": price,
    })
}

/// A sales-order body; each line is `(product_id, quantity)` in base units.
pub fn order_body(customer_id: i64, lines: &[(i64, f64)]) -> Value {
    let products: Vec<Value> = lines
        .iter()
        .map(|(product_id, quantity)| json!({ "productId": product_id, "quantity": quantity }))
        .collect();
    json!({ "customerId": customer_id, "products": products })
}

/// A name no other test (or earlier run) has used.
pub fn unique(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{prefix}-{}-{nanos}-{n}", std::process::id())
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    pub async fn create_category(&self) -> i64 {
        let (status, body) = self.post("/categories", json!({ "name": unique("category") })).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("category id")
    }

    pub async fn create_supplier(&self) -> i64 {
        let (status, body) = self.post("/suppliers", json!({ "name": unique("supplier") })).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("supplier id")
    }

    pub async fn create_customer(&self) -> i64 {
        let (status, body) = self
            .post("/customers", json!({ "name": unique("customer"), "phone": "13800000000" }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("customer id")
    }

    /// Product with the given base-unit price and opening stock.
    pub async fn create_product(&self, price: f64, stock: f64) -> i64 {
        let category_id = self.create_category().await;
        let (status, body) = self
            .post(
                "/products",
                json!({
                    "name": unique("product"),
                    "code": unique("P"),
                    "categoryId": category_id,
                    "price": price,
                    "stock": stock,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("product id")
    }

    pub async fn create_unit(&self, product_id: i64, name: &str, rate: f64, price: f64) -> i64 {
        let (status, body) = self
            .post(
                &format!("/products/{product_id}/units"),
                json!({ "unitName": name, "conversionRate": rate, "price": price }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("unit id")
    }

    pub async fn stock(&self, product_id: i64) -> f64 {
        let (status, body) = self.get(&format!("/products/{product_id}")).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["stock"].as_f64().expect("stock")
    }
}
