//! Sales order lifecycle integration tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{order_body, spawn_app};

#[tokio::test]
async fn selling_boxes_deducts_base_units_and_charges_the_box_price() {
    let Some(app) = spawn_app().await else { return };
    let product_id = app.create_product(10.0, 100.0).await;
    let box_id = app.create_unit(product_id, "box", 12.0, 110.0).await;
    let customer_id = app.create_customer().await;

    let (status, order) = app
        .post(
            "/sales-orders",
            json!({
                "customerId": customer_id,
                "products": [{ "productId": product_id, "productUnitId": box_id, "quantity": 2 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["status"], "completed");
    assert!(order["orderNumber"].as_str().unwrap().starts_with("SO"));
    assert_eq!(order["totalAmount"].as_f64(), Some(220.0));
    assert_eq!(order["productCount"].as_u64(), Some(1));

    let line = &order["products"][0];
    assert_eq!(line["unitName"], "box");
    assert_eq!(line["baseQuantity"].as_f64(), Some(24.0));
    assert_eq!(line["price"].as_f64(), Some(110.0));

    assert_eq!(app.stock(product_id).await, 76.0);
}

#[tokio::test]
async fn voiding_twice_fails_and_restores_once() {
    let Some(app) = spawn_app().await else { return };
    let product_id = app.create_product(5.0, 10.0).await;
    let customer_id = app.create_customer().await;

    let (_, order) = app.post("/sales-orders", order_body(customer_id, &[(product_id, 4.0)])).await;
    let id = order["id"].as_i64().unwrap();
    assert_eq!(app.stock(product_id).await, 6.0);

    let (status, voided) = app.post(&format!("/sales-orders/{id}/void"), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{voided}");
    assert_eq!(voided["status"], "voided");
    assert_eq!(app.stock(product_id).await, 10.0);

    let (status, body) = app.post(&format!("/sales-orders/{id}/void"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already voided"));
    assert_eq!(app.stock(product_id).await, 10.0);
}

#[tokio::test]
async fn one_short_line_rejects_the_whole_order() {
    let Some(app) = spawn_app().await else { return };
    let plenty = app.create_product(1.0, 50.0).await;
    let scarce = app.create_product(1.0, 2.0).await;
    let customer_id = app.create_customer().await;

    let (status, body) = app
        .post(
            "/sales-orders",
            json!({
                "customerId": customer_id,
                "products": [
                    { "productId": plenty, "quantity": 10 },
                    { "productId": scarce, "quantity": 3 },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("insufficient stock"));
    assert_eq!(app.stock(plenty).await, 50.0);
    assert_eq!(app.stock(scarce).await, 2.0);
}

#[tokio::test]
async fn drafts_hold_no_stock_until_completed() {
    let Some(app) = spawn_app().await else { return };
    let product_id = app.create_product(8.0, 10.0).await;
    let customer_id = app.create_customer().await;

    let (status, draft) = app
        .post(
            "/sales-orders",
            json!({
                "customerId": customer_id,
                "status": "draft",
                "products": [{ "productId": product_id, "quantity": 3 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{draft}");
    assert_eq!(draft["status"], "draft");
    assert_eq!(app.stock(product_id).await, 10.0);
    let id = draft["id"].as_i64().unwrap();

    // re-saving the draft with more lines still leaves stock alone
    let (status, draft) = app
        .put(
            &format!("/sales-orders/{id}"),
            json!({
                "customerId": customer_id,
                "remark": "second pass",
                "products": [{ "productId": product_id, "quantity": 5, "price": 7.5 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{draft}");
    assert_eq!(draft["totalAmount"].as_f64(), Some(37.5));
    assert_eq!(draft["remark"], "second pass");
    assert_eq!(app.stock(product_id).await, 10.0);

    let (status, completed) = app
        .put(
            &format!("/sales-orders/{id}"),
            json!({
                "customerId": customer_id,
                "status": "completed",
                "products": [{ "productId": product_id, "quantity": 5 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{completed}");
    assert_eq!(app.stock(product_id).await, 5.0);

    let (status, _) = app
        .put(&format!("/sales-orders/{id}"), order_body(customer_id, &[(product_id, 1.0)]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stock(product_id).await, 5.0);
}

#[tokio::test]
async fn drafts_cannot_be_voided_but_can_be_deleted() {
    let Some(app) = spawn_app().await else { return };
    let product_id = app.create_product(8.0, 10.0).await;
    let customer_id = app.create_customer().await;

    let (_, draft) = app
        .post(
            "/sales-orders",
            json!({
                "customerId": customer_id,
                "status": "draft",
                "products": [{ "productId": product_id, "quantity": 3 }],
            }),
        )
        .await;
    let id = draft["id"].as_i64().unwrap();

    let (status, _) = app.post(&format!("/sales-orders/{id}/void"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.delete(&format!("/sales-orders/{id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.stock(product_id).await, 10.0);

    let (status, _) = app.get(&format!("/sales-orders/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_completed_order_restores_stock() {
    let Some(app) = spawn_app().await else { return };
    let product_id = app.create_product(2.0, 9.0).await;
    let customer_id = app.create_customer().await;

    let (_, order) = app.post("/sales-orders", order_body(customer_id, &[(product_id, 9.0)])).await;
    let id = order["id"].as_i64().unwrap();
    assert_eq!(app.stock(product_id).await, 0.0);

    let (status, _) = app.post("/print-jobs", json!({ "orderId": id })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.delete(&format!("/sales-orders/{id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.stock(product_id).await, 9.0);
}

#[tokio::test]
async fn rejects_unusable_payloads() {
    let Some(app) = spawn_app().await else { return };
    let product_id = app.create_product(2.0, 9.0).await;
    let customer_id = app.create_customer().await;

    let (status, _) = app
        .post("/sales-orders", json!({ "customerId": customer_id, "products": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/sales-orders",
            json!({
                "customerId": customer_id,
                "status": "voided",
                "products": [{ "productId": product_id, "quantity": 1 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/sales-orders", order_body(i64::MAX, &[(product_id, 1.0)])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.stock(product_id).await, 9.0);
}

#[tokio::test]
async fn receipt_reflects_the_order() {
    let Some(app) = spawn_app().await else { return };
    let product_id = app.create_product(100.25, 10.0).await;
    let customer_id = app.create_customer().await;

    let (_, order) = app
        .post("/sales-orders", order_body(customer_id, &[(product_id, 10.0)]))
        .await;
    let id = order["id"].as_i64().unwrap();

    let (status, receipt) = app.get(&format!("/sales-orders/{id}/receipt")).await;
    assert_eq!(status, StatusCode::OK, "{receipt}");
    assert_eq!(receipt["title"], "销售单");
    assert_eq!(receipt["orderNumber"], order["orderNumber"]);
    assert_eq!(receipt["totalAmount"], "1002.50");
    assert_eq!(receipt["totalAmountInWords"], "壹仟零贰元伍角");
    assert_eq!(receipt["products"][0]["unit"], "斤");
    assert_eq!(receipt["pageInfo"], "第1页共1页");
}
