mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;

use common::{decimal, TestApp};

/// Group 1 / category 11 with two items, returning their ids.
async fn two_items(app: &TestApp) -> (i64, i64) {
    let group_id = app.create_group(1, "Stationery").await;
    let category = app.create_category(group_id, "Notebooks").await;
    let category_id = category["id"].as_i64().unwrap();
    let notebook = app.create_item(category_id, "NB-100", "45", 10).await;
    let pen = app.create_item(category_id, "PN-BL", "10", 50).await;
    (notebook, pen)
}

#[tokio::test]
async fn purchase_adds_stock_and_totals_lines() {
    let app = TestApp::new().await;
    let (notebook, _) = two_items(&app).await;

    let (status, body) = app
        .post(
            "/api/purchases",
            json!({
                "invoice_number": "V-1001",
                "invoice_date": "2024-03-01",
                "vendor_name": "Navneet Traders",
                "items": [
                    { "item_id": notebook, "quantity": 5, "rate": "40", "transport_charge": "4" }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(decimal(&body["subtotal"]), dec!(200));
    // GST falls back to the item's 5%
    assert_eq!(decimal(&body["gst_total"]), dec!(10));
    assert_eq!(decimal(&body["grand_total"]), dec!(214));
    assert_eq!(body["items"][0]["item_code"], "NB-100");

    assert_eq!(app.stock_of(notebook).await, 15);

    let (status, list) = app.get("/api/purchases?from=2024-03-01&to=2024-03-31").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    let (_, none) = app.get("/api/purchases?from=2024-04-01").await;
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn duplicate_vendor_invoice_is_a_conflict() {
    let app = TestApp::new().await;
    let (notebook, _) = two_items(&app).await;
    let purchase = json!({
        "invoice_number": "V-1001",
        "invoice_date": "2024-03-01",
        "vendor_name": "Navneet Traders",
        "items": [{ "item_id": notebook, "quantity": 1, "rate": "40" }]
    });

    let (status, _) = app.post("/api/purchases", purchase.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app.post("/api/purchases", purchase).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    // Only the first purchase moved stock
    assert_eq!(app.stock_of(notebook).await, 11);
}

#[tokio::test]
async fn cash_sale_takes_stock_and_numbers_invoices() {
    let app = TestApp::new().await;
    let (notebook, pen) = two_items(&app).await;

    let (status, sale) = app
        .post(
            "/api/cashsales",
            json!({
                "invoice_date": "2024-03-02",
                "discount": "5",
                "items": [
                    { "item_id": notebook, "quantity": 3 },
                    { "item_id": pen, "quantity": 2, "rate": "9.50" }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{sale}");
    assert_eq!(sale["invoice_number"], "CS-000001");
    assert_eq!(sale["customer_name"], "Cash");
    // 3 × 45 at MRP + 2 × 9.50
    assert_eq!(decimal(&sale["subtotal"]), dec!(154));
    assert_eq!(decimal(&sale["grand_total"]), dec!(149));
    assert_eq!(sale["items"].as_array().unwrap().len(), 2);
    assert_eq!(decimal(&sale["items"][0]["rate"]), dec!(45));

    assert_eq!(app.stock_of(notebook).await, 7);
    assert_eq!(app.stock_of(pen).await, 48);

    let (_, second) = app
        .post(
            "/api/cashsales",
            json!({ "items": [{ "item_id": pen, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(second["invoice_number"], "CS-000002");
}

#[tokio::test]
async fn short_stock_rolls_back_the_whole_sale() {
    let app = TestApp::new().await;
    let (notebook, pen) = two_items(&app).await;

    let (status, body) = app
        .post(
            "/api/cashsales",
            json!({
                "items": [
                    { "item_id": pen, "quantity": 2 },
                    { "item_id": notebook, "quantity": 11 }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    assert_eq!(body["error"], "Unprocessable Entity");

    assert_eq!(app.stock_of(pen).await, 50);
    assert_eq!(app.stock_of(notebook).await, 10);
    let (_, sales) = app.get("/api/cashsales").await;
    assert_eq!(sales, json!([]));
}

#[tokio::test]
async fn discount_above_subtotal_is_rejected() {
    let app = TestApp::new().await;
    let (_, pen) = two_items(&app).await;

    let (status, _) = app
        .post(
            "/api/cashsales",
            json!({ "discount": "100", "items": [{ "item_id": pen, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stock_of(pen).await, 50);
}

#[tokio::test]
async fn oversized_amounts_are_bad_requests() {
    let app = TestApp::new().await;
    let (notebook, pen) = two_items(&app).await;
    let huge = "79228162514264337593543950335";

    let (status, body) = app
        .post(
            "/api/purchases",
            json!({
                "invoice_number": "V-9",
                "invoice_date": "2024-03-01",
                "vendor_name": "Navneet Traders",
                "items": [{ "item_id": notebook, "quantity": 2, "rate": huge }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "Bad Request");

    let (status, body) = app
        .post(
            "/api/cashsales",
            json!({ "items": [{ "item_id": pen, "quantity": 2, "rate": huge }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    assert_eq!(app.stock_of(notebook).await, 10);
    assert_eq!(app.stock_of(pen).await, 50);
    let (_, purchases) = app.get("/api/purchases").await;
    assert_eq!(purchases, json!([]));
}

#[tokio::test]
async fn generated_invoice_numbers_are_not_reused() {
    let app = TestApp::new().await;
    let (_, pen) = two_items(&app).await;
    let sale = json!({ "items": [{ "item_id": pen, "quantity": 1 }] });

    let (_, first) = app.post("/api/cashsales", sale.clone()).await;
    assert_eq!(first["invoice_number"], "CS-000001");
    let (_, second) = app.post("/api/cashsales", sale.clone()).await;
    assert_eq!(second["invoice_number"], "CS-000002");

    let (status, _) = app
        .delete(&format!("/api/cashsales/{}", second["id"]))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, third) = app.post("/api/cashsales", sale.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{third}");
    assert_eq!(third["invoice_number"], "CS-000003");

    // A hand-typed number ahead of the sequence is skipped past.
    let (status, _) = app
        .post(
            "/api/cashsales",
            json!({ "invoice_number": "CS-000010", "items": [{ "item_id": pen, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, next) = app.post("/api/cashsales", sale).await;
    assert_eq!(next["invoice_number"], "CS-000011");
}

#[tokio::test]
async fn unknown_item_on_a_line_is_bad_request() {
    let app = TestApp::new().await;
    two_items(&app).await;

    let (status, body) = app
        .post(
            "/api/cashsales",
            json!({ "items": [{ "item_id": 999, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn deleting_invoices_reverses_stock() {
    let app = TestApp::new().await;
    let (notebook, _) = two_items(&app).await;

    let (_, sale) = app
        .post(
            "/api/cashsales",
            json!({ "items": [{ "item_id": notebook, "quantity": 4 }] }),
        )
        .await;
    assert_eq!(app.stock_of(notebook).await, 6);

    let (status, _) = app.delete(&format!("/api/cashsales/{}", sale["id"])).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.stock_of(notebook).await, 10);
    let (status, _) = app.get(&format!("/api/cashsales/{}", sale["id"])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, purchase) = app
        .post(
            "/api/purchases",
            json!({
                "invoice_number": "V-7",
                "invoice_date": "2024-03-01",
                "vendor_name": "Navneet Traders",
                "items": [{ "item_id": notebook, "quantity": 5, "rate": "40" }]
            }),
        )
        .await;
    assert_eq!(app.stock_of(notebook).await, 15);

    // Selling most of it means the purchase can no longer be taken back
    app.post(
        "/api/cashsales",
        json!({ "items": [{ "item_id": notebook, "quantity": 12 }] }),
    )
    .await;
    let (status, _) = app
        .delete(&format!("/api/purchases/{}", purchase["id"]))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.stock_of(notebook).await, 3);
}

#[tokio::test]
async fn item_with_invoice_lines_cannot_be_deleted() {
    let app = TestApp::new().await;
    let (notebook, pen) = two_items(&app).await;
    app.post(
        "/api/cashsales",
        json!({ "items": [{ "item_id": notebook, "quantity": 1 }] }),
    )
    .await;

    let (status, _) = app.delete(&format!("/api/items/{notebook}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app.delete(&format!("/api/items/{pen}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
