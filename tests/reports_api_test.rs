mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;

use common::{decimal, TestApp};

/// Two groups with one item each, a purchase and two days of cash sales.
async fn trading_day(app: &TestApp) -> (i64, i64) {
    let stationery = app.create_group(1, "Stationery").await;
    let books = app.create_group(3, "Books").await;
    let notebooks = app.create_category(stationery, "Notebooks").await;
    let textbooks = app.create_category(books, "Textbooks").await;
    let notebook = app
        .create_item(notebooks["id"].as_i64().unwrap(), "NB-100", "45", 10)
        .await;
    let textbook = app
        .create_item(textbooks["id"].as_i64().unwrap(), "TB-5", "200", 3)
        .await;

    let (status, _) = app
        .post(
            "/api/purchases",
            json!({
                "invoice_number": "V-1",
                "invoice_date": "2024-03-01",
                "vendor_name": "Navneet Traders",
                "items": [{ "item_id": notebook, "quantity": 10, "rate": "30" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post(
            "/api/purchases",
            json!({
                "invoice_number": "B-9",
                "invoice_date": "2024-03-01",
                "vendor_name": "Balbharati",
                "items": [{ "item_id": textbook, "quantity": 2, "rate": "150", "gst_percentage": "0" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    for (date, item, quantity) in [
        ("2024-03-02", notebook, 2),
        ("2024-03-02", textbook, 1),
        ("2024-03-03", notebook, 4),
    ] {
        let (status, body) = app
            .post(
                "/api/cashsales",
                json!({
                    "invoice_date": date,
                    "items": [{ "item_id": item, "quantity": quantity }]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    (notebook, textbook)
}

#[tokio::test]
async fn stock_report_orders_by_category_number() {
    let app = TestApp::new().await;
    trading_day(&app).await;

    let (status, report) = app.get("/api/reports/stock").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_items"], 2);

    let rows = report["items"].as_array().unwrap();
    assert_eq!(rows[0]["category_number"], 11);
    assert_eq!(rows[1]["category_number"], 31);
    // 10 opening + 10 bought - 6 sold
    assert_eq!(rows[0]["current_stock"], 14);
    // 3 opening + 2 bought - 1 sold
    assert_eq!(rows[1]["current_stock"], 4);
    // 14 × 45 + 4 × 200
    assert_eq!(decimal(&report["total_stock_value"]), dec!(1430));
}

#[tokio::test]
async fn sales_summary_groups_by_day() {
    let app = TestApp::new().await;
    trading_day(&app).await;

    let (status, report) = app.get("/api/reports/sales-summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["invoices"], 3);
    // 2 × 45 + 200 + 4 × 45
    assert_eq!(decimal(&report["grand_total"]), dec!(470));

    let days = report["days"].as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["date"], "2024-03-02");
    assert_eq!(days[0]["invoices"], 2);
    assert_eq!(decimal(&days[0]["grand_total"]), dec!(290));

    let (_, one_day) = app
        .get("/api/reports/sales-summary?from=2024-03-03&to=2024-03-03")
        .await;
    assert_eq!(one_day["invoices"], 1);
    assert_eq!(one_day["from"], "2024-03-03");
}

#[tokio::test]
async fn purchase_summary_ranks_vendors() {
    let app = TestApp::new().await;
    trading_day(&app).await;

    let (status, report) = app.get("/api/reports/purchase-summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["invoices"], 2);

    let vendors = report["vendors"].as_array().unwrap();
    // 10 × 30 plus 5% GST
    assert_eq!(vendors[0]["vendor_name"], "Navneet Traders");
    assert_eq!(decimal(&vendors[0]["grand_total"]), dec!(315));
    assert_eq!(vendors[1]["vendor_name"], "Balbharati");
    assert_eq!(decimal(&vendors[1]["grand_total"]), dec!(300));
}

#[tokio::test]
async fn item_sales_lists_best_sellers_first() {
    let app = TestApp::new().await;
    let (notebook, textbook) = trading_day(&app).await;

    let (status, body) = app.get("/api/reports/item-sales").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["item_id"], notebook);
    assert_eq!(rows[0]["quantity"], 6);
    assert_eq!(decimal(&rows[0]["amount"]), dec!(270));
    assert_eq!(rows[1]["item_id"], textbook);
}

#[tokio::test]
async fn reversed_date_range_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .get("/api/reports/sales-summary?from=2024-03-05&to=2024-03-01")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
}
