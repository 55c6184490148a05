use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Katha API",
        version = "0.1.0",
        description = r#"
# Katha Sales and School Administration API

JSON REST API over a single SQLite database.

## Numbering

Every category number is its group's number followed by a per-group sequence:
group 3 owns 31, 32 ... 39, 310, 311. `GET /api/categories-next-number?group_id=`
returns the number the next category of a group would receive.

## Stock

Purchases add to item stock and cash sales remove from it. A cash sale that
needs more stock than is on hand is rejected with 422 and nothing is stored.

## Error Handling

Failing requests return:

```json
{
  "error": "Not Found",
  "message": "Not found: Group 42 not found",
  "request_id": "6f1c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:4000", description = "Local development")
    ),
    tags(
        (name = "groups", description = "Top-level item groups"),
        (name = "categories", description = "Categories and their numbering"),
        (name = "items", description = "Item master"),
        (name = "purchases", description = "Purchase invoices"),
        (name = "cash-sales", description = "Counter sales"),
        (name = "reports", description = "Stock and invoice reports"),
        (name = "school", description = "Cities and teachers"),
        (name = "health", description = "Health check")
    ),
    paths(
        // Groups
        crate::handlers::groups::list_groups,
        crate::handlers::groups::get_group,
        crate::handlers::groups::create_group,
        crate::handlers::groups::update_group,
        crate::handlers::groups::delete_group,

        // Categories
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
        crate::handlers::categories::next_category_number,
        crate::handlers::categories::audit_category_numbers,

        // Items
        crate::handlers::items::list_items,
        crate::handlers::items::get_item,
        crate::handlers::items::create_item,
        crate::handlers::items::update_item,
        crate::handlers::items::delete_item,

        // Invoices
        crate::handlers::purchases::list_purchases,
        crate::handlers::purchases::get_purchase,
        crate::handlers::purchases::create_purchase,
        crate::handlers::purchases::delete_purchase,
        crate::handlers::cash_sales::list_cash_sales,
        crate::handlers::cash_sales::get_cash_sale,
        crate::handlers::cash_sales::create_cash_sale,
        crate::handlers::cash_sales::delete_cash_sale,

        // Reports
        crate::handlers::reports::stock_report,
        crate::handlers::reports::sales_summary,
        crate::handlers::reports::purchase_summary,
        crate::handlers::reports::item_sales,

        // School
        crate::handlers::cities::list_cities,
        crate::handlers::cities::create_city,
        crate::handlers::teachers::list_teachers,
        crate::handlers::teachers::get_teacher,
        crate::handlers::teachers::create_teacher,
        crate::handlers::teachers::update_teacher,
        crate::handlers::teachers::delete_teacher,

        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::entities::group::Model,
            crate::entities::purchase::Model,
            crate::entities::purchase_item::Model,
            crate::entities::cash_sale::Model,
            crate::entities::cash_sale_item::Model,
            crate::entities::city::Model,
            crate::numbering::CategoryNumber,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
