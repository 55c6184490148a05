use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    db::{DatabaseAccess, DbPool},
    entities::{cash_sale_item, category, item, purchase_item},
    errors::ServiceError,
    services::{ensure_amount, trimmed},
};

/// Item joined with its category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemView {
    pub id: i32,
    pub item_code: String,
    pub item_name: String,
    pub category_id: i32,
    pub category_number: i64,
    pub category_name: String,
    pub mrp: Decimal,
    pub gst_percentage: Decimal,
    pub opening_stock: i32,
    pub current_stock: i32,
    pub reorder_level: i32,
    pub low_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemView {
    fn new(item: item::Model, category: &category::Model) -> Self {
        Self {
            low_stock: item.is_low_stock(),
            id: item.id,
            item_code: item.item_code,
            item_name: item.item_name,
            category_id: category.id,
            category_number: category.category_number,
            category_name: category.category_name.clone(),
            mrp: item.mrp,
            gst_percentage: item.gst_percentage,
            opening_stock: item.opening_stock,
            current_stock: item.current_stock,
            reorder_level: item.reorder_level,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemFilter {
    /// Only items of this category
    pub category_id: Option<i32>,
    /// Substring of the item code or name
    pub search: Option<String>,
}

/// Input for creating an item
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateItemInput {
    #[validate(length(min = 1, max = 50))]
    pub item_code: String,
    #[validate(length(min = 1, max = 200))]
    pub item_name: String,
    #[validate(range(min = 1))]
    pub category_id: i32,
    pub mrp: Decimal,
    #[serde(default)]
    pub gst_percentage: Decimal,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub opening_stock: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub reorder_level: i32,
}

/// Input for updating item master fields. Stock only moves through invoices.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateItemInput {
    #[validate(length(min = 1, max = 50))]
    pub item_code: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub item_name: Option<String>,
    #[validate(range(min = 1))]
    pub category_id: Option<i32>,
    pub mrp: Option<Decimal>,
    pub gst_percentage: Option<Decimal>,
    #[validate(range(min = 0))]
    pub reorder_level: Option<i32>,
}

fn check_prices(mrp: Option<Decimal>, gst_percentage: Option<Decimal>) -> Result<(), ServiceError> {
    if let Some(mrp) = mrp {
        ensure_amount("mrp", mrp)?;
    }
    if let Some(gst) = gst_percentage {
        ensure_amount("gst_percentage", gst)?;
        if gst > Decimal::ONE_HUNDRED {
            return Err(ServiceError::ValidationError(
                "gst_percentage must not exceed 100".into(),
            ));
        }
    }
    Ok(())
}

/// Service for the item master
#[derive(Clone)]
pub struct ItemService {
    db: DatabaseAccess,
}

impl ItemService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            db: DatabaseAccess::new(db_pool),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_items(&self, filter: ItemFilter) -> Result<Vec<ItemView>, ServiceError> {
        let mut query = item::Entity::find()
            .find_also_related(category::Entity)
            .order_by_asc(item::Column::ItemCode);
        if let Some(category_id) = filter.category_id {
            query = query.filter(item::Column::CategoryId.eq(category_id));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(item::Column::ItemCode.contains(search))
                    .add(item::Column::ItemName.contains(search)),
            );
        }

        let rows = self
            .db
            .execute("list_items", |db| Box::pin(query.all(db)))
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(item, category)| category.map(|c| ItemView::new(item, &c)))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: i32) -> Result<ItemView, ServiceError> {
        let (item, category) = item::Entity::find_by_id(id)
            .find_also_related(category::Entity)
            .one(self.db.pool())
            .await?
            .ok_or_else(|| ServiceError::not_found("Item", id))?;
        let category =
            category.ok_or_else(|| ServiceError::not_found("Category", item.category_id))?;
        Ok(ItemView::new(item, &category))
    }

    /// Creates an item; current stock starts at the opening stock
    #[instrument(skip(self))]
    pub async fn create_item(&self, input: CreateItemInput) -> Result<ItemView, ServiceError> {
        input.validate()?;
        check_prices(Some(input.mrp), Some(input.gst_percentage))?;
        let code = trimmed("item_code", &input.item_code)?;
        let name = trimmed("item_name", &input.item_name)?;
        let db = self.db.pool();

        let category = find_category(db, input.category_id).await?;
        let model = item::ActiveModel {
            item_code: Set(code.clone()),
            item_name: Set(name),
            category_id: Set(category.id),
            mrp: Set(input.mrp),
            gst_percentage: Set(input.gst_percentage),
            opening_stock: Set(input.opening_stock),
            current_stock: Set(input.opening_stock),
            reorder_level: Set(input.reorder_level),
            ..Default::default()
        };
        let created = model.insert(db).await.map_err(|e| {
            ServiceError::from_constraint(e, format!("item code {} is already in use", code))
        })?;

        info!(item_id = created.id, item_code = %created.item_code, "Created item");
        Ok(ItemView::new(created, &category))
    }

    #[instrument(skip(self))]
    pub async fn update_item(&self, id: i32, input: UpdateItemInput) -> Result<ItemView, ServiceError> {
        input.validate()?;
        check_prices(input.mrp, input.gst_percentage)?;
        let db = self.db.pool();

        let existing = item::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Item", id))?;
        let category =
            find_category(db, input.category_id.unwrap_or(existing.category_id)).await?;

        let mut active = existing.into_active_model();
        if let Some(code) = input.item_code.as_deref() {
            active.item_code = Set(trimmed("item_code", code)?);
        }
        if let Some(name) = input.item_name.as_deref() {
            active.item_name = Set(trimmed("item_name", name)?);
        }
        active.category_id = Set(category.id);
        if let Some(mrp) = input.mrp {
            active.mrp = Set(mrp);
        }
        if let Some(gst) = input.gst_percentage {
            active.gst_percentage = Set(gst);
        }
        if let Some(level) = input.reorder_level {
            active.reorder_level = Set(level);
        }

        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::from_constraint(e, "item code is already in use"))?;
        info!(item_id = id, "Updated item");
        Ok(ItemView::new(updated, &category))
    }

    /// Deletes an item no invoice line refers to
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: i32) -> Result<(), ServiceError> {
        let db = self.db.pool();
        let existing = item::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Item", id))?;

        let purchased = purchase_item::Entity::find()
            .filter(purchase_item::Column::ItemId.eq(id))
            .count(db)
            .await?;
        let sold = cash_sale_item::Entity::find()
            .filter(cash_sale_item::Column::ItemId.eq(id))
            .count(db)
            .await?;
        if purchased + sold > 0 {
            return Err(ServiceError::Conflict(format!(
                "item {} is referenced by {} invoice lines",
                existing.item_code,
                purchased + sold
            )));
        }

        item::Entity::delete_by_id(id).exec(db).await?;
        info!(item_id = id, "Deleted item");
        Ok(())
    }
}

async fn find_category<C>(db: &C, category_id: i32) -> Result<category::Model, ServiceError>
where
    C: ConnectionTrait,
{
    category::Entity::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::InvalidInput(format!("category {} does not exist", category_id)))
}

/// Loads an item referenced by an invoice line
pub(crate) async fn find_line_item<C>(db: &C, item_id: i32) -> Result<item::Model, ServiceError>
where
    C: ConnectionTrait,
{
    item::Entity::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::InvalidInput(format!("item {} does not exist", item_id)))
}

/// Moves an item's stock by `delta` in a single statement. A decrement only
/// applies while enough stock is on hand; otherwise nothing is written and
/// `InsufficientStock` is returned.
pub(crate) async fn adjust_stock<C>(db: &C, item_id: i32, delta: i32) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let mut update = item::Entity::update_many()
        .col_expr(
            item::Column::CurrentStock,
            Expr::col(item::Column::CurrentStock).add(delta),
        )
        .col_expr(item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(item::Column::Id.eq(item_id));
    if delta < 0 {
        update = update.filter(item::Column::CurrentStock.gte(delta.saturating_neg()));
    }

    let result = update.exec(db).await?;
    if result.rows_affected == 1 {
        debug!(item_id, delta, "Adjusted stock");
        return Ok(());
    }

    match item::Entity::find_by_id(item_id).one(db).await? {
        None => Err(ServiceError::InvalidInput(format!(
            "item {} does not exist",
            item_id
        ))),
        Some(item) => Err(ServiceError::InsufficientStock(format!(
            "item {} has {} in stock, {} required",
            item.item_code,
            item.current_stock,
            delta.saturating_neg()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::categories::{CategoryService, CreateCategoryInput};
    use crate::services::groups::{CreateGroupInput, GroupService};
    use crate::services::test_pool;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    async fn setup() -> (Arc<DbPool>, ItemService, i32) {
        let pool = test_pool().await;
        let group = GroupService::new(pool.clone())
            .create_group(CreateGroupInput {
                group_number: 3,
                group_name: "Stationery".into(),
            })
            .await
            .unwrap();
        let category = CategoryService::new(pool.clone())
            .create_category(CreateCategoryInput {
                group_id: group.id,
                category_name: "Pens".into(),
                category_number: None,
            })
            .await
            .unwrap();
        (pool.clone(), ItemService::new(pool), category.id)
    }

    fn pen(category_id: i32, code: &str) -> CreateItemInput {
        CreateItemInput {
            item_code: code.into(),
            item_name: format!("Pen {}", code),
            category_id,
            mrp: dec!(10),
            gst_percentage: dec!(12),
            opening_stock: 5,
            reorder_level: 2,
        }
    }

    #[tokio::test]
    async fn opening_stock_seeds_current_stock() {
        let (_, service, category_id) = setup().await;
        let item = service.create_item(pen(category_id, "P1")).await.unwrap();
        assert_eq!(item.current_stock, 5);
        assert_eq!(item.category_number, 31);
        assert!(!item.low_stock);
    }

    #[tokio::test]
    async fn duplicate_code_is_a_conflict() {
        let (_, service, category_id) = setup().await;
        service.create_item(pen(category_id, "P1")).await.unwrap();
        assert_matches!(
            service.create_item(pen(category_id, "P1")).await,
            Err(ServiceError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn unknown_category_is_invalid_input() {
        let (_, service, _) = setup().await;
        assert_matches!(
            service.create_item(pen(404, "P1")).await,
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[tokio::test]
    async fn gst_above_hundred_is_rejected() {
        let (_, service, category_id) = setup().await;
        let mut input = pen(category_id, "P1");
        input.gst_percentage = dec!(101);
        assert_matches!(
            service.create_item(input).await,
            Err(ServiceError::ValidationError(_))
        );
    }

    #[tokio::test]
    async fn search_matches_code_and_name() {
        let (_, service, category_id) = setup().await;
        service.create_item(pen(category_id, "P1")).await.unwrap();
        let mut other = pen(category_id, "N7");
        other.item_name = "Notebook".into();
        service.create_item(other).await.unwrap();

        let found = service
            .list_items(ItemFilter {
                category_id: None,
                search: Some("note".into()),
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item_code, "N7");
    }

    #[tokio::test]
    async fn stock_cannot_go_negative() {
        let (pool, service, category_id) = setup().await;
        let item = service.create_item(pen(category_id, "P1")).await.unwrap();

        adjust_stock(pool.as_ref(), item.id, -5).await.unwrap();
        assert_matches!(
            adjust_stock(pool.as_ref(), item.id, -1).await,
            Err(ServiceError::InsufficientStock(_))
        );
        adjust_stock(pool.as_ref(), item.id, 3).await.unwrap();

        let reloaded = service.get_item(item.id).await.unwrap();
        assert_eq!(reloaded.current_stock, 3);
        assert!(!reloaded.low_stock);
    }
}
