use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "tbl_cashsales")]
#[schema(as = CashSale)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub customer_name: String,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub grand_total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cash_sale_item::Entity")]
    CashSaleItems,
}

impl Related<super::cash_sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashSaleItems.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if insert && matches!(active_model.created_at, ActiveValue::NotSet) {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
