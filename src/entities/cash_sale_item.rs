use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sale line; `item_code` and `item_name` are copied from the item at sale time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "tbl_cashsale_items")]
#[schema(as = CashSaleItem)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sale_id: i32,
    pub item_id: i32,
    pub item_code: String,
    pub item_name: String,
    pub quantity: i32,
    pub rate: Decimal,
    pub amount: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cash_sale::Entity",
        from = "Column::SaleId",
        to = "super::cash_sale::Column::Id",
        on_delete = "Cascade"
    )]
    CashSale,
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
}

impl Related<super::cash_sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashSale.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
