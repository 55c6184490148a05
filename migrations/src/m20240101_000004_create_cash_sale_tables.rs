use sea_orm_migration::prelude::*;

use crate::m20240101_000002_create_items_table::Items;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CashSales::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashSales::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CashSales::InvoiceNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CashSales::InvoiceDate).date().not_null())
                    .col(ColumnDef::new(CashSales::CustomerName).string().not_null())
                    .col(
                        ColumnDef::new(CashSales::Subtotal)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(CashSales::Discount)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(CashSales::GrandTotal)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(CashSales::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // First cut of the line table; column order is corrected by a later rebuild.
        manager
            .create_table(
                Table::create()
                    .table(CashSaleItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashSaleItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashSaleItems::SaleId).integer().not_null())
                    .col(ColumnDef::new(CashSaleItems::ItemName).string().not_null())
                    .col(ColumnDef::new(CashSaleItems::Quantity).integer().not_null())
                    .col(ColumnDef::new(CashSaleItems::Rate).double().not_null())
                    .col(ColumnDef::new(CashSaleItems::Amount).double().not_null())
                    .col(ColumnDef::new(CashSaleItems::ItemId).integer().not_null())
                    .col(ColumnDef::new(CashSaleItems::ItemCode).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cashsale_items_sale_id")
                            .from(CashSaleItems::Table, CashSaleItems::SaleId)
                            .to(CashSales::Table, CashSales::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cashsale_items_item_id")
                            .from(CashSaleItems::Table, CashSaleItems::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CashSaleItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CashSales::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CashSales {
    #[sea_orm(iden = "tbl_cashsales")]
    Table,
    Id,
    InvoiceNumber,
    InvoiceDate,
    CustomerName,
    Subtotal,
    Discount,
    GrandTotal,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum CashSaleItems {
    #[sea_orm(iden = "tbl_cashsale_items")]
    Table,
    Id,
    SaleId,
    ItemId,
    ItemCode,
    ItemName,
    Quantity,
    Rate,
    Amount,
}
