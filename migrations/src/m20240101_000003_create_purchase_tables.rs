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
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Purchases::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Purchases::InvoiceNumber).string().not_null())
                    .col(ColumnDef::new(Purchases::InvoiceDate).date().not_null())
                    .col(ColumnDef::new(Purchases::VendorName).string().not_null())
                    .col(
                        ColumnDef::new(Purchases::Subtotal)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Purchases::GstTotal)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Purchases::TransportTotal)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Purchases::OtherChargesTotal)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Purchases::GrandTotal)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Purchases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // A vendor never reuses an invoice number.
        manager
            .create_index(
                Index::create()
                    .name("idx_purchases_vendor_invoice")
                    .table(Purchases::Table)
                    .col(Purchases::VendorName)
                    .col(Purchases::InvoiceNumber)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PurchaseItems::PurchaseId).integer().not_null())
                    .col(ColumnDef::new(PurchaseItems::ItemId).integer().not_null())
                    .col(ColumnDef::new(PurchaseItems::Quantity).integer().not_null())
                    .col(ColumnDef::new(PurchaseItems::Rate).double().not_null())
                    .col(ColumnDef::new(PurchaseItems::Amount).double().not_null())
                    .col(
                        ColumnDef::new(PurchaseItems::GstPercentage)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(PurchaseItems::GstAmount)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(PurchaseItems::TransportCharge)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(PurchaseItems::OtherCharge)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(PurchaseItems::Total).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_items_purchase_id")
                            .from(PurchaseItems::Table, PurchaseItems::PurchaseId)
                            .to(Purchases::Table, Purchases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_items_item_id")
                            .from(PurchaseItems::Table, PurchaseItems::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_items_purchase_id")
                    .table(PurchaseItems::Table)
                    .col(PurchaseItems::PurchaseId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchaseItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Purchases::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Purchases {
    #[sea_orm(iden = "tbl_purchases")]
    Table,
    Id,
    InvoiceNumber,
    InvoiceDate,
    VendorName,
    Subtotal,
    GstTotal,
    TransportTotal,
    OtherChargesTotal,
    GrandTotal,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum PurchaseItems {
    #[sea_orm(iden = "tbl_purchase_items")]
    Table,
    Id,
    PurchaseId,
    ItemId,
    Quantity,
    Rate,
    Amount,
    GstPercentage,
    GstAmount,
    TransportCharge,
    OtherCharge,
    Total,
}
