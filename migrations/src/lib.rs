pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_groups_and_categories;
mod m20240101_000002_create_items_table;
mod m20240101_000003_create_purchase_tables;
mod m20240101_000004_create_cash_sale_tables;
mod m20240101_000005_create_school_tables;
mod m20240215_000006_rebuild_cashsale_items_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_groups_and_categories::Migration),
            Box::new(m20240101_000002_create_items_table::Migration),
            Box::new(m20240101_000003_create_purchase_tables::Migration),
            Box::new(m20240101_000004_create_cash_sale_tables::Migration),
            Box::new(m20240101_000005_create_school_tables::Migration),
            Box::new(m20240215_000006_rebuild_cashsale_items_table::Migration),
        ]
    }
}
