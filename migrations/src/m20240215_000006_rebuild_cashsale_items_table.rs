use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

/// SQLite cannot reorder columns in place, so the line table is rebuilt:
/// create the new layout, copy rows across by name, drop the old table and
/// rename the new one into place.
#[derive(DeriveMigrationName)]
pub struct Migration;

const REBUILD_STATEMENTS: &[&str] = &[
    r#"CREATE TABLE "tbl_cashsale_items_new" (
        "id" integer NOT NULL PRIMARY KEY AUTOINCREMENT,
        "sale_id" integer NOT NULL,
        "item_id" integer NOT NULL,
        "item_code" varchar NOT NULL,
        "item_name" varchar NOT NULL,
        "quantity" integer NOT NULL,
        "rate" double NOT NULL,
        "amount" double NOT NULL,
        CONSTRAINT "fk_cashsale_items_sale_id" FOREIGN KEY ("sale_id") REFERENCES "tbl_cashsales" ("id") ON DELETE CASCADE,
        CONSTRAINT "fk_cashsale_items_item_id" FOREIGN KEY ("item_id") REFERENCES "tbl_items" ("id") ON DELETE RESTRICT
    )"#,
    r#"INSERT INTO "tbl_cashsale_items_new"
        ("id", "sale_id", "item_id", "item_code", "item_name", "quantity", "rate", "amount")
        SELECT "id", "sale_id", "item_id", "item_code", "item_name", "quantity", "rate", "amount"
        FROM "tbl_cashsale_items""#,
    r#"DROP TABLE "tbl_cashsale_items""#,
    r#"ALTER TABLE "tbl_cashsale_items_new" RENAME TO "tbl_cashsale_items""#,
    r#"CREATE INDEX IF NOT EXISTS "idx_cashsale_items_sale_id" ON "tbl_cashsale_items" ("sale_id")"#,
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One batch so every statement runs on the same pooled connection.
        manager
            .get_connection()
            .execute_unprepared(&REBUILD_STATEMENTS.join(";\n"))
            .await?;
        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // Column order carries no meaning for queries; nothing to undo.
        Ok(())
    }
}
