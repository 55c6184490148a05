use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityName, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, Statement,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::{DatabaseAccess, DbPool},
    entities::{cash_sale, cash_sale_item},
    errors::ServiceError,
    services::{
        ensure_amount,
        items::{adjust_stock, find_line_item},
        money, overflowed, trimmed, DateRange,
    },
};

const DEFAULT_CUSTOMER: &str = "Cash";

/// One line of a new cash sale
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CashSaleLineInput {
    #[validate(range(min = 1))]
    pub item_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// Defaults to the item's MRP
    pub rate: Option<Decimal>,
}

/// Input for recording a cash sale
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateCashSaleInput {
    /// Generated from the configured prefix when omitted
    #[validate(length(min = 1, max = 50))]
    pub invoice_number: Option<String>,
    /// Defaults to today
    pub invoice_date: Option<NaiveDate>,
    #[validate(length(max = 200))]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub discount: Decimal,
    #[validate(length(min = 1))]
    pub items: Vec<CashSaleLineInput>,
}

/// Cash sale header with its lines
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CashSaleDetail {
    #[serde(flatten)]
    pub sale: cash_sale::Model,
    pub items: Vec<cash_sale_item::Model>,
}

/// Validated sale waiting to be written
#[derive(Debug, Clone)]
struct PendingSale {
    invoice_number: Option<String>,
    invoice_date: NaiveDate,
    customer_name: String,
    discount: Decimal,
    lines: Vec<CashSaleLineInput>,
}

/// Formats a generated invoice number, e.g. `CS-000042`
pub fn format_invoice_number(prefix: &str, serial: i64) -> String {
    format!("{}{:06}", prefix, serial)
}

/// Service for counter sales; every sale takes items out of stock
#[derive(Clone)]
pub struct CashSaleService {
    db: DatabaseAccess,
    invoice_prefix: Arc<str>,
}

impl CashSaleService {
    pub fn new(db_pool: Arc<DbPool>, invoice_prefix: impl Into<Arc<str>>) -> Self {
        Self {
            db: DatabaseAccess::new(db_pool),
            invoice_prefix: invoice_prefix.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_cash_sales(
        &self,
        range: DateRange,
    ) -> Result<Vec<cash_sale::Model>, ServiceError> {
        range.validate()?;
        let query = cash_sale::Entity::find()
            .filter(range.condition(cash_sale::Column::InvoiceDate))
            .order_by_desc(cash_sale::Column::InvoiceDate)
            .order_by_desc(cash_sale::Column::Id);
        self.db
            .execute("list_cash_sales", |db| Box::pin(query.all(db)))
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_cash_sale(&self, id: i32) -> Result<CashSaleDetail, ServiceError> {
        load_detail(self.db.pool(), id).await
    }

    /// Records the sale and decrements stock for every line. If any item is
    /// short, nothing is written.
    #[instrument(skip(self, input), fields(lines = input.items.len()))]
    pub async fn create_cash_sale(
        &self,
        input: CreateCashSaleInput,
    ) -> Result<CashSaleDetail, ServiceError> {
        input.validate()?;
        for line in &input.items {
            line.validate()?;
            if let Some(rate) = line.rate {
                ensure_amount("rate", rate)?;
            }
        }
        ensure_amount("discount", input.discount)?;

        let sale = PendingSale {
            invoice_number: input
                .invoice_number
                .as_deref()
                .map(|n| trimmed("invoice_number", n))
                .transpose()?,
            invoice_date: input.invoice_date.unwrap_or_else(|| Utc::now().date_naive()),
            customer_name: input
                .customer_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_CUSTOMER)
                .to_string(),
            discount: money(input.discount),
            lines: input.items,
        };

        let generated = sale.invoice_number.is_none();
        let detail = match self.record_sale(sale.clone()).await {
            // A concurrent sale took the generated number; draw the next one.
            Err(ServiceError::Conflict(message)) if generated => {
                warn!(%message, "Generated invoice number was taken, retrying");
                self.record_sale(sale).await?
            }
            result => result?,
        };

        counter!("katha.cash_sales.created", 1);
        info!(
            sale_id = detail.sale.id,
            invoice = %detail.sale.invoice_number,
            grand_total = %detail.sale.grand_total,
            "Recorded cash sale"
        );
        Ok(detail)
    }

    async fn record_sale(&self, sale: PendingSale) -> Result<CashSaleDetail, ServiceError> {
        let prefix = self.invoice_prefix.clone();
        self.db
            .transaction::<_, _, ServiceError>("create_cash_sale", move |txn| {
                Box::pin(async move {
                    let mut subtotal = Decimal::ZERO;
                    let mut priced = Vec::with_capacity(sale.lines.len());
                    for line in sale.lines {
                        let item = find_line_item(txn, line.item_id).await?;
                        let rate = line.rate.unwrap_or(item.mrp);
                        let amount = Decimal::from(line.quantity)
                            .checked_mul(rate)
                            .map(money)
                            .ok_or_else(|| overflowed("amount"))?;
                        subtotal = subtotal
                            .checked_add(amount)
                            .ok_or_else(|| overflowed("subtotal"))?;
                        priced.push((item, line.quantity, rate, amount));
                    }

                    if sale.discount > subtotal {
                        return Err(ServiceError::ValidationError(format!(
                            "discount {} exceeds subtotal {}",
                            sale.discount, subtotal
                        )));
                    }

                    let invoice_number = match sale.invoice_number {
                        Some(number) => number,
                        None => next_invoice_number(txn, &prefix).await?,
                    };

                    let header = cash_sale::ActiveModel {
                        invoice_number: Set(invoice_number.clone()),
                        invoice_date: Set(sale.invoice_date),
                        customer_name: Set(sale.customer_name),
                        subtotal: Set(subtotal),
                        discount: Set(sale.discount),
                        grand_total: Set(subtotal - sale.discount),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| {
                        ServiceError::from_constraint(
                            e,
                            format!("invoice number {} is already in use", invoice_number),
                        )
                    })?;

                    for (item, quantity, rate, amount) in priced {
                        adjust_stock(txn, item.id, -quantity).await?;
                        cash_sale_item::ActiveModel {
                            sale_id: Set(header.id),
                            item_id: Set(item.id),
                            item_code: Set(item.item_code),
                            item_name: Set(item.item_name),
                            quantity: Set(quantity),
                            rate: Set(rate),
                            amount: Set(amount),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;
                    }

                    load_detail(txn, header.id).await
                })
            })
            .await
    }

    /// Deletes a cash sale and puts its quantities back into stock
    #[instrument(skip(self))]
    pub async fn delete_cash_sale(&self, id: i32) -> Result<(), ServiceError> {
        self.db
            .transaction::<_, _, ServiceError>("delete_cash_sale", move |txn| {
                Box::pin(async move {
                    let detail = load_detail(txn, id).await?;
                    for line in &detail.items {
                        adjust_stock(txn, line.item_id, line.quantity).await?;
                    }
                    cash_sale_item::Entity::delete_many()
                        .filter(cash_sale_item::Column::SaleId.eq(id))
                        .exec(txn)
                        .await?;
                    cash_sale::Entity::delete_by_id(id).exec(txn).await?;
                    Ok(())
                })
            })
            .await?;

        info!(sale_id = id, "Deleted cash sale");
        Ok(())
    }
}

/// Serial for the next generated invoice number. It is one past both the
/// highest serial already issued under `prefix` and the highest sale id
/// SQLite has ever allocated, so numbers of deleted sales are never reused.
pub fn next_serial<S: AsRef<str>>(prefix: &str, issued: &[S], allocated_id: i64) -> i64 {
    issued
        .iter()
        .filter_map(|number| number.as_ref().strip_prefix(prefix))
        .filter(|serial| !serial.is_empty() && serial.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|serial| serial.parse::<i64>().ok())
        .fold(allocated_id, i64::max)
        .saturating_add(1)
}

async fn next_invoice_number<C>(db: &C, prefix: &str) -> Result<String, ServiceError>
where
    C: ConnectionTrait,
{
    let issued: Vec<String> = cash_sale::Entity::find()
        .select_only()
        .column(cash_sale::Column::InvoiceNumber)
        .filter(cash_sale::Column::InvoiceNumber.starts_with(prefix))
        .into_tuple()
        .all(db)
        .await?;

    // AUTOINCREMENT keeps the high-water mark in sqlite_sequence even after deletes.
    let allocated_id = db
        .query_one(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT seq FROM sqlite_sequence WHERE name = ?",
            [cash_sale::Entity.table_name().into()],
        ))
        .await?
        .map(|row| row.try_get::<i64>("", "seq"))
        .transpose()?
        .unwrap_or(0);

    Ok(format_invoice_number(
        prefix,
        next_serial(prefix, &issued, allocated_id),
    ))
}

async fn load_detail<C>(db: &C, id: i32) -> Result<CashSaleDetail, ServiceError>
where
    C: ConnectionTrait,
{
    let sale = cash_sale::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Cash sale", id))?;
    let items = cash_sale_item::Entity::find()
        .filter(cash_sale_item::Column::SaleId.eq(id))
        .order_by_asc(cash_sale_item::Column::Id)
        .all(db)
        .await?;
    Ok(CashSaleDetail { sale, items })
}
