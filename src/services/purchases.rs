use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::{DatabaseAccess, DbPool},
    entities::{item, purchase, purchase_item},
    errors::ServiceError,
    services::{
        ensure_amount,
        items::{adjust_stock, find_line_item},
        money, overflowed, trimmed, DateRange,
    },
};

/// Computed amounts of one purchase line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseLineAmounts {
    pub amount: Decimal,
    pub gst_amount: Decimal,
    pub total: Decimal,
}

/// `amount = quantity × rate`, `gst = amount × gst% / 100`,
/// `total = amount + gst + transport + other`
pub fn purchase_line_amounts(
    quantity: i32,
    rate: Decimal,
    gst_percentage: Decimal,
    transport_charge: Decimal,
    other_charge: Decimal,
) -> Result<PurchaseLineAmounts, ServiceError> {
    let amount = Decimal::from(quantity)
        .checked_mul(rate)
        .map(money)
        .ok_or_else(|| overflowed("amount"))?;
    let gst_amount = amount
        .checked_mul(gst_percentage)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .map(money)
        .ok_or_else(|| overflowed("gst_amount"))?;
    let total = amount
        .checked_add(gst_amount)
        .and_then(|v| v.checked_add(transport_charge))
        .and_then(|v| v.checked_add(other_charge))
        .map(money)
        .ok_or_else(|| overflowed("total"))?;
    Ok(PurchaseLineAmounts {
        amount,
        gst_amount,
        total,
    })
}

/// Header totals accumulated from the lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurchaseTotals {
    pub subtotal: Decimal,
    pub gst_total: Decimal,
    pub transport_total: Decimal,
    pub other_charges_total: Decimal,
    pub grand_total: Decimal,
}

impl PurchaseTotals {
    fn add(
        &mut self,
        line: &PurchaseLineAmounts,
        transport: Decimal,
        other: Decimal,
    ) -> Result<(), ServiceError> {
        let sum = |field: &str, total: Decimal, value: Decimal| {
            total.checked_add(value).ok_or_else(|| overflowed(field))
        };
        *self = Self {
            subtotal: sum("subtotal", self.subtotal, line.amount)?,
            gst_total: sum("gst_total", self.gst_total, line.gst_amount)?,
            transport_total: sum("transport_total", self.transport_total, transport)?,
            other_charges_total: sum("other_charges_total", self.other_charges_total, other)?,
            grand_total: sum("grand_total", self.grand_total, line.total)?,
        };
        Ok(())
    }
}

/// One line of a new purchase invoice
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct PurchaseLineInput {
    #[validate(range(min = 1))]
    pub item_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub rate: Decimal,
    /// Defaults to the item's GST percentage
    pub gst_percentage: Option<Decimal>,
    #[serde(default)]
    pub transport_charge: Decimal,
    #[serde(default)]
    pub other_charge: Decimal,
}

impl PurchaseLineInput {
    fn check(&self) -> Result<(), ServiceError> {
        self.validate()?;
        ensure_amount("rate", self.rate)?;
        ensure_amount("transport_charge", self.transport_charge)?;
        ensure_amount("other_charge", self.other_charge)?;
        if let Some(gst) = self.gst_percentage {
            ensure_amount("gst_percentage", gst)?;
        }
        Ok(())
    }
}

/// Input for recording a purchase invoice
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreatePurchaseInput {
    #[validate(length(min = 1, max = 50))]
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    #[validate(length(min = 1, max = 200))]
    pub vendor_name: String,
    #[validate(length(min = 1))]
    pub items: Vec<PurchaseLineInput>,
}

/// Purchase line with the item it refers to
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseLineView {
    #[serde(flatten)]
    pub line: purchase_item::Model,
    pub item_code: String,
    pub item_name: String,
}

/// Purchase header with its lines
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseDetail {
    #[serde(flatten)]
    pub purchase: purchase::Model,
    pub items: Vec<PurchaseLineView>,
}

/// Service for purchase invoices; every purchase adds to stock
#[derive(Clone)]
pub struct PurchaseService {
    db: DatabaseAccess,
}

impl PurchaseService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            db: DatabaseAccess::new(db_pool),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_purchases(&self, range: DateRange) -> Result<Vec<purchase::Model>, ServiceError> {
        range.validate()?;
        let query = purchase::Entity::find()
            .filter(range.condition(purchase::Column::InvoiceDate))
            .order_by_desc(purchase::Column::InvoiceDate)
            .order_by_desc(purchase::Column::Id);
        self.db
            .execute("list_purchases", |db| Box::pin(query.all(db)))
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_purchase(&self, id: i32) -> Result<PurchaseDetail, ServiceError> {
        load_detail(self.db.pool(), id).await
    }

    /// Records the invoice, its lines and the stock increments atomically
    #[instrument(skip(self, input), fields(invoice = %input.invoice_number, lines = input.items.len()))]
    pub async fn create_purchase(
        &self,
        input: CreatePurchaseInput,
    ) -> Result<PurchaseDetail, ServiceError> {
        input.validate()?;
        for line in &input.items {
            line.check()?;
        }
        let invoice_number = trimmed("invoice_number", &input.invoice_number)?;
        let vendor_name = trimmed("vendor_name", &input.vendor_name)?;
        let invoice_date = input.invoice_date;
        let lines = input.items;

        let detail = self
            .db
            .transaction::<_, _, ServiceError>("create_purchase", move |txn| {
                Box::pin(async move {
                    let mut totals = PurchaseTotals::default();
                    let mut priced = Vec::with_capacity(lines.len());
                    for line in lines {
                        let item = find_line_item(txn, line.item_id).await?;
                        let gst_percentage = line.gst_percentage.unwrap_or(item.gst_percentage);
                        let amounts = purchase_line_amounts(
                            line.quantity,
                            line.rate,
                            gst_percentage,
                            line.transport_charge,
                            line.other_charge,
                        )?;
                        totals.add(&amounts, line.transport_charge, line.other_charge)?;
                        priced.push((line, gst_percentage, amounts));
                    }

                    let header = purchase::ActiveModel {
                        invoice_number: Set(invoice_number.clone()),
                        invoice_date: Set(invoice_date),
                        vendor_name: Set(vendor_name.clone()),
                        subtotal: Set(totals.subtotal),
                        gst_total: Set(totals.gst_total),
                        transport_total: Set(totals.transport_total),
                        other_charges_total: Set(totals.other_charges_total),
                        grand_total: Set(totals.grand_total),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| {
                        ServiceError::from_constraint(
                            e,
                            format!(
                                "invoice {} from {} is already recorded",
                                invoice_number, vendor_name
                            ),
                        )
                    })?;

                    for (line, gst_percentage, amounts) in priced {
                        purchase_item::ActiveModel {
                            purchase_id: Set(header.id),
                            item_id: Set(line.item_id),
                            quantity: Set(line.quantity),
                            rate: Set(line.rate),
                            amount: Set(amounts.amount),
                            gst_percentage: Set(gst_percentage),
                            gst_amount: Set(amounts.gst_amount),
                            transport_charge: Set(line.transport_charge),
                            other_charge: Set(line.other_charge),
                            total: Set(amounts.total),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;
                        adjust_stock(txn, line.item_id, line.quantity).await?;
                    }

                    load_detail(txn, header.id).await
                })
            })
            .await?;

        counter!("katha.purchases.created", 1);
        info!(
            purchase_id = detail.purchase.id,
            grand_total = %detail.purchase.grand_total,
            "Recorded purchase"
        );
        Ok(detail)
    }

    /// Deletes a purchase and takes its quantities back out of stock.
    /// Refused when stock already sold would go negative.
    #[instrument(skip(self))]
    pub async fn delete_purchase(&self, id: i32) -> Result<(), ServiceError> {
        self.db
            .transaction::<_, _, ServiceError>("delete_purchase", move |txn| {
                Box::pin(async move {
                    let detail = load_detail(txn, id).await?;
                    for line in &detail.items {
                        adjust_stock(txn, line.line.item_id, -line.line.quantity).await?;
                    }
                    purchase_item::Entity::delete_many()
                        .filter(purchase_item::Column::PurchaseId.eq(id))
                        .exec(txn)
                        .await?;
                    purchase::Entity::delete_by_id(id).exec(txn).await?;
                    Ok(())
                })
            })
            .await?;

        info!(purchase_id = id, "Deleted purchase");
        Ok(())
    }
}

async fn load_detail<C>(db: &C, id: i32) -> Result<PurchaseDetail, ServiceError>
where
    C: ConnectionTrait,
{
    let purchase = purchase::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Purchase", id))?;

    let lines = purchase_item::Entity::find()
        .filter(purchase_item::Column::PurchaseId.eq(id))
        .order_by_asc(purchase_item::Column::Id)
        .all(db)
        .await?;

    let item_ids: Vec<i32> = lines.iter().map(|l| l.item_id).collect();
    let items: HashMap<i32, item::Model> = item::Entity::find()
        .filter(item::Column::Id.is_in(item_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|i| (i.id, i))
        .collect();

    let items = lines
        .into_iter()
        .map(|line| {
            let (item_code, item_name) = items
                .get(&line.item_id)
                .map(|i| (i.item_code.clone(), i.item_name.clone()))
                .unwrap_or_default();
            PurchaseLineView {
                line,
                item_code,
                item_name,
            }
        })
        .collect();

    Ok(PurchaseDetail { purchase, items })
}
