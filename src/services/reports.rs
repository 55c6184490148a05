use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::{cash_sale, cash_sale_item, category, group, item, purchase},
    errors::ServiceError,
    services::DateRange,
};

/// Service for generating stock and invoice reports
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

/// One item on the stock report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockReportRow {
    pub item_id: i32,
    pub item_code: String,
    pub item_name: String,
    pub group_number: i32,
    pub group_name: String,
    pub category_number: i64,
    pub category_name: String,
    pub current_stock: i32,
    pub reorder_level: i32,
    pub mrp: Decimal,
    pub stock_value: Decimal,
    pub low_stock: bool,
}

/// Stock report data
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockReport {
    pub total_items: usize,
    pub low_stock_items: usize,
    pub total_stock_value: Decimal,
    pub items: Vec<StockReportRow>,
}

/// Cash sales of one day
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailySales {
    pub date: NaiveDate,
    pub invoices: u64,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub grand_total: Decimal,
}

/// Sales summary report data
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalesSummaryReport {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub invoices: u64,
    pub grand_total: Decimal,
    pub days: Vec<DailySales>,
}

/// Purchases from one vendor
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VendorPurchases {
    pub vendor_name: String,
    pub invoices: u64,
    pub subtotal: Decimal,
    pub gst_total: Decimal,
    pub grand_total: Decimal,
}

/// Purchase summary report data
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseSummaryReport {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub invoices: u64,
    pub grand_total: Decimal,
    pub vendors: Vec<VendorPurchases>,
}

/// Quantity and amount sold of one item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemSales {
    pub item_id: i32,
    pub item_code: String,
    pub item_name: String,
    pub quantity: i64,
    pub amount: Decimal,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Every item with its group and category, valued at MRP
    #[instrument(skip(self))]
    pub async fn stock_report(&self) -> Result<StockReport, ServiceError> {
        let db = &*self.db_pool;

        let groups: HashMap<i32, group::Model> = group::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();
        let rows = item::Entity::find()
            .find_also_related(category::Entity)
            .order_by_asc(item::Column::ItemCode)
            .all(db)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for (item, category) in rows {
            let Some(category) = category else { continue };
            let Some(group) = groups.get(&category.group_id) else {
                continue;
            };
            items.push(StockReportRow {
                stock_value: item.stock_value(),
                low_stock: item.is_low_stock(),
                item_id: item.id,
                item_code: item.item_code,
                item_name: item.item_name,
                group_number: group.group_number,
                group_name: group.group_name.clone(),
                category_number: category.category_number,
                category_name: category.category_name,
                current_stock: item.current_stock,
                reorder_level: item.reorder_level,
                mrp: item.mrp,
            });
        }
        items.sort_by_key(|row| (row.group_number, row.category_number, row.item_code.clone()));

        let report = StockReport {
            total_items: items.len(),
            low_stock_items: items.iter().filter(|row| row.low_stock).count(),
            total_stock_value: items.iter().map(|row| row.stock_value).sum(),
            items,
        };
        info!(
            total_items = report.total_items,
            low_stock_items = report.low_stock_items,
            "Generated stock report"
        );
        Ok(report)
    }

    /// Cash sales grouped by invoice date
    #[instrument(skip(self))]
    pub async fn sales_summary(&self, range: DateRange) -> Result<SalesSummaryReport, ServiceError> {
        range.validate()?;
        let sales = cash_sale::Entity::find()
            .filter(range.condition(cash_sale::Column::InvoiceDate))
            .all(&*self.db_pool)
            .await?;

        let mut days: BTreeMap<NaiveDate, DailySales> = BTreeMap::new();
        for sale in &sales {
            let day = days.entry(sale.invoice_date).or_insert_with(|| DailySales {
                date: sale.invoice_date,
                invoices: 0,
                subtotal: Decimal::ZERO,
                discount: Decimal::ZERO,
                grand_total: Decimal::ZERO,
            });
            day.invoices += 1;
            day.subtotal += sale.subtotal;
            day.discount += sale.discount;
            day.grand_total += sale.grand_total;
        }

        Ok(SalesSummaryReport {
            from: range.from,
            to: range.to,
            invoices: sales.len() as u64,
            grand_total: sales.iter().map(|s| s.grand_total).sum(),
            days: days.into_values().collect(),
        })
    }

    /// Purchases grouped by vendor, largest first
    #[instrument(skip(self))]
    pub async fn purchase_summary(
        &self,
        range: DateRange,
    ) -> Result<PurchaseSummaryReport, ServiceError> {
        range.validate()?;
        let purchases = purchase::Entity::find()
            .filter(range.condition(purchase::Column::InvoiceDate))
            .all(&*self.db_pool)
            .await?;

        let mut vendors: HashMap<String, VendorPurchases> = HashMap::new();
        for p in &purchases {
            let vendor = vendors
                .entry(p.vendor_name.clone())
                .or_insert_with(|| VendorPurchases {
                    vendor_name: p.vendor_name.clone(),
                    invoices: 0,
                    subtotal: Decimal::ZERO,
                    gst_total: Decimal::ZERO,
                    grand_total: Decimal::ZERO,
                });
            vendor.invoices += 1;
            vendor.subtotal += p.subtotal;
            vendor.gst_total += p.gst_total;
            vendor.grand_total += p.grand_total;
        }

        let mut vendors: Vec<VendorPurchases> = vendors.into_values().collect();
        vendors.sort_by(|a, b| {
            b.grand_total
                .cmp(&a.grand_total)
                .then_with(|| a.vendor_name.cmp(&b.vendor_name))
        });

        Ok(PurchaseSummaryReport {
            from: range.from,
            to: range.to,
            invoices: purchases.len() as u64,
            grand_total: purchases.iter().map(|p| p.grand_total).sum(),
            vendors,
        })
    }

    /// Quantity and amount sold per item, best sellers first
    #[instrument(skip(self))]
    pub async fn item_sales(&self, range: DateRange) -> Result<Vec<ItemSales>, ServiceError> {
        range.validate()?;
        let lines = cash_sale_item::Entity::find()
            .find_also_related(cash_sale::Entity)
            .filter(range.condition(cash_sale::Column::InvoiceDate))
            .all(&*self.db_pool)
            .await?;

        let mut totals: HashMap<i32, ItemSales> = HashMap::new();
        for (line, _) in lines {
            let entry = totals.entry(line.item_id).or_insert_with(|| ItemSales {
                item_id: line.item_id,
                item_code: line.item_code.clone(),
                item_name: line.item_name.clone(),
                quantity: 0,
                amount: Decimal::ZERO,
            });
            entry.quantity += i64::from(line.quantity);
            entry.amount += line.amount;
        }

        let mut rows: Vec<ItemSales> = totals.into_values().collect();
        rows.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then_with(|| a.item_code.cmp(&b.item_code))
        });
        Ok(rows)
    }
}
