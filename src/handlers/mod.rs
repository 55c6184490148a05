pub mod common;
pub mod health;

// Masters
pub mod categories;
pub mod groups;
pub mod items;

// Invoices
pub mod cash_sales;
pub mod purchases;

pub mod reports;

// School administration
pub mod cities;
pub mod teachers;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        cash_sale::CashSaleService, categories::CategoryService, cities::CityService,
        groups::GroupService, items::ItemService, purchases::PurchaseService,
        reports::ReportService, teachers::TeacherService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub groups: Arc<GroupService>,
    pub categories: Arc<CategoryService>,
    pub items: Arc<ItemService>,
    pub purchases: Arc<PurchaseService>,
    pub cash_sales: Arc<CashSaleService>,
    pub reports: Arc<ReportService>,
    pub cities: Arc<CityService>,
    pub teachers: Arc<TeacherService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            groups: Arc::new(GroupService::new(db_pool.clone())),
            categories: Arc::new(CategoryService::new(db_pool.clone())),
            items: Arc::new(ItemService::new(db_pool.clone())),
            purchases: Arc::new(PurchaseService::new(db_pool.clone())),
            cash_sales: Arc::new(CashSaleService::new(
                db_pool.clone(),
                config.cash_sale_invoice_prefix.as_str(),
            )),
            reports: Arc::new(ReportService::new(db_pool.clone())),
            cities: Arc::new(CityService::new(db_pool.clone())),
            teachers: Arc::new(TeacherService::new(db_pool)),
        }
    }
}
