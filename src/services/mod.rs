// Masters
pub mod categories;
pub mod groups;
pub mod items;

// Invoices
pub mod cash_sale;
pub mod purchases;

// Reporting
pub mod reports;

// School administration
pub mod cities;
pub mod teachers;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Condition};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::ServiceError;

/// Inclusive invoice-date window used by list and report endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRange {
    /// First invoice date to include (YYYY-MM-DD)
    pub from: Option<NaiveDate>,
    /// Last invoice date to include (YYYY-MM-DD)
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn validate(&self) -> Result<(), ServiceError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(ServiceError::ValidationError(format!(
                "from ({}) is after to ({})",
                from, to
            ))),
            _ => Ok(()),
        }
    }

    /// Filter on `column` restricted to this window
    pub fn condition<C: ColumnTrait>(&self, column: C) -> Condition {
        let mut condition = Condition::all();
        if let Some(from) = self.from {
            condition = condition.add(column.gte(from));
        }
        if let Some(to) = self.to {
            condition = condition.add(column.lte(to));
        }
        condition
    }
}

/// Rounds a money amount to paise
pub(crate) fn money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// Upper bound on any money value or percentage taken from a request
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Rejects negative values and values above [`MAX_AMOUNT`]
pub(crate) fn ensure_amount(field: &str, value: Decimal) -> Result<(), ServiceError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be negative",
            field
        )));
    }
    if value > Decimal::from(MAX_AMOUNT) {
        return Err(ServiceError::ValidationError(format!(
            "{} must not exceed {}",
            field, MAX_AMOUNT
        )));
    }
    Ok(())
}

/// Maps a failed checked operation on `field` to a validation error
pub(crate) fn overflowed(field: &str) -> ServiceError {
    ServiceError::ValidationError(format!("{} is too large", field))
}

pub(crate) fn trimmed(field: &str, value: &str) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be blank",
            field
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> std::sync::Arc<crate::db::DbPool> {
    let config = crate::db::DbConfig {
        url: "sqlite::memory:".into(),
        max_connections: 1,
        ..Default::default()
    };
    let pool = crate::db::establish_connection_with_config(&config)
        .await
        .unwrap();
    crate::db::run_migrations(&pool).await.unwrap();
    std::sync::Arc::new(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn reversed_range_is_rejected() {
        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2024, 3, 2),
            to: NaiveDate::from_ymd_opt(2024, 3, 1),
        };
        assert!(range.validate().is_err());
        assert!(DateRange::default().validate().is_ok());
    }

    #[test]
    fn money_rounds_to_two_places() {
        assert_eq!(money(dec!(10.005)), dec!(10.00));
        assert_eq!(money(dec!(10.015)), dec!(10.02));
    }

    #[test]
    fn amounts_are_bounded() {
        assert!(ensure_amount("rate", dec!(0)).is_ok());
        assert!(ensure_amount("rate", Decimal::from(MAX_AMOUNT)).is_ok());
        assert!(ensure_amount("rate", dec!(-0.01)).is_err());
        assert!(ensure_amount("rate", Decimal::MAX).is_err());
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(trimmed("group_name", "   ").is_err());
        assert_eq!(trimmed("group_name", "  Grocery ").unwrap(), "Grocery");
    }
}
