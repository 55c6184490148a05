use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "teachers")]
#[schema(as = Teacher)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub city_id: i32,
    pub basic_salary: Decimal,
    pub allowances: Decimal,
    pub deductions: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::city::Entity",
        from = "Column::CityId",
        to = "super::city::Column::Id"
    )]
    City,
}

impl Related<super::city::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::City.def()
    }
}

impl Model {
    /// Saturates instead of overflowing; requests are bounded well below that.
    pub fn net_salary(&self) -> Decimal {
        self.basic_salary
            .saturating_add(self.allowances)
            .saturating_sub(self.deductions)
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert && matches!(active_model.created_at, ActiveValue::NotSet) {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn teacher(basic: Decimal, allowances: Decimal, deductions: Decimal) -> Model {
        Model {
            id: 1,
            name: "Asha".into(),
            city_id: 1,
            basic_salary: basic,
            allowances,
            deductions,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn net_salary_never_overflows() {
        assert_eq!(
            teacher(dec!(30000), dec!(5000), dec!(1500)).net_salary(),
            dec!(33500)
        );
        assert_eq!(
            teacher(Decimal::MAX, Decimal::MAX, dec!(0)).net_salary(),
            Decimal::MAX
        );
    }
}
