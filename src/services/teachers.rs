use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{city, teacher},
    errors::ServiceError,
    services::{cities::CityService, ensure_amount, trimmed},
};

/// Teacher with city name and computed net salary
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeacherView {
    pub id: i32,
    pub name: String,
    pub city_id: i32,
    pub city_name: String,
    pub basic_salary: Decimal,
    pub allowances: Decimal,
    pub deductions: Decimal,
    pub net_salary: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeacherView {
    fn new(teacher: teacher::Model, city: &city::Model) -> Self {
        Self {
            net_salary: teacher.net_salary(),
            id: teacher.id,
            name: teacher.name,
            city_id: city.id,
            city_name: city.name.clone(),
            basic_salary: teacher.basic_salary,
            allowances: teacher.allowances,
            deductions: teacher.deductions,
            created_at: teacher.created_at,
            updated_at: teacher.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeacherFilter {
    /// Only teachers of the city with this exact name
    #[serde(rename = "cityName")]
    pub city_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateTeacherInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 1))]
    pub city_id: i32,
    #[serde(default)]
    pub basic_salary: Decimal,
    #[serde(default)]
    pub allowances: Decimal,
    #[serde(default)]
    pub deductions: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateTeacherInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub city_id: Option<i32>,
    pub basic_salary: Option<Decimal>,
    pub allowances: Option<Decimal>,
    pub deductions: Option<Decimal>,
}

fn check_salary(fields: [(&str, Option<Decimal>); 3]) -> Result<(), ServiceError> {
    for (field, value) in fields {
        if let Some(value) = value {
            ensure_amount(field, value)?;
        }
    }
    Ok(())
}

/// Service for teachers and their salaries
#[derive(Clone)]
pub struct TeacherService {
    db_pool: Arc<DbPool>,
    cities: CityService,
}

impl TeacherService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            cities: CityService::new(db_pool.clone()),
            db_pool,
        }
    }

    /// Lists teachers, optionally only those of one city.
    /// An unknown city name is reported as not found.
    #[instrument(skip(self))]
    pub async fn list_teachers(&self, filter: TeacherFilter) -> Result<Vec<TeacherView>, ServiceError> {
        let mut query = teacher::Entity::find()
            .find_also_related(city::Entity)
            .order_by_asc(teacher::Column::Name);

        if let Some(name) = filter.city_name.as_deref().filter(|n| !n.trim().is_empty()) {
            let city = self.cities.find_by_name(name).await?;
            query = query.filter(teacher::Column::CityId.eq(city.id));
        }

        let rows = query.all(&*self.db_pool).await?;
        Ok(rows
            .into_iter()
            .filter_map(|(teacher, city)| city.map(|c| TeacherView::new(teacher, &c)))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_teacher(&self, id: i32) -> Result<TeacherView, ServiceError> {
        let (teacher, city) = teacher::Entity::find_by_id(id)
            .find_also_related(city::Entity)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Teacher", id))?;
        let city = city.ok_or_else(|| ServiceError::not_found("City", teacher.city_id))?;
        Ok(TeacherView::new(teacher, &city))
    }

    #[instrument(skip(self))]
    pub async fn create_teacher(&self, input: CreateTeacherInput) -> Result<TeacherView, ServiceError> {
        input.validate()?;
        check_salary([
            ("basic_salary", Some(input.basic_salary)),
            ("allowances", Some(input.allowances)),
            ("deductions", Some(input.deductions)),
        ])?;
        let name = trimmed("name", &input.name)?;
        let city = self.find_city(input.city_id).await?;

        let created = teacher::ActiveModel {
            name: Set(name),
            city_id: Set(city.id),
            basic_salary: Set(input.basic_salary),
            allowances: Set(input.allowances),
            deductions: Set(input.deductions),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(teacher_id = created.id, city = %city.name, "Created teacher");
        Ok(TeacherView::new(created, &city))
    }

    #[instrument(skip(self))]
    pub async fn update_teacher(
        &self,
        id: i32,
        input: UpdateTeacherInput,
    ) -> Result<TeacherView, ServiceError> {
        input.validate()?;
        check_salary([
            ("basic_salary", input.basic_salary),
            ("allowances", input.allowances),
            ("deductions", input.deductions),
        ])?;

        let existing = teacher::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Teacher", id))?;
        let city = self
            .find_city(input.city_id.unwrap_or(existing.city_id))
            .await?;

        let mut active = existing.into_active_model();
        if let Some(name) = input.name.as_deref() {
            active.name = Set(trimmed("name", name)?);
        }
        active.city_id = Set(city.id);
        if let Some(value) = input.basic_salary {
            active.basic_salary = Set(value);
        }
        if let Some(value) = input.allowances {
            active.allowances = Set(value);
        }
        if let Some(value) = input.deductions {
            active.deductions = Set(value);
        }

        let updated = active.update(&*self.db_pool).await?;
        info!(teacher_id = id, "Updated teacher");
        Ok(TeacherView::new(updated, &city))
    }

    #[instrument(skip(self))]
    pub async fn delete_teacher(&self, id: i32) -> Result<(), ServiceError> {
        let result = teacher::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Teacher", id));
        }
        info!(teacher_id = id, "Deleted teacher");
        Ok(())
    }

    async fn find_city(&self, id: i32) -> Result<city::Model, ServiceError> {
        city::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::InvalidInput(format!("city {} does not exist", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cities::CreateCityInput;
    use crate::services::test_pool;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    async fn city(pool: &Arc<DbPool>, name: &str) -> city::Model {
        CityService::new(pool.clone())
            .create_city(CreateCityInput { name: name.into() })
            .await
            .unwrap()
    }

    fn teacher_in(city_id: i32, name: &str) -> CreateTeacherInput {
        CreateTeacherInput {
            name: name.into(),
            city_id,
            basic_salary: dec!(30000),
            allowances: dec!(5000),
            deductions: dec!(1500),
        }
    }

    #[tokio::test]
    async fn net_salary_is_derived() {
        let pool = test_pool().await;
        let pune = city(&pool, "Pune").await;
        let service = TeacherService::new(pool);

        let created = service.create_teacher(teacher_in(pune.id, "Asha")).await.unwrap();
        assert_eq!(created.net_salary, dec!(33500));
        assert_eq!(created.city_name, "Pune");

        let updated = service
            .update_teacher(
                created.id,
                UpdateTeacherInput {
                    deductions: Some(dec!(0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.net_salary, dec!(35000));
    }

    #[tokio::test]
    async fn filter_by_city_name() {
        let pool = test_pool().await;
        let pune = city(&pool, "Pune").await;
        let nashik = city(&pool, "Nashik").await;
        let service = TeacherService::new(pool);
        service.create_teacher(teacher_in(pune.id, "Asha")).await.unwrap();
        service.create_teacher(teacher_in(nashik.id, "Ravi")).await.unwrap();

        let in_pune = service
            .list_teachers(TeacherFilter {
                city_name: Some("Pune".into()),
            })
            .await
            .unwrap();
        assert_eq!(in_pune.len(), 1);
        assert_eq!(in_pune[0].name, "Asha");

        assert_eq!(service.list_teachers(TeacherFilter::default()).await.unwrap().len(), 2);
        assert_matches!(
            service
                .list_teachers(TeacherFilter {
                    city_name: Some("Atlantis".into()),
                })
                .await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn oversized_salaries_are_rejected() {
        let pool = test_pool().await;
        let pune = city(&pool, "Pune").await;
        let service = TeacherService::new(pool);

        let input = CreateTeacherInput {
            basic_salary: Decimal::MAX,
            allowances: Decimal::MAX,
            ..teacher_in(pune.id, "Asha")
        };
        assert_matches!(
            service.create_teacher(input).await,
            Err(ServiceError::ValidationError(_))
        );
        assert!(service.list_teachers(TeacherFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_missing_teacher_is_not_found() {
        let service = TeacherService::new(test_pool().await);
        assert_matches!(service.delete_teacher(7).await, Err(ServiceError::NotFound(_)));
    }
}
