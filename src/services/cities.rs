use std::sync::Arc;

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::city,
    errors::ServiceError,
    services::trimmed,
};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateCityInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Clone)]
pub struct CityService {
    db_pool: Arc<DbPool>,
}

impl CityService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_cities(&self) -> Result<Vec<city::Model>, ServiceError> {
        Ok(city::Entity::find()
            .order_by_asc(city::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn create_city(&self, input: CreateCityInput) -> Result<city::Model, ServiceError> {
        input.validate()?;
        let name = trimmed("name", &input.name)?;

        let created = city::ActiveModel {
            name: Set(name.clone()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::from_constraint(e, format!("city {} already exists", name)))?;

        info!(city_id = created.id, name = %created.name, "Created city");
        Ok(created)
    }

    /// Looks a city up by exact name
    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> Result<city::Model, ServiceError> {
        city::Entity::find()
            .filter(city::Column::Name.eq(name.trim()))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("City {} not found", name.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_pool;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn names_are_trimmed_and_unique() {
        let service = CityService::new(test_pool().await);
        let city = service
            .create_city(CreateCityInput {
                name: "  Pune ".into(),
            })
            .await
            .unwrap();
        assert_eq!(city.name, "Pune");

        assert_matches!(
            service
                .create_city(CreateCityInput {
                    name: "Pune".into()
                })
                .await,
            Err(ServiceError::Conflict(_))
        );
        assert_matches!(
            service
                .create_city(CreateCityInput { name: "   ".into() })
                .await,
            Err(ServiceError::ValidationError(_))
        );
    }
}
