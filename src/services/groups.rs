use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::{DatabaseAccess, DbPool},
    entities::{category, group},
    errors::ServiceError,
    numbering::CategoryNumber,
    services::{categories::stored_group, categories::stored_sequence, trimmed},
};

/// Service for the top level of the group/category hierarchy
#[derive(Clone)]
pub struct GroupService {
    db: DatabaseAccess,
}

impl GroupService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            db: DatabaseAccess::new(db_pool),
        }
    }

    /// Lists all groups ordered by group number
    #[instrument(skip(self))]
    pub async fn list_groups(&self) -> Result<Vec<group::Model>, ServiceError> {
        self.db
            .execute("list_groups", |db| {
                Box::pin(
                    group::Entity::find()
                        .order_by_asc(group::Column::GroupNumber)
                        .all(db),
                )
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_group(&self, id: i32) -> Result<group::Model, ServiceError> {
        group::Entity::find_by_id(id)
            .one(self.db.pool())
            .await?
            .ok_or_else(|| ServiceError::not_found("Group", id))
    }

    /// Creates a group; the number must be positive and unused
    #[instrument(skip(self))]
    pub async fn create_group(&self, input: CreateGroupInput) -> Result<group::Model, ServiceError> {
        input.validate()?;
        let name = trimmed("group_name", &input.group_name)?;

        let model = group::ActiveModel {
            group_number: Set(input.group_number),
            group_name: Set(name),
            ..Default::default()
        };
        let created = model.insert(self.db.pool()).await.map_err(|e| {
            ServiceError::from_constraint(
                e,
                format!("group number {} is already in use", input.group_number),
            )
        })?;

        info!(group_id = created.id, group_number = created.group_number, "Created group");
        Ok(created)
    }

    /// Updates a group. Changing the number re-composes the numbers of every
    /// category in the group within the same transaction.
    #[instrument(skip(self))]
    pub async fn update_group(
        &self,
        id: i32,
        input: UpdateGroupInput,
    ) -> Result<group::Model, ServiceError> {
        input.validate()?;
        let name = input
            .group_name
            .as_deref()
            .map(|name| trimmed("group_name", name))
            .transpose()?;
        let requested_number = input.group_number;

        let (updated, recomposed) = self
            .db
            .transaction::<_, _, ServiceError>("update_group", move |txn| {
                Box::pin(async move {
                    let existing = group::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::not_found("Group", id))?;

                    let renumber = requested_number.filter(|n| *n != existing.group_number);
                    let mut active = existing.into_active_model();
                    if let Some(name) = name {
                        active.group_name = Set(name);
                    }
                    if let Some(number) = renumber {
                        active.group_number = Set(number);
                    }

                    let updated = active.update(txn).await.map_err(|e| {
                        ServiceError::from_constraint(
                            e,
                            format!(
                                "group number {} is already in use",
                                requested_number.unwrap_or_default()
                            ),
                        )
                    })?;

                    let recomposed = match renumber {
                        Some(number) => recompose_categories(txn, updated.id, number).await?,
                        None => 0,
                    };
                    Ok((updated, recomposed))
                })
            })
            .await?;

        info!(
            group_id = updated.id,
            group_number = updated.group_number,
            recomposed,
            "Updated group"
        );
        Ok(updated)
    }

    /// Deletes a group that has no categories
    #[instrument(skip(self))]
    pub async fn delete_group(&self, id: i32) -> Result<(), ServiceError> {
        let db = self.db.pool();
        let group = self.get_group(id).await?;

        let categories = category::Entity::find()
            .filter(category::Column::GroupId.eq(group.id))
            .count(db)
            .await?;
        if categories > 0 {
            return Err(ServiceError::Conflict(format!(
                "group {} still has {} categories",
                group.group_number, categories
            )));
        }

        group::Entity::delete_by_id(id).exec(db).await?;
        info!(group_id = id, "Deleted group");
        Ok(())
    }
}

/// Rewrites `category_number` of every category in the group from its stored
/// sequence. Returns how many rows changed.
pub(crate) async fn recompose_categories<C>(
    db: &C,
    group_id: i32,
    group_number: i32,
) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
{
    let group = stored_group(group_number)?;
    let rows = category::Entity::find()
        .filter(category::Column::GroupId.eq(group_id))
        .all(db)
        .await?;

    let mut changed = 0;
    for row in rows {
        let number = CategoryNumber::new(group, stored_sequence(row.sequence)?)?;
        if number.value() == row.category_number {
            continue;
        }
        let mut active = row.into_active_model();
        active.category_number = Set(number.value());
        active.update(db).await?;
        changed += 1;
    }
    Ok(changed)
}

/// Input for creating a group
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateGroupInput {
    #[validate(range(min = 1))]
    pub group_number: i32,
    #[validate(length(min = 1, max = 100))]
    pub group_name: String,
}

/// Input for updating a group
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateGroupInput {
    #[validate(range(min = 1))]
    pub group_number: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub group_name: Option<String>,
}
