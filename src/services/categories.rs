use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    db::{DatabaseAccess, DbPool},
    entities::{category, group, item},
    errors::ServiceError,
    numbering::{next_category_number, CategoryNumber, NumberingError},
    services::trimmed,
};

/// Converts a stored group number into the numbering domain
pub(crate) fn stored_group(group_number: i32) -> Result<u32, NumberingError> {
    u32::try_from(group_number)
        .ok()
        .filter(|n| *n > 0)
        .ok_or(NumberingError::InvalidGroup)
}

pub(crate) fn stored_sequence(sequence: i32) -> Result<u32, NumberingError> {
    u32::try_from(sequence)
        .ok()
        .filter(|n| *n > 0)
        .ok_or(NumberingError::InvalidSequence)
}

/// Category joined with its group
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryView {
    pub id: i32,
    pub category_number: i64,
    pub sequence: i32,
    pub category_name: String,
    pub group_id: i32,
    pub group_number: i32,
    pub group_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryView {
    fn new(category: category::Model, group: &group::Model) -> Self {
        Self {
            id: category.id,
            category_number: category.category_number,
            sequence: category.sequence,
            category_name: category.category_name,
            group_id: group.id,
            group_number: group.group_number,
            group_name: group.group_name.clone(),
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

/// Answer of the next-number lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NextCategoryNumber {
    pub group_id: i32,
    pub group_number: i32,
    pub next_number: i64,
}

/// A category whose stored number disagrees with its group and sequence
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NumberingIssue {
    pub category_id: i32,
    pub category_name: String,
    pub group_id: i32,
    pub group_number: i32,
    pub category_number: i64,
    pub sequence: i32,
    /// Number the row should carry, when its group and sequence are valid
    pub expected_number: Option<i64>,
    pub problem: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryFilter {
    /// Only categories of this group
    pub group_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NextNumberQuery {
    pub group_id: i32,
}

/// Input for creating a category
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateCategoryInput {
    #[validate(range(min = 1))]
    pub group_id: i32,
    #[validate(length(min = 1, max = 100))]
    pub category_name: String,
    /// Explicit number; must belong to the group and be unused.
    /// Assigned automatically when omitted.
    #[validate(range(min = 1))]
    pub category_number: Option<i64>,
}

/// Input for renaming a category
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub category_name: String,
}

/// Service for categories and their numbering
#[derive(Clone)]
pub struct CategoryService {
    db: DatabaseAccess,
}

impl CategoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            db: DatabaseAccess::new(db_pool),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        filter: CategoryFilter,
    ) -> Result<Vec<CategoryView>, ServiceError> {
        let mut query = category::Entity::find()
            .find_also_related(group::Entity)
            .order_by_asc(group::Column::GroupNumber)
            .order_by_asc(category::Column::Sequence);
        if let Some(group_id) = filter.group_id {
            query = query.filter(category::Column::GroupId.eq(group_id));
        }

        let rows = self
            .db
            .execute("list_categories", |db| Box::pin(query.all(db)))
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(category, group)| group.map(|g| CategoryView::new(category, &g)))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: i32) -> Result<CategoryView, ServiceError> {
        let (category, group) = category::Entity::find_by_id(id)
            .find_also_related(group::Entity)
            .one(self.db.pool())
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))?;
        let group = group.ok_or_else(|| ServiceError::not_found("Group", category.group_id))?;
        Ok(CategoryView::new(category, &group))
    }

    /// Number the next category created under the group would receive.
    /// Nothing is reserved; calling it twice yields the same answer.
    #[instrument(skip(self))]
    pub async fn next_number(&self, group_id: i32) -> Result<NextCategoryNumber, ServiceError> {
        let group = find_group(self.db.pool(), group_id).await?;
        let next = next_number_for(self.db.pool(), &group).await?;
        Ok(NextCategoryNumber {
            group_id: group.id,
            group_number: group.group_number,
            next_number: next.value(),
        })
    }

    /// Creates a category, assigning the next free number when none is given
    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<CategoryView, ServiceError> {
        input.validate()?;
        let name = trimmed("category_name", &input.category_name)?;
        let group_id = input.group_id;
        let requested = input.category_number;

        let view = self
            .db
            .transaction::<_, _, ServiceError>("create_category", move |txn| {
                Box::pin(async move {
                    let group = find_group(txn, group_id).await.map_err(|e| match e {
                        ServiceError::NotFound(msg) => ServiceError::InvalidInput(msg),
                        other => other,
                    })?;

                    let number = match requested {
                        Some(raw) => {
                            let number =
                                CategoryNumber::parse_for_group(stored_group(group.group_number)?, raw)?;
                            ensure_sequence_free(txn, &group, number).await?;
                            number
                        }
                        None => next_number_for(txn, &group).await?,
                    };

                    let sequence = i32::try_from(number.sequence()).map_err(|_| {
                        NumberingError::OutOfRange {
                            group: number.group(),
                            sequence: u64::from(number.sequence()),
                        }
                    })?;

                    let model = category::ActiveModel {
                        category_number: Set(number.value()),
                        sequence: Set(sequence),
                        category_name: Set(name),
                        group_id: Set(group.id),
                        ..Default::default()
                    };
                    let created = model.insert(txn).await.map_err(|e| {
                        ServiceError::from_constraint(
                            e,
                            format!("category number {} is already in use", number),
                        )
                    })?;
                    Ok(CategoryView::new(created, &group))
                })
            })
            .await?;

        info!(
            category_id = view.id,
            category_number = view.category_number,
            group_number = view.group_number,
            "Created category"
        );
        Ok(view)
    }

    /// Renames a category; its number never changes here
    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: i32,
        input: UpdateCategoryInput,
    ) -> Result<CategoryView, ServiceError> {
        input.validate()?;
        let name = trimmed("category_name", &input.category_name)?;

        let (existing, group) = category::Entity::find_by_id(id)
            .find_also_related(group::Entity)
            .one(self.db.pool())
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))?;
        let group = group.ok_or_else(|| ServiceError::not_found("Group", existing.group_id))?;

        let mut active = existing.into_active_model();
        active.category_name = Set(name);
        let updated = active.update(self.db.pool()).await?;

        info!(category_id = id, "Updated category");
        Ok(CategoryView::new(updated, &group))
    }

    /// Deletes a category that has no items
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i32) -> Result<(), ServiceError> {
        let db = self.db.pool();
        let existing = category::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))?;

        let items = item::Entity::find()
            .filter(item::Column::CategoryId.eq(existing.id))
            .count(db)
            .await?;
        if items > 0 {
            return Err(ServiceError::Conflict(format!(
                "category {} still has {} items",
                existing.category_number, items
            )));
        }

        category::Entity::delete_by_id(id).exec(db).await?;
        info!(category_id = id, "Deleted category");
        Ok(())
    }

    /// Lists categories whose stored number breaks the group-prefix convention
    #[instrument(skip(self))]
    pub async fn audit_numbers(&self) -> Result<Vec<NumberingIssue>, ServiceError> {
        let rows = category::Entity::find()
            .find_also_related(group::Entity)
            .order_by_asc(category::Column::Id)
            .all(self.db.pool())
            .await?;

        let issues: Vec<NumberingIssue> = rows
            .into_iter()
            .filter_map(|(category, group)| group.and_then(|g| inspect(&category, &g)))
            .collect();

        if !issues.is_empty() {
            warn!(count = issues.len(), "Category numbering audit found issues");
        }
        Ok(issues)
    }
}

async fn find_group<C>(db: &C, group_id: i32) -> Result<group::Model, ServiceError>
where
    C: ConnectionTrait,
{
    group::Entity::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Group", group_id))
}

/// Derives the next number from the stored sequences of the group.
/// Rows that cannot be read as part of the group are skipped with a warning.
async fn next_number_for<C>(db: &C, group: &group::Model) -> Result<CategoryNumber, ServiceError>
where
    C: ConnectionTrait,
{
    let group_part = stored_group(group.group_number)?;
    let rows = category::Entity::find()
        .filter(category::Column::GroupId.eq(group.id))
        .all(db)
        .await?;

    let existing = rows.iter().filter_map(|row| {
        let number = stored_sequence(row.sequence)
            .and_then(|sequence| CategoryNumber::new(group_part, sequence));
        match number {
            Ok(number) => {
                if number.value() != row.category_number {
                    warn!(
                        category_id = row.id,
                        stored = row.category_number,
                        expected = number.value(),
                        "Category number does not match its sequence"
                    );
                }
                Some(number)
            }
            Err(e) => {
                warn!(category_id = row.id, error = %e, "Skipping category with unusable sequence");
                None
            }
        }
    });

    Ok(next_category_number(group_part, existing)?)
}

async fn ensure_sequence_free<C>(
    db: &C,
    group: &group::Model,
    number: CategoryNumber,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let taken = category::Entity::find()
        .filter(category::Column::GroupId.eq(group.id))
        .filter(
            sea_orm::Condition::any()
                .add(category::Column::Sequence.eq(number.sequence()))
                .add(category::Column::CategoryNumber.eq(number.value())),
        )
        .count(db)
        .await?;
    if taken > 0 {
        return Err(ServiceError::Conflict(format!(
            "category number {} is already in use",
            number
        )));
    }
    Ok(())
}

fn inspect(category: &category::Model, group: &group::Model) -> Option<NumberingIssue> {
    let expected = stored_group(group.group_number)
        .and_then(|g| CategoryNumber::new(g, stored_sequence(category.sequence)?));

    let problem = match &expected {
        Err(e) => e.to_string(),
        Ok(expected) => {
            match CategoryNumber::parse_for_group(expected.group(), category.category_number) {
                Ok(parsed) if parsed == *expected => return None,
                Ok(_) => format!(
                    "category number {} does not match sequence {}",
                    category.category_number, category.sequence
                ),
                Err(e) => e.to_string(),
            }
        }
    };

    Some(NumberingIssue {
        category_id: category.id,
        category_name: category.category_name.clone(),
        group_id: group.id,
        group_number: group.group_number,
        category_number: category.category_number,
        sequence: category.sequence,
        expected_number: expected.ok().map(|n| n.value()),
        problem,
    })
}
