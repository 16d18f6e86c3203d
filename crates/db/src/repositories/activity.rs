//! Activity repository.

use std::sync::Arc;

use alumni_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Expr, extension::postgres::PgExpr},
};

use crate::entities::{Activity, activity};

/// Ordering of the activity board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivityOrder {
    /// Most recent date first.
    #[default]
    DateDesc,
    /// Oldest date first.
    DateAsc,
    /// Alphabetical by title.
    Title,
}

/// Repository for activity operations.
#[derive(Clone)]
pub struct ActivityRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityRepository {
    /// Create a new activity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find activity by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<activity::Model>> {
        Activity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find activity by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<activity::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity not found: {id}")))
    }

    /// Search the board, case-insensitively over title and description.
    pub async fn search(
        &self,
        query: Option<&str>,
        order: ActivityOrder,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<activity::Model>> {
        let select = Self::filtered(query);

        let select = match order {
            ActivityOrder::DateDesc => select
                .order_by_desc(activity::Column::Date)
                .order_by_desc(activity::Column::CreatedAt),
            ActivityOrder::DateAsc => select
                .order_by_asc(activity::Column::Date)
                .order_by_asc(activity::Column::CreatedAt),
            ActivityOrder::Title => select
                .order_by_asc(activity::Column::Title)
                .order_by_desc(activity::Column::Date),
        };

        select
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count activities matching a search.
    pub async fn count(&self, query: Option<&str>) -> AppResult<u64> {
        Self::filtered(query)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn filtered(query: Option<&str>) -> Select<Activity> {
        let select = Activity::find();
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                let pattern = like_pattern(q);
                select.filter(
                    Condition::any()
                        .add(Expr::col(activity::Column::Title).ilike(&pattern))
                        .add(Expr::col(activity::Column::Description).ilike(&pattern)),
                )
            }
            None => select,
        }
    }

    /// Create a new activity.
    pub async fn create(&self, model: activity::ActiveModel) -> AppResult<activity::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an activity.
    pub async fn update(&self, model: activity::ActiveModel) -> AppResult<activity::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an activity. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Activity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

/// Substring pattern for `ILIKE` with `\`, `%` and `_` taken literally.
fn like_pattern(q: &str) -> String {
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
