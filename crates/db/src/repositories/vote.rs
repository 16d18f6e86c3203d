//! Vote and vote option repositories.

use std::sync::Arc;

use crate::entities::{Vote, VoteOption, vote, vote_option};
use crate::is_unique_violation;
use alumni_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Vote option repository for database operations.
#[derive(Clone)]
pub struct VoteOptionRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteOptionRepository {
    /// Create a new vote option repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// List options ordered by label.
    pub async fn find_all(&self) -> AppResult<Vec<vote_option::Model>> {
        VoteOption::find()
            .order_by_asc(vote_option::Column::Label)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an option by its label.
    pub async fn find_by_label(&self, label: &str) -> AppResult<Option<vote_option::Model>> {
        VoteOption::find()
            .filter(vote_option::Column::Label.eq(label))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new option. A concurrent insert of the same label loses on the unique index.
    pub async fn create(&self, model: vote_option::ActiveModel) -> AppResult<vote_option::Model> {
        let label = model.label.clone().take().unwrap_or_default();
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateLabel(label)
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Delete an option. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = VoteOption::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

/// Number of votes recorded for one label.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ChoiceCount {
    pub choice: String,
    pub votes: i64,
}

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the vote cast by a user.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a vote. The unique index on `user_id` rejects a second vote.
    pub async fn create(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyVoted
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Count votes per chosen label.
    pub async fn count_by_choice(&self) -> AppResult<Vec<ChoiceCount>> {
        Vote::find()
            .select_only()
            .column(vote::Column::Choice)
            .column_as(vote::Column::Id.count(), "votes")
            .group_by(vote::Column::Choice)
            .order_by_asc(vote::Column::Choice)
            .into_model::<ChoiceCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all votes.
    pub async fn count(&self) -> AppResult<u64> {
        Vote::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
