//! User repository.

use std::sync::Arc;

use crate::entities::{Role, User, user};
use crate::is_unique_violation;
use alumni_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, sea_query::Expr,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by login identifier.
    pub async fn find_by_nni(&self, nni: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Nni.eq(nni))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List every member, oldest first.
    pub async fn find_all(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count unblocked users holding the admin role.
    pub async fn count_admins(&self) -> AppResult<u64> {
        User::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .filter(user::Column::IsBlocked.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Start a transaction for changes that must see a stable admin pool.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count unblocked admins inside `txn`, holding row locks on them until it ends.
    pub async fn count_admins_locked(txn: &DatabaseTransaction) -> AppResult<u64> {
        User::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .filter(user::Column::IsBlocked.eq(false))
            .lock_exclusive()
            .count(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a user inside `txn`.
    pub async fn update_in(
        txn: &DatabaseTransaction,
        model: user::ActiveModel,
    ) -> AppResult<user::Model> {
        model.update(txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("NNI already registered".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Delete a user inside `txn`.
    pub async fn delete_in(txn: &DatabaseTransaction, id: &str) -> AppResult<()> {
        User::delete_by_id(id)
            .exec(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("NNI already registered".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.update(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("NNI already registered".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Delete a user. Their vote goes with them.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        User::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Install a fresh session token.
    pub async fn set_token(&self, user_id: &str, token: &str) -> AppResult<()> {
        User::update_many()
            .col_expr(user::Column::Token, Expr::value(token))
            .col_expr(user::Column::TokenLastUsedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Record activity on the current token (single UPDATE query, no fetch).
    pub async fn touch_token(&self, user_id: &str) -> AppResult<()> {
        User::update_many()
            .col_expr(user::Column::TokenLastUsedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Revoke the session token.
    pub async fn clear_token(&self, user_id: &str) -> AppResult<()> {
        User::update_many()
            .col_expr(user::Column::Token, Expr::value(Option::<String>::None))
            .col_expr(
                user::Column::TokenLastUsedAt,
                Expr::value(Option::<chrono::DateTime<Utc>>::None),
            )
            .filter(user::Column::Id.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
