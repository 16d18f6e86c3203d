//! User service.

use alumni_common::{AppError, AppResult, IdGenerator, config::BootstrapAdminConfig};
use alumni_db::{
    entities::{Role, user},
    repositories::UserRepository,
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{DatabaseTransaction, Set};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

/// Login identifier: 8 to 15 digits with an optional leading `+`.
#[allow(clippy::expect_used)]
static NNI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("nni pattern is valid"));

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a member, by self-registration or by an admin.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    #[validate(regex(path = *NNI_PATTERN, message = "nni must be 8 to 15 digits"))]
    pub nni: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 256))]
    pub name: String,

    /// Ignored on self-registration.
    pub role: Option<Role>,

    #[validate(length(max = 512))]
    pub address: Option<String>,

    #[validate(length(max = 256))]
    pub job: Option<String>,

    #[validate(length(max = 256))]
    pub domain: Option<String>,

    #[validate(length(max = 10000))]
    pub cv: Option<String>,

    #[validate(url)]
    pub photo_url: Option<String>,
}

/// Partial update applied by an admin.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    #[validate(regex(path = *NNI_PATTERN, message = "nni must be 8 to 15 digits"))]
    pub nni: Option<String>,

    pub role: Option<Role>,

    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,

    #[validate(length(max = 512))]
    pub address: Option<String>,

    #[validate(length(max = 256))]
    pub job: Option<String>,

    #[validate(length(max = 256))]
    pub domain: Option<String>,

    #[validate(length(max = 10000))]
    pub cv: Option<String>,

    #[validate(url)]
    pub photo_url: Option<String>,
}

/// Partial update a member applies to their own profile.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,

    #[validate(length(max = 512))]
    pub address: Option<String>,

    #[validate(length(max = 256))]
    pub job: Option<String>,

    #[validate(length(max = 256))]
    pub domain: Option<String>,

    #[validate(length(max = 10000))]
    pub cv: Option<String>,

    #[validate(url)]
    pub photo_url: Option<String>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Self-registration. The new member always gets the `USER` role.
    pub async fn register(&self, input: CreateUserInput) -> AppResult<user::Model> {
        self.insert(input, Role::User).await
    }

    /// Create a member on behalf of an admin, who may pick the role.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        let role = input.role.unwrap_or(Role::User);
        self.insert(input, role).await
    }

    async fn insert(&self, input: CreateUserInput, role: Role) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.find_by_nni(&input.nni).await?.is_some() {
            return Err(AppError::Conflict("NNI already registered".to_string()));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            nni: Set(input.nni),
            password: Set(hash_password(&input.password)?),
            name: Set(input.name.trim().to_string()),
            role: Set(role),
            address: Set(non_empty(input.address)),
            job: Set(non_empty(input.job)),
            domain: Set(non_empty(input.domain)),
            cv: Set(non_empty(input.cv)),
            photo_url: Set(non_empty(input.photo_url)),
            is_blocked: Set(false),
            token: Set(None),
            token_last_used_at: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        info!(user_id = %user.id, role = user.role.as_str(), "Member created");
        Ok(user)
    }

    /// List every member.
    pub async fn list(&self) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_all().await
    }

    /// Get a member by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Apply an admin's partial update.
    pub async fn update(&self, id: &str, input: UpdateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(id).await?;

        let txn = self.user_repo.begin().await?;
        if input.role == Some(Role::User) && user.is_admin() {
            Self::ensure_admin_remains(&txn, &user).await?;
        }

        if let Some(nni) = input.nni.as_deref().filter(|nni| *nni != user.nni) {
            if self.user_repo.find_by_nni(nni).await?.is_some() {
                return Err(AppError::Conflict("NNI already registered".to_string()));
            }
        }

        let mut active: user::ActiveModel = user.into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(nni) = input.nni {
            active.nni = Set(nni);
        }
        if let Some(role) = input.role {
            active.role = Set(role);
        }
        if let Some(password) = input.password {
            active.password = Set(hash_password(&password)?);
        }
        if let Some(address) = input.address {
            active.address = Set(non_empty(Some(address)));
        }
        if let Some(job) = input.job {
            active.job = Set(non_empty(Some(job)));
        }
        if let Some(domain) = input.domain {
            active.domain = Set(non_empty(Some(domain)));
        }
        if let Some(cv) = input.cv {
            active.cv = Set(non_empty(Some(cv)));
        }
        if let Some(photo_url) = input.photo_url {
            active.photo_url = Set(non_empty(Some(photo_url)));
        }

        active.updated_at = Set(Some(Utc::now().into()));

        let user = UserRepository::update_in(&txn, active).await?;
        commit(txn).await?;
        info!(user_id = %user.id, "Member updated");
        Ok(user)
    }

    /// Apply a member's own profile edit. Role and block state are untouched.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(password) = input.password {
            active.password = Set(hash_password(&password)?);
        }
        if let Some(address) = input.address {
            active.address = Set(non_empty(Some(address)));
        }
        if let Some(job) = input.job {
            active.job = Set(non_empty(Some(job)));
        }
        if let Some(domain) = input.domain {
            active.domain = Set(non_empty(Some(domain)));
        }
        if let Some(cv) = input.cv {
            active.cv = Set(non_empty(Some(cv)));
        }
        if let Some(photo_url) = input.photo_url {
            active.photo_url = Set(non_empty(Some(photo_url)));
        }

        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Delete a member. The sole remaining admin cannot be deleted.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(id).await?;

        let txn = self.user_repo.begin().await?;
        Self::ensure_admin_remains(&txn, &user).await?;
        UserRepository::delete_in(&txn, id).await?;
        commit(txn).await?;
        info!(user_id = %id, "Member deleted");
        Ok(())
    }

    /// Block or unblock a member. Blocking revokes the current session.
    pub async fn set_blocked(&self, id: &str, blocked: bool) -> AppResult<user::Model> {
        let user = self.user_repo.get_by_id(id).await?;

        let txn = self.user_repo.begin().await?;
        if blocked {
            Self::ensure_admin_remains(&txn, &user).await?;
        }

        let mut active: user::ActiveModel = user.into();
        active.is_blocked = Set(blocked);
        if blocked {
            active.token = Set(None);
            active.token_last_used_at = Set(None);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let user = UserRepository::update_in(&txn, active).await?;
        commit(txn).await?;
        info!(user_id = %user.id, blocked, "Member block state changed");
        Ok(user)
    }

    /// Refuse to remove `target` from the admin pool if it is the last active admin.
    ///
    /// Consulted before deleting, demoting or blocking a member. The admin rows
    /// stay locked until `txn` ends, so the write that follows must go through
    /// the same transaction.
    pub async fn ensure_admin_remains(
        txn: &DatabaseTransaction,
        target: &user::Model,
    ) -> AppResult<()> {
        if !target.is_admin() || target.is_blocked {
            return Ok(());
        }

        if UserRepository::count_admins_locked(txn).await? <= 1 {
            warn!(user_id = %target.id, "Refused to remove the last administrator");
            return Err(AppError::LastAdministrator);
        }

        Ok(())
    }

    /// Make sure at least one admin exists, creating or promoting the
    /// configured account when none does.
    pub async fn ensure_bootstrap_admin(
        &self,
        config: Option<&BootstrapAdminConfig>,
    ) -> AppResult<Option<user::Model>> {
        if self.user_repo.count_admins().await? > 0 {
            return Ok(None);
        }

        let Some(config) = config else {
            warn!("No administrator exists and no bootstrap admin is configured");
            return Ok(None);
        };

        let admin = match self.user_repo.find_by_nni(&config.nni).await? {
            Some(existing) => {
                let mut active: user::ActiveModel = existing.into();
                active.role = Set(Role::Admin);
                active.is_blocked = Set(false);
                active.updated_at = Set(Some(Utc::now().into()));
                self.user_repo.update(active).await?
            }
            None => {
                self.create(CreateUserInput {
                    nni: config.nni.clone(),
                    password: config.password.clone(),
                    name: config.name.clone(),
                    role: Some(Role::Admin),
                    address: None,
                    job: None,
                    domain: None,
                    cv: None,
                    photo_url: None,
                })
                .await?
            }
        };

        info!(user_id = %admin.id, "Bootstrap administrator ready");
        Ok(Some(admin))
    }
}

async fn commit(txn: DatabaseTransaction) -> AppResult<()> {
    txn.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub(crate) fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str, role: Role) -> user::Model {
        user::Model {
            id: id.to_string(),
            nni: "22223333".to_string(),
            password: hash_password("password123").unwrap(),
            name: "Test Member".to_string(),
            role,
            address: None,
            job: None,
            domain: None,
            cv: None,
            photo_url: None,
            is_blocked: false,
            token: Some("test_token".to_string()),
            token_last_used_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn admin_count(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }
    }

    fn create_test_service(db: DatabaseConnection) -> UserService {
        UserService::new(UserRepository::new(Arc::new(db)))
    }

    fn valid_input() -> CreateUserInput {
        CreateUserInput {
            nni: "+22244445555".to_string(),
            password: "password123".to_string(),
            name: "New Member".to_string(),
            role: Some(Role::Admin),
            address: None,
            job: Some("Engineer".to_string()),
            domain: None,
            cv: None,
            photo_url: None,
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("password123", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "not_a_hash").is_err());
    }

    #[test]
    fn test_create_user_input_validation() {
        assert!(valid_input().validate().is_ok());

        let mut input = valid_input();
        input.nni = "12ab5678".to_string();
        assert!(input.validate().is_err());

        let mut input = valid_input();
        input.nni = "1234567".to_string();
        assert!(input.validate().is_err());

        let mut input = valid_input();
        input.password = "short".to_string();
        assert!(input.validate().is_err());

        let mut input = valid_input();
        input.photo_url = Some("not a url".to_string());
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_non_empty_clears_blank_values() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some(" Dakar ".to_string())), Some("Dakar".to_string()));
        assert_eq!(non_empty(None), None);
    }

    #[tokio::test]
    async fn test_register_forces_user_role() {
        let mut created = create_test_user("user1", Role::User);
        created.nni = "+22244445555".to_string();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[created]])
            .into_connection();

        let service = create_test_service(db);
        let user = service.register(valid_input()).await.unwrap();

        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn test_register_duplicate_nni() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("user1", Role::User)]])
            .into_connection();

        let service = create_test_service(db);
        let result = service.register(valid_input()).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let service = create_test_service(db);

        match service.get("nonexistent").await {
            Err(AppError::UserNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected UserNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_delete_last_admin_fails() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("admin1", Role::Admin)]])
            .append_query_results([[admin_count(1)]])
            .into_connection();

        let service = create_test_service(db);
        let result = service.delete("admin1").await;

        assert!(matches!(result, Err(AppError::LastAdministrator)));
    }

    #[tokio::test]
    async fn test_delete_admin_when_another_remains() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("admin1", Role::Admin)]])
            .append_query_results([[admin_count(2)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let service = create_test_service(db);
        assert!(service.delete("admin1").await.is_ok());
    }

    #[tokio::test]
    async fn test_last_admin_check_locks_admin_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("admin1", Role::Admin)]])
                .append_query_results([[admin_count(2)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db.clone()));
        service.delete("admin1").await.unwrap();
        drop(service);

        let log = format!(
            "{:?}",
            Arc::try_unwrap(db).ok().unwrap().into_transaction_log()
        );
        assert!(log.contains("FOR UPDATE"));
        assert!(log.contains("DELETE FROM"));
    }

    #[tokio::test]
    async fn test_delete_regular_member() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("user1", Role::User)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let service = create_test_service(db);
        assert!(service.delete("user1").await.is_ok());
    }

    #[tokio::test]
    async fn test_demote_last_admin_fails() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("admin1", Role::Admin)]])
            .append_query_results([[admin_count(1)]])
            .into_connection();

        let service = create_test_service(db);
        let result = service
            .update(
                "admin1",
                UpdateUserInput {
                    role: Some(Role::User),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::LastAdministrator)));
    }

    #[tokio::test]
    async fn test_block_last_admin_fails() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("admin1", Role::Admin)]])
            .append_query_results([[admin_count(1)]])
            .into_connection();

        let service = create_test_service(db);
        let result = service.set_blocked("admin1", true).await;

        assert!(matches!(result, Err(AppError::LastAdministrator)));
    }

    #[tokio::test]
    async fn test_block_member_revokes_token() {
        let member = create_test_user("user1", Role::User);
        let mut blocked = member.clone();
        blocked.is_blocked = true;
        blocked.token = None;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[member]])
            .append_query_results([[blocked]])
            .into_connection();

        let service = create_test_service(db);
        let user = service.set_blocked("user1", true).await.unwrap();

        assert!(user.is_blocked);
        assert!(user.token.is_none());
    }

    #[tokio::test]
    async fn test_update_nni_taken_by_other_member() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("user1", Role::User)]])
            .append_query_results([[create_test_user("user2", Role::User)]])
            .into_connection();

        let service = create_test_service(db);
        let result = service
            .update(
                "user1",
                UpdateUserInput {
                    nni: Some("99998888".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_profile_validation() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = create_test_service(db);

        let result = service
            .update_profile(
                "user1",
                UpdateProfileInput {
                    password: Some("short".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_bootstrap_skipped_when_admin_exists() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[admin_count(1)]])
            .into_connection();

        let service = create_test_service(db);
        let config = BootstrapAdminConfig {
            nni: "22220000".to_string(),
            password: "password123".to_string(),
            name: "Administrator".to_string(),
        };

        assert!(
            service
                .ensure_bootstrap_admin(Some(&config))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_bootstrap_creates_admin() {
        let admin = create_test_user("admin1", Role::Admin);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[admin_count(0)]])
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[admin]])
            .into_connection();

        let service = create_test_service(db);
        let config = BootstrapAdminConfig {
            nni: "22223333".to_string(),
            password: "password123".to_string(),
            name: "Administrator".to_string(),
        };

        let created = service
            .ensure_bootstrap_admin(Some(&config))
            .await
            .unwrap()
            .unwrap();
        assert!(created.is_admin());
    }
}
