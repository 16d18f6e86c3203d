//! Session service: login, per-request resolution and logout.

use std::time::Duration;

use alumni_common::{AppError, AppResult, Config, IdGenerator};
use alumni_db::{
    entities::{Role, user},
    repositories::UserRepository,
};
use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info, warn};

use super::user::verify_password;

/// The resolved caller of one request.
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer token presented by the caller.
    pub token: String,
    /// Member the token belongs to.
    pub user: user::Model,
}

impl Session {
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.user.role
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

/// Issues, resolves and tears down bearer tokens.
#[derive(Clone)]
pub struct SessionService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
    inactivity_timeout: Duration,
}

impl SessionService {
    /// Create a new session service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, config: &Config) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
            inactivity_timeout: Duration::from_secs(config.session.inactivity_timeout_secs),
        }
    }

    /// Check credentials and open a session.
    ///
    /// Unknown identifiers and wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, nni: &str, password: &str) -> AppResult<Session> {
        let Some(user) = self.user_repo.find_by_nni(nni).await? else {
            warn!(nni = %nni, "Login attempt for unknown member");
            return Err(AppError::Unauthorized);
        };

        if !verify_password(password, &user.password)? {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AppError::Unauthorized);
        }

        if user.is_blocked {
            warn!(user_id = %user.id, "Login attempt on blocked account");
            return Err(AppError::AccountBlocked);
        }

        let session = self.issue(user).await?;
        info!(user_id = %session.user_id(), "Member logged in");
        Ok(session)
    }

    /// Install a fresh token for `user`, replacing any previous one.
    pub async fn issue(&self, mut user: user::Model) -> AppResult<Session> {
        let token = self.id_gen.generate_token();
        self.user_repo.set_token(&user.id, &token).await?;

        user.token = Some(token.clone());
        user.token_last_used_at = Some(Utc::now().into());
        Ok(Session { token, user })
    }

    /// Map a bearer token to its session.
    ///
    /// Returns `None` for unknown tokens and for tokens idle longer than the
    /// inactivity timeout; the latter are revoked. Refreshes the activity
    /// timestamp otherwise.
    pub async fn resolve(&self, token: &str) -> AppResult<Option<Session>> {
        let Some(user) = self.user_repo.find_by_token(token).await? else {
            return Ok(None);
        };

        if user.is_blocked {
            self.user_repo.clear_token(&user.id).await?;
            return Err(AppError::AccountBlocked);
        }

        if let Some(last_used) = user.token_last_used_at {
            if is_idle(last_used, Utc::now(), self.inactivity_timeout) {
                self.user_repo.clear_token(&user.id).await?;
                info!(user_id = %user.id, "Session expired after inactivity");
                return Ok(None);
            }
        }

        self.user_repo.touch_token(&user.id).await?;
        debug!(user_id = %user.id, "Session resolved");

        Ok(Some(Session {
            token: token.to_string(),
            user,
        }))
    }

    /// Close the session.
    pub async fn logout(&self, session: &Session) -> AppResult<()> {
        self.user_repo.clear_token(session.user_id()).await?;
        info!(user_id = %session.user_id(), "Member logged out");
        Ok(())
    }
}

/// Whether more than `timeout` elapsed between `last_used` and `now`.
fn is_idle(last_used: DateTime<FixedOffset>, now: DateTime<Utc>, timeout: Duration) -> bool {
    (now - last_used.with_timezone(&Utc))
        .to_std()
        .is_ok_and(|elapsed| elapsed > timeout)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::user::hash_password;
    use alumni_common::config::{
        DatabaseConfig, LoggingConfig, ServerConfig, SessionConfig,
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_config() -> Config {
        Config {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/test".to_string(),
                max_connections: 5,
                min_connections: 1,
            },
            session: SessionConfig {
                inactivity_timeout_secs: 900,
            },
            logging: LoggingConfig::default(),
            admin: None,
        }
    }

    fn create_test_user(is_blocked: bool, idle_secs: i64) -> user::Model {
        user::Model {
            id: "user1".to_string(),
            nni: "22223333".to_string(),
            password: hash_password("password123").unwrap(),
            name: "Test Member".to_string(),
            role: Role::User,
            address: None,
            job: None,
            domain: None,
            cv: None,
            photo_url: None,
            is_blocked,
            token: Some("test_token".to_string()),
            token_last_used_at: Some((Utc::now() - chrono::Duration::seconds(idle_secs)).into()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn create_test_service(db: DatabaseConnection) -> SessionService {
        SessionService::new(UserRepository::new(Arc::new(db)), &create_test_config())
    }

    #[test]
    fn test_is_idle() {
        let now = Utc::now();
        let timeout = Duration::from_secs(900);

        assert!(!is_idle((now - chrono::Duration::seconds(60)).into(), now, timeout));
        assert!(is_idle((now - chrono::Duration::seconds(901)).into(), now, timeout));
        // Clock skew puts last use in the future
        assert!(!is_idle((now + chrono::Duration::seconds(5)).into(), now, timeout));
    }

    #[tokio::test]
    async fn test_login_success_issues_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user(false, 0)]])
            .append_exec_results([exec_ok()])
            .into_connection();

        let service = create_test_service(db);
        let session = service.login("22223333", "password123").await.unwrap();

        assert_eq!(session.token.len(), 32);
        assert_ne!(session.token, "test_token");
        assert_eq!(session.user.token.as_deref(), Some(session.token.as_str()));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user(false, 0)]])
            .into_connection();

        let service = create_test_service(db);
        let result = service.login("22223333", "wrong_password").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_unknown_nni() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let service = create_test_service(db);
        let result = service.login("99999999", "password123").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_blocked_with_correct_password() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user(true, 0)]])
            .into_connection();

        let service = create_test_service(db);
        let result = service.login("22223333", "password123").await;

        assert!(matches!(result, Err(AppError::AccountBlocked)));
    }

    #[tokio::test]
    async fn test_resolve_active_session() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user(false, 60)]])
            .append_exec_results([exec_ok()])
            .into_connection();

        let service = create_test_service(db);
        let session = service.resolve("test_token").await.unwrap().unwrap();

        assert_eq!(session.user_id(), "user1");
        assert_eq!(session.role(), Role::User);
    }

    #[tokio::test]
    async fn test_resolve_idle_session_is_anonymous() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user(false, 901)]])
            .append_exec_results([exec_ok()])
            .into_connection();

        let service = create_test_service(db);
        assert!(service.resolve("test_token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_unknown_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let service = create_test_service(db);
        assert!(service.resolve("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_blocked_member_refused() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user(true, 0)]])
            .append_exec_results([exec_ok()])
            .into_connection();

        let service = create_test_service(db);
        let result = service.resolve("test_token").await;

        assert!(matches!(result, Err(AppError::AccountBlocked)));
    }
}
