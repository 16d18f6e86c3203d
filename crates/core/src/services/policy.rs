//! Role-based authorization.
//!
//! Every privileged operation names an [`Action`]; [`authorize`] turns the
//! caller's [`Session`] and that action into a [`Decision`].

use alumni_common::{AppError, AppResult};
use alumni_db::entities::Role;

use super::session::Session;

/// Operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ManageUsers,
    ManageVoteOptions,
    ManageActivities,
    CastVote,
    ViewVoteResults,
    ViewMembers,
}

impl Action {
    /// Role required to perform the action.
    #[must_use]
    pub const fn required_role(self) -> Option<Role> {
        match self {
            Self::ManageUsers
            | Self::ManageVoteOptions
            | Self::ManageActivities
            | Self::ViewMembers => Some(Role::Admin),
            Self::CastVote | Self::ViewVoteResults => None,
        }
    }

    const fn describe(self) -> &'static str {
        match self {
            Self::ManageUsers => "manage members",
            Self::ManageVoteOptions => "manage vote options",
            Self::ManageActivities => "manage activities",
            Self::CastVote => "vote",
            Self::ViewVoteResults => "view vote results",
            Self::ViewMembers => "view the member directory",
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert a denial into [`AppError::Forbidden`].
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(AppError::Forbidden(reason)),
        }
    }
}

/// Decide whether the session may perform `action`.
#[must_use]
pub fn authorize(session: &Session, action: Action) -> Decision {
    if session.user.is_blocked {
        return Decision::Deny("This account has been blocked".to_string());
    }

    match action.required_role() {
        Some(Role::Admin) if !session.is_admin() => Decision::Deny(format!(
            "Administrator role required to {}",
            action.describe()
        )),
        _ => Decision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alumni_db::entities::user;
    use chrono::Utc;

    fn session(role: Role, is_blocked: bool) -> Session {
        Session {
            token: "token".to_string(),
            user: user::Model {
                id: "user1".to_string(),
                nni: "22223333".to_string(),
                password: String::new(),
                name: "Member".to_string(),
                role,
                address: None,
                job: None,
                domain: None,
                cv: None,
                photo_url: None,
                is_blocked,
                token: Some("token".to_string()),
                token_last_used_at: None,
                created_at: Utc::now().into(),
                updated_at: None,
            },
        }
    }

    const ADMIN_ONLY: [Action; 4] = [
        Action::ManageUsers,
        Action::ManageVoteOptions,
        Action::ManageActivities,
        Action::ViewMembers,
    ];

    #[test]
    fn test_admin_may_do_everything() {
        let admin = session(Role::Admin, false);
        for action in ADMIN_ONLY
            .into_iter()
            .chain([Action::CastVote, Action::ViewVoteResults])
        {
            assert!(authorize(&admin, action).is_allowed(), "{action:?}");
        }
    }

    #[test]
    fn test_member_denied_admin_actions() {
        let member = session(Role::User, false);
        for action in ADMIN_ONLY {
            assert!(matches!(authorize(&member, action), Decision::Deny(_)));
        }
    }

    #[test]
    fn test_member_may_vote_and_view_results() {
        let member = session(Role::User, false);
        assert_eq!(authorize(&member, Action::CastVote), Decision::Allow);
        assert_eq!(authorize(&member, Action::ViewVoteResults), Decision::Allow);
    }

    #[test]
    fn test_blocked_member_denied() {
        let blocked = session(Role::Admin, true);
        assert!(!authorize(&blocked, Action::CastVote).is_allowed());
    }

    #[test]
    fn test_deny_maps_to_forbidden() {
        let member = session(Role::User, false);
        let result = authorize(&member, Action::ManageActivities).into_result();

        match result {
            Err(AppError::Forbidden(reason)) => assert!(reason.contains("manage activities")),
            other => panic!("Expected Forbidden, got {other:?}"),
        }
    }
}
