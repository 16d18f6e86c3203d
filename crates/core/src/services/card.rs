//! Membership card data.

use alumni_db::entities::{Role, user};
use serde::Serialize;

use super::session::Session;

/// Printable projection of a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipCard {
    pub id: String,
    pub member_number: String,
    pub name: String,
    pub nni: String,
    pub role: Role,
    pub job: Option<String>,
    pub domain: Option<String>,
    pub photo_url: Option<String>,
    /// `YYYY-MM-DD`
    pub member_since: String,
}

impl MembershipCard {
    #[must_use]
    pub fn for_member(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            member_number: member_number(&user.id),
            name: user.name.clone(),
            nni: user.nni.clone(),
            role: user.role,
            job: user.job.clone(),
            domain: user.domain.clone(),
            photo_url: user.photo_url.clone(),
            member_since: user.created_at.format("%Y-%m-%d").to_string(),
        }
    }

    /// Card of the session's member.
    #[must_use]
    pub fn for_session(session: &Session) -> Self {
        Self::for_member(&session.user)
    }
}

/// `AA-` followed by the first eight characters of the ID, uppercased.
#[must_use]
pub fn member_number(id: &str) -> String {
    let prefix: String = id.chars().take(8).collect();
    format!("AA-{}", prefix.to_uppercase())
}
