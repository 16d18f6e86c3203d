//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Member role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Association administrator.
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    /// Regular member.
    #[sea_orm(string_value = "USER")]
    User,
}

impl Role {
    /// Wire representation of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Login identifier (phone-number-like)
    #[sea_orm(unique)]
    pub nni: String,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password: String,

    /// Display name
    pub name: String,

    pub role: Role,

    #[sea_orm(nullable)]
    pub address: Option<String>,

    #[sea_orm(nullable)]
    pub job: Option<String>,

    /// Professional field
    #[sea_orm(nullable)]
    pub domain: Option<String>,

    /// Free-form curriculum text
    #[sea_orm(column_type = "Text", nullable)]
    pub cv: Option<String>,

    #[sea_orm(nullable)]
    pub photo_url: Option<String>,

    /// Blocked users cannot sign in
    #[sea_orm(default_value = false)]
    pub is_blocked: bool,

    /// Current bearer token, cleared on logout or inactivity
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    #[sea_orm(nullable)]
    pub token_last_used_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether this user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::vote::Entity")]
    Vote,

    #[sea_orm(has_many = "super::activity::Entity")]
    Activities,
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
