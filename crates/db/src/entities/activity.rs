//! Activity entity.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Association activity or news item shown on the public board.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    /// Unique activity ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Headline of the activity.
    pub title: String,

    /// Body text.
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Calendar date the activity takes place (or was published).
    pub date: NaiveDate,

    /// Illustration URL (optional).
    #[sea_orm(nullable)]
    pub image_url: Option<String>,

    /// Admin who authored the activity.
    #[sea_orm(nullable)]
    pub created_by: Option<String>,

    /// When the activity was created.
    pub created_at: DateTime<Utc>,

    /// When the activity was last updated.
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Relationships.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Author,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
