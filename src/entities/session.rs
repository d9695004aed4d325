//! Session entity - bearer tokens issued at sign-in.
//!
//! Only the SHA-256 of a token is stored; the token itself goes to the client.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// Lowercase hex SHA-256 of the bearer token
    #[sea_orm(primary_key, auto_increment = false)]
    pub token_hash: String,
    /// Owner of the session
    pub admin_user_id: i64,
    /// Issue time
    pub created_at: DateTimeUtc,
    /// Tokens are rejected after this instant
    pub expires_at: DateTimeUtc,
}

/// Defines relationships between Session and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each session belongs to one admin
    #[sea_orm(
        belongs_to = "super::admin_user::Entity",
        from = "Column::AdminUserId",
        to = "super::admin_user::Column::Id",
        on_delete = "Cascade"
    )]
    AdminUser,
}

impl Related<super::admin_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdminUser.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
