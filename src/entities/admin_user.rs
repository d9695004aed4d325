//! Admin user entity - back-office accounts and their roles.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Back-office role; permissions are a flat allowlist per role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Everything, including user management
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
    /// Content plus admission and contacts
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Content only
    #[sea_orm(string_value = "editor")]
    Editor,
}

impl Role {
    /// Wire name of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Editor => "editor",
        }
    }
}

/// Admin user database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_users")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sign-in email, unique
    #[sea_orm(unique)]
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Role
    pub role: Role,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// bcrypt hash, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Disabled accounts cannot sign in and lose their sessions
    pub is_active: bool,
    /// Last successful sign-in
    pub last_login: Option<DateTimeUtc>,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between admins and their sessions
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One admin has many sessions
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
