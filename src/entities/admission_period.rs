//! Admission period entity - one PPDB intake (academic year).
//!
//! Only one period is active at a time; the active period is the one the
//! public registration form writes into.

use super::StringList;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Admission period database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ppdb_periods")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Academic year label, e.g. "2025/2026"
    pub academic_year: String,
    /// First day registrations are accepted
    pub registration_start: Date,
    /// Last day registrations are accepted (inclusive)
    pub registration_end: Date,
    /// Day results are announced
    pub announcement_date: Option<Date>,
    /// Quota of students admitted
    pub max_students: i32,
    /// Registration fee in rupiah
    pub registration_fee: i64,
    /// General requirements
    #[sea_orm(column_type = "Json")]
    pub requirements: StringList,
    /// Documents applicants must upload
    #[sea_orm(column_type = "Json")]
    pub documents_needed: StringList,
    /// Selection steps
    #[sea_orm(column_type = "Json")]
    pub selection_process: StringList,
    /// The period currently accepting registrations
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between periods and registrations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One period has many registrations
    #[sea_orm(has_many = "super::registration::Entity")]
    Registrations,
}

impl Related<super::registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registrations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
