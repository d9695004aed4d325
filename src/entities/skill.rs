//! Skill entity - a vocational program (kompetensi keahlian) offered by the school.

use super::StringList;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Skill/program database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "skills")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Program name (e.g. "Teknik Komputer dan Jaringan")
    pub name: String,
    /// Program description
    pub description: Option<String>,
    /// Public URL of the program image
    pub image_url: Option<String>,
    /// Study duration in years
    pub duration_years: i32,
    /// Subjects taught
    #[sea_orm(column_type = "Json")]
    pub subjects: StringList,
    /// Facilities available to the program
    #[sea_orm(column_type = "Json")]
    pub facilities: StringList,
    /// Career prospects after graduation
    #[sea_orm(column_type = "Json")]
    pub career_prospects: StringList,
    /// Inactive programs are hidden from the public site and the admission form
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Skill and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Applicants choose one program each
    #[sea_orm(has_many = "super::registration::Entity")]
    Registrations,
}

impl Related<super::registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registrations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
