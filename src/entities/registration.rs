//! Registration entity - one applicant's PPDB submission.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review state of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Waiting for review
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Admitted
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Not admitted
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl RegistrationStatus {
    /// Lowercase wire name, as stored in the database
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Applicant gender as collected on the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Gender {
    /// Laki-laki
    #[sea_orm(string_value = "L")]
    #[serde(rename = "L")]
    Male,
    /// Perempuan
    #[sea_orm(string_value = "P")]
    #[serde(rename = "P")]
    Female,
}

impl Gender {
    /// Single-letter code used on the form and in exports
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Male => "L",
            Self::Female => "P",
        }
    }
}

/// Storage paths of the uploaded admission documents
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct RegistrationDocuments {
    /// Identity card (KTP)
    pub ktp_url: Option<String>,
    /// Family card (KK)
    pub kk_url: Option<String>,
    /// Diploma (ijazah)
    pub ijazah_url: Option<String>,
    /// Passport photo
    pub foto_url: Option<String>,
}

/// Registration database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ppdb_registrations")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Period this registration belongs to
    pub period_id: i64,
    /// Human-facing number, `PPDB{YYYY}{MM}{NNNN}`
    #[sea_orm(unique)]
    pub registration_number: String,
    /// Applicant's full name
    pub student_name: String,
    /// Applicant's email
    pub student_email: String,
    /// Applicant's phone
    pub student_phone: String,
    /// Parent or guardian name
    pub parent_name: String,
    /// Parent phone
    pub parent_phone: String,
    /// Parent email, optional
    pub parent_email: Option<String>,
    /// Date of birth
    pub birth_date: Date,
    /// Place of birth
    pub birth_place: String,
    /// Gender
    pub gender: Gender,
    /// Home address
    #[sea_orm(column_type = "Text")]
    pub address: String,
    /// Junior high school of origin
    pub previous_school: String,
    /// Chosen program
    pub chosen_skill_id: i64,
    /// Uploaded document paths
    #[sea_orm(column_type = "Json")]
    pub documents: RegistrationDocuments,
    /// Review state
    pub status: RegistrationStatus,
    /// Reviewer notes
    pub notes: Option<String>,
    /// Submission time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Registration and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each registration belongs to one period
    #[sea_orm(
        belongs_to = "super::admission_period::Entity",
        from = "Column::PeriodId",
        to = "super::admission_period::Column::Id"
    )]
    Period,
    /// Each registration chooses one program
    #[sea_orm(
        belongs_to = "super::skill::Entity",
        from = "Column::ChosenSkillId",
        to = "super::skill::Column::Id"
    )]
    Skill,
}

impl Related<super::admission_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Period.def()
    }
}

impl Related<super::skill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Skill.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
