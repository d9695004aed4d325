//! School profile entity - the single row describing the school itself.
//!
//! The table only ever holds the row with id [`PROFILE_ID`]; writes are upserts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Primary key of the singleton profile row.
pub const PROFILE_ID: i32 = 1;

/// School profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "school_profile")]
pub struct Model {
    /// Always [`PROFILE_ID`]
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    /// Official school name
    pub name: String,
    /// Long-form description shown on the profile page
    pub description: Option<String>,
    /// Vision statement
    pub vision: Option<String>,
    /// Mission statement
    pub mission: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// Main phone number
    pub phone: Option<String>,
    /// Main email address
    pub email: Option<String>,
    /// Website URL
    pub website: Option<String>,
    /// Public URL of the logo image
    pub logo_url: Option<String>,
    /// Public URL of the header/hero image
    pub header_image_url: Option<String>,
    /// Year the school was founded
    pub established_year: Option<i32>,
    /// Accreditation grade (e.g. "A")
    pub accreditation: Option<String>,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

/// The profile has no relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
