//! School profile - a single row, written with upsert semantics.

use crate::{
    core::validation::{FieldCheck, MSG_PHONE, is_valid_contact_phone},
    entities::{SchoolProfile, school_profile},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*, sea_query::OnConflict};
use serde::Deserialize;
use tracing::{info, instrument};

/// Values accepted by the profile editor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileInput {
    /// School name
    pub name: String,
    /// About the school
    pub description: Option<String>,
    /// Vision statement
    pub vision: Option<String>,
    /// Mission statement
    pub mission: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// Main phone number
    pub phone: Option<String>,
    /// Main email
    pub email: Option<String>,
    /// Website
    pub website: Option<String>,
    /// Logo image URL
    pub logo_url: Option<String>,
    /// Header image URL
    pub header_image_url: Option<String>,
    /// Year the school was founded
    pub established_year: Option<i32>,
    /// Accreditation grade
    pub accreditation: Option<String>,
}

impl ProfileInput {
    fn validate(&self) -> Result<()> {
        let mut check = FieldCheck::new();
        check
            .required("name", &self.name)
            .email("email", self.email.as_deref())
            .url("website", self.website.as_deref());
        if let Some(phone) = self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            if !is_valid_contact_phone(phone) {
                check.fail("phone", MSG_PHONE);
            }
        }
        if let Some(year) = self.established_year {
            if !(1800..=2200).contains(&year) {
                check.fail("established_year", "Tahun tidak valid");
            }
        }
        check.finish()
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The profile, if it has been saved yet.
pub async fn get_profile(db: &DatabaseConnection) -> Result<Option<school_profile::Model>> {
    SchoolProfile::find_by_id(school_profile::PROFILE_ID)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts or replaces the profile row.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn upsert_profile(
    db: &DatabaseConnection,
    input: ProfileInput,
) -> Result<school_profile::Model> {
    input.validate()?;
    let model = school_profile::ActiveModel {
        id: Set(school_profile::PROFILE_ID),
        name: Set(input.name.trim().to_string()),
        description: Set(optional_text(input.description)),
        vision: Set(optional_text(input.vision)),
        mission: Set(optional_text(input.mission)),
        address: Set(optional_text(input.address)),
        phone: Set(optional_text(input.phone)),
        email: Set(optional_text(input.email)),
        website: Set(optional_text(input.website)),
        logo_url: Set(optional_text(input.logo_url)),
        header_image_url: Set(optional_text(input.header_image_url)),
        established_year: Set(input.established_year),
        accreditation: Set(optional_text(input.accreditation)),
        updated_at: Set(Utc::now()),
    };

    SchoolProfile::insert(model)
        .on_conflict(
            OnConflict::column(school_profile::Column::Id)
                .update_columns([
                    school_profile::Column::Name,
                    school_profile::Column::Description,
                    school_profile::Column::Vision,
                    school_profile::Column::Mission,
                    school_profile::Column::Address,
                    school_profile::Column::Phone,
                    school_profile::Column::Email,
                    school_profile::Column::Website,
                    school_profile::Column::LogoUrl,
                    school_profile::Column::HeaderImageUrl,
                    school_profile::Column::EstablishedYear,
                    school_profile::Column::Accreditation,
                    school_profile::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;

    info!("School profile saved");
    get_profile(db).await?.ok_or_else(missing_profile)
}

fn missing_profile() -> Error {
    Error::not_found("school profile", i64::from(school_profile::PROFILE_ID))
}

/// Sets one image column (`logo_url` or `header_image_url`) of an existing profile.
#[instrument(skip(db))]
pub async fn set_profile_image(
    db: &DatabaseConnection,
    kind: ProfileImage,
    url: String,
) -> Result<school_profile::Model> {
    let profile = get_profile(db).await?.ok_or_else(missing_profile)?;
    let mut model: school_profile::ActiveModel = profile.into();
    match kind {
        ProfileImage::Logo => model.logo_url = Set(Some(url)),
        ProfileImage::Header => model.header_image_url = Set(Some(url)),
    }
    model.updated_at = Set(Utc::now());
    model.update(db).await.map_err(Into::into)
}

/// Which profile image an upload replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileImage {
    /// School logo
    Logo,
    /// Page header
    Header,
}

impl ProfileImage {
    /// Prefix used in stored file names
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Logo => "logo",
            Self::Header => "header",
        }
    }
}
