//! Skill (program) business logic.

use crate::{
    core::validation::FieldCheck,
    entities::{Registration, Skill, StringList, registration, skill},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Values accepted when creating or editing a program.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillInput {
    /// Program name
    pub name: String,
    /// Long description
    #[serde(default)]
    pub description: Option<String>,
    /// Cover image URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Study duration in years
    #[serde(default = "default_duration")]
    pub duration_years: i32,
    /// Subjects taught
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Facilities available
    #[serde(default)]
    pub facilities: Vec<String>,
    /// Career prospects after graduation
    #[serde(default)]
    pub career_prospects: Vec<String>,
    /// Shown publicly and selectable on the admission form
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_duration() -> i32 {
    3
}

const fn default_active() -> bool {
    true
}

impl SkillInput {
    /// A minimal active program with the default duration
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            image_url: None,
            duration_years: default_duration(),
            subjects: Vec::new(),
            facilities: Vec::new(),
            career_prospects: Vec::new(),
            is_active: true,
        }
    }

    fn validate(&self) -> Result<()> {
        let mut check = FieldCheck::new();
        check.required("name", &self.name);
        if !(1..=10).contains(&self.duration_years) {
            check.fail("duration_years", "Durasi harus antara 1 dan 10 tahun");
        }
        check.finish()
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Active programs, alphabetically.
pub async fn list_active_skills(db: &DatabaseConnection) -> Result<Vec<skill::Model>> {
    Skill::find()
        .filter(skill::Column::IsActive.eq(true))
        .order_by_asc(skill::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every program, alphabetically.
pub async fn list_all_skills(db: &DatabaseConnection) -> Result<Vec<skill::Model>> {
    Skill::find()
        .order_by_asc(skill::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a program by id.
pub async fn get_skill(db: &DatabaseConnection, id: i64) -> Result<skill::Model> {
    Skill::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("skill", id))
}

/// Creates a program.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_skill(db: &DatabaseConnection, input: SkillInput) -> Result<skill::Model> {
    input.validate()?;
    let now = Utc::now();
    let skill = skill::ActiveModel {
        name: Set(input.name.trim().to_string()),
        description: Set(optional_text(input.description)),
        image_url: Set(optional_text(input.image_url)),
        duration_years: Set(input.duration_years),
        subjects: Set(StringList::cleaned(input.subjects)),
        facilities: Set(StringList::cleaned(input.facilities)),
        career_prospects: Set(StringList::cleaned(input.career_prospects)),
        is_active: Set(input.is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created skill {} ({})", skill.id, skill.name);
    Ok(skill)
}

/// Replaces the editable fields of a program.
#[instrument(skip(db, input))]
pub async fn update_skill(db: &DatabaseConnection, id: i64, input: SkillInput) -> Result<skill::Model> {
    input.validate()?;
    let mut model: skill::ActiveModel = get_skill(db, id).await?.into();
    model.name = Set(input.name.trim().to_string());
    model.description = Set(optional_text(input.description));
    model.image_url = Set(optional_text(input.image_url));
    model.duration_years = Set(input.duration_years);
    model.subjects = Set(StringList::cleaned(input.subjects));
    model.facilities = Set(StringList::cleaned(input.facilities));
    model.career_prospects = Set(StringList::cleaned(input.career_prospects));
    model.is_active = Set(input.is_active);
    model.updated_at = Set(Utc::now());
    model.update(db).await.map_err(Into::into)
}

/// Flips the active flag and returns the updated program.
#[instrument(skip(db))]
pub async fn toggle_skill_active(db: &DatabaseConnection, id: i64) -> Result<skill::Model> {
    let skill = get_skill(db, id).await?;
    let active = !skill.is_active;
    let mut model: skill::ActiveModel = skill.into();
    model.is_active = Set(active);
    model.updated_at = Set(Utc::now());
    let updated = model.update(db).await?;
    info!("Skill {id} active = {active}");
    Ok(updated)
}

/// Deletes a program. Programs chosen by a registration cannot be deleted;
/// deactivate them instead.
#[instrument(skip(db))]
pub async fn delete_skill(db: &DatabaseConnection, id: i64) -> Result<()> {
    let skill = get_skill(db, id).await?;
    let chosen_by = Registration::find()
        .filter(registration::Column::ChosenSkillId.eq(id))
        .count(db)
        .await?;
    if chosen_by > 0 {
        return Err(Error::Conflict {
            message: format!("{} is chosen by {chosen_by} registrations", skill.name),
        });
    }
    skill.delete(db).await?;
    info!("Deleted skill {id}");
    Ok(())
}
