//! First-run data seeding from the `[seed]` section of config.toml
//!
//! Each kind of data is only seeded while its table is still empty, so
//! restarting the service never duplicates or overwrites admin edits.

use crate::config::Settings;
use crate::core::{
    admin_user::{self, AdminInput},
    contact::{self, ContactInput},
    profile::{self, ProfileInput},
    skill::{self, SkillInput},
};
use crate::entities::{AdminUser, Contact, Skill};
use crate::errors::Result;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use tracing::{info, instrument, warn};

/// Environment variable holding the password for seeded admins without one
pub const SEED_PASSWORD_VAR: &str = "PORTAL_SEED_ADMIN_PASSWORD";

/// What a seeding run inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Admin accounts created
    pub admins: usize,
    /// Whether the profile row was created
    pub profile: bool,
    /// Programs created
    pub skills: usize,
    /// Contact entries created
    pub contacts: usize,
}

/// Seeds admins, profile, programs, and contacts into empty tables.
///
/// Admins without a configured password use `PORTAL_SEED_ADMIN_PASSWORD`;
/// when that is unset too they are skipped with a warning.
pub async fn seed_initial_data(db: &DatabaseConnection, settings: &Settings) -> Result<SeedSummary> {
    let fallback = std::env::var(SEED_PASSWORD_VAR).ok();
    seed_with_password(db, settings, fallback.as_deref()).await
}

#[instrument(skip_all)]
async fn seed_with_password(
    db: &DatabaseConnection,
    settings: &Settings,
    fallback_password: Option<&str>,
) -> Result<SeedSummary> {
    let seed = &settings.seed;
    let mut summary = SeedSummary::default();

    if AdminUser::find().count(db).await? == 0 {
        for admin in &seed.admins {
            let Some(password) = admin.password.as_deref().or(fallback_password) else {
                warn!(
                    "No password for seed admin {}; set {SEED_PASSWORD_VAR}. Skipping.",
                    admin.email
                );
                continue;
            };
            admin_user::create_admin(
                db,
                AdminInput {
                    email: admin.email.clone(),
                    full_name: admin.full_name.clone(),
                    role: admin.role,
                    avatar_url: None,
                    password: Some(password.to_string()),
                },
            )
            .await?;
            summary.admins += 1;
        }
    }

    if let Some(name) = seed.school_name.as_deref() {
        if profile::get_profile(db).await?.is_none() {
            profile::upsert_profile(
                db,
                ProfileInput {
                    name: name.to_string(),
                    ..Default::default()
                },
            )
            .await?;
            summary.profile = true;
        }
    }

    if Skill::find().count(db).await? == 0 {
        for entry in &seed.skills {
            let mut input = SkillInput::named(&entry.name);
            input.description.clone_from(&entry.description);
            input.duration_years = entry.duration_years;
            skill::create_skill(db, input).await?;
            summary.skills += 1;
        }
    }

    if Contact::find().count(db).await? == 0 {
        for entry in &seed.contacts {
            contact::create_contact(
                db,
                ContactInput {
                    contact_type: entry.contact_type,
                    label: entry.label.clone(),
                    value: entry.value.clone(),
                    icon: None,
                    is_primary: entry.is_primary,
                },
            )
            .await?;
            summary.contacts += 1;
        }
    }

    info!(
        "Seeding done: {} admins, profile {}, {} skills, {} contacts",
        summary.admins, summary.profile, summary.skills, summary.contacts
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::settings::parse_config;
    use crate::core::auth::verify_password;
    use crate::test_utils::*;

    const SEED_TOML: &str = r#"
        [seed]
        school_name = "SMK Negeri 1 Contoh"

        [[seed.admins]]
        email = "Admin@SMK.example.sch.id"
        full_name = "Administrator"
        role = "super_admin"
        password = "rahasia123"

        [[seed.admins]]
        email = "editor@smk.example.sch.id"
        full_name = "Editor"
        role = "editor"

        [[seed.skills]]
        name = "Teknik Komputer dan Jaringan"
        duration_years = 4

        [[seed.skills]]
        name = "Akuntansi"

        [[seed.contacts]]
        type = "phone"
        label = "Tata Usaha"
        value = "(021) 555-0101"
        is_primary = true
    "#;

    #[tokio::test]
    async fn test_seed_fills_empty_tables() -> Result<()> {
        let db = setup_test_db().await?;
        let settings = parse_config(SEED_TOML)?;

        let summary = seed_with_password(&db, &settings, None).await?;
        assert_eq!(
            summary,
            SeedSummary {
                admins: 1,
                profile: true,
                skills: 2,
                contacts: 1,
            }
        );

        let admins = admin_user::list_admins(&db).await?;
        assert_eq!(admins[0].email, "admin@smk.example.sch.id");
        assert!(verify_password("rahasia123", &admins[0].password_hash).await?);

        let skills = skill::list_all_skills(&db).await?;
        assert_eq!(skills[1].duration_years, 4);
        assert_eq!(profile::get_profile(&db).await?.unwrap().name, "SMK Negeri 1 Contoh");
        assert!(contact::list_contacts(&db).await?[0].is_primary);
        Ok(())
    }

    #[tokio::test]
    async fn test_fallback_password_and_rerun_is_noop() -> Result<()> {
        let db = setup_test_db().await?;
        let settings = parse_config(SEED_TOML)?;

        let first = seed_with_password(&db, &settings, Some("awal12345")).await?;
        assert_eq!(first.admins, 2);

        let second = seed_with_password(&db, &settings, Some("awal12345")).await?;
        assert_eq!(second, SeedSummary::default());
        assert_eq!(admin_user::list_admins(&db).await?.len(), 2);
        assert_eq!(skill::list_all_skills(&db).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_rows_are_left_alone() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_skill(&db, "Multimedia").await?;
        let settings = parse_config(SEED_TOML)?;

        let summary = seed_with_password(&db, &settings, None).await?;
        assert_eq!(summary.skills, 0);
        let names: Vec<_> = skill::list_all_skills(&db)
            .await?
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Multimedia"]);
        Ok(())
    }
}
