//! Test utilities for creating test databases and fixtures.
//!
//! This module provides helper functions to reduce boilerplate in tests.

#![allow(clippy::unwrap_used)]

use crate::{
    config::{database, settings::StorageSettings},
    core::{
        admission::{self, PeriodInput},
        auth::hash_password,
        contact::{self, ContactInput},
        news::{self, NewsInput},
        registration::{AdmissionDocuments, DocumentKind, DocumentUpload, RegistrationForm},
        skill::{self, SkillInput},
    },
    entities::{
        self, ContactType, Gender, NewsCategory, RegistrationDocuments, RegistrationStatus, Role,
        Skill,
    },
    errors::Result,
    storage::ObjectStorage,
};
use chrono::{Days, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::path::Path;

/// Sets up an in-memory `SQLite` database with all tables created.
///
/// Each call creates a fresh, isolated database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = database::create_connection("sqlite::memory:").await?;
    database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a published news item with placeholder content.
pub async fn create_test_news(db: &DatabaseConnection, title: &str) -> Result<entities::news::Model> {
    news::create_news(
        db,
        NewsInput {
            title: title.to_string(),
            excerpt: None,
            content: format!("Isi berita {title}"),
            category: NewsCategory::News,
            featured_image_url: None,
            is_published: true,
            is_featured: false,
        },
    )
    .await
}

/// Creates an active program with the default duration.
pub async fn create_test_skill(db: &DatabaseConnection, name: &str) -> Result<entities::skill::Model> {
    skill::create_skill(db, SkillInput::named(name)).await
}

/// Creates a non-primary contact entry labelled after its type.
pub async fn create_test_contact(
    db: &DatabaseConnection,
    contact_type: ContactType,
    value: &str,
) -> Result<entities::contact::Model> {
    contact::create_contact(
        db,
        ContactInput {
            contact_type,
            label: format!("{contact_type:?}"),
            value: value.to_string(),
            icon: None,
            is_primary: false,
        },
    )
    .await
}

/// Period input with a quota of 100 and no fee.
#[must_use]
pub fn period_input(academic_year: &str, start: NaiveDate, end: NaiveDate) -> PeriodInput {
    PeriodInput {
        academic_year: academic_year.to_string(),
        registration_start: start,
        registration_end: end,
        announcement_date: None,
        max_students: 100,
        registration_fee: 0,
        requirements: vec!["Lulus SMP/MTs".to_string()],
        documents_needed: vec!["KTP".to_string(), "KK".to_string(), "Ijazah".to_string()],
        selection_process: vec!["Tes tertulis".to_string()],
    }
}

/// Creates an inactive period running from 1 January to 1 March 2025.
pub async fn create_test_period(
    db: &DatabaseConnection,
    academic_year: &str,
) -> Result<entities::admission_period::Model> {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    admission::create_period(db, period_input(academic_year, start, end)).await
}

/// Sets up a database with an active period whose window spans today,
/// plus one active program. Returns (db, period, skill).
pub async fn setup_open_admission() -> Result<(
    DatabaseConnection,
    entities::admission_period::Model,
    entities::skill::Model,
)> {
    let db = setup_test_db().await?;
    let today = Utc::now().date_naive();
    let input = period_input(
        "2025/2026",
        today.checked_sub_days(Days::new(30)).unwrap(),
        today.checked_add_days(Days::new(30)).unwrap(),
    );
    let period = admission::create_period(&db, input).await?;
    let period = admission::set_period_active(&db, period.id, true).await?;
    let skill = create_test_skill(&db, "Teknik Komputer dan Jaringan").await?;
    Ok((db, period, skill))
}

/// Inserts a pending registration directly, bypassing window and document checks.
///
/// Uses the first program in the database, creating one if there is none.
pub async fn insert_test_registration(
    db: &DatabaseConnection,
    period_id: i64,
    number: &str,
) -> Result<entities::registration::Model> {
    let skill = match Skill::find().one(db).await? {
        Some(skill) => skill,
        None => create_test_skill(db, "Rekayasa Perangkat Lunak").await?,
    };
    let form = test_registration_form(skill.id);
    let now = Utc::now();

    entities::registration::ActiveModel {
        period_id: Set(period_id),
        registration_number: Set(number.to_string()),
        student_name: Set(form.student_name),
        student_email: Set(form.student_email),
        student_phone: Set(form.student_phone),
        parent_name: Set(form.parent_name),
        parent_phone: Set(form.parent_phone),
        parent_email: Set(form.parent_email),
        birth_date: Set(form.birth_date),
        birth_place: Set(form.birth_place),
        gender: Set(form.gender),
        address: Set(form.address),
        previous_school: Set(form.previous_school),
        chosen_skill_id: Set(skill.id),
        documents: Set(RegistrationDocuments::default()),
        status: Set(RegistrationStatus::Pending),
        notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Object storage rooted at `root`. Bucket directories are created on first upload.
#[must_use]
pub fn test_storage(root: &Path) -> ObjectStorage {
    ObjectStorage::new(&StorageSettings {
        root: root.to_path_buf(),
        public_base_url: "/storage".to_string(),
    })
}

/// A complete, valid admission form choosing `skill_id`.
#[must_use]
pub fn test_registration_form(skill_id: i64) -> RegistrationForm {
    RegistrationForm {
        student_name: "Siti Aminah".to_string(),
        student_email: "siti@example.com".to_string(),
        student_phone: "081234567890".to_string(),
        parent_name: "Ahmad Fauzi".to_string(),
        parent_phone: "081234567891".to_string(),
        parent_email: None,
        birth_date: NaiveDate::from_ymd_opt(2010, 5, 17).unwrap(),
        birth_place: "Bandung".to_string(),
        gender: Gender::Female,
        address: "Jl. Merdeka No. 1, Bandung".to_string(),
        previous_school: "SMP Negeri 2 Bandung".to_string(),
        chosen_skill_id: skill_id,
    }
}

/// All four documents: PDF scans and a JPEG photo.
#[must_use]
pub fn test_documents() -> AdmissionDocuments {
    let file = |name: &str, content_type: &str, bytes: &[u8]| DocumentUpload {
        file_name: name.to_string(),
        content_type: content_type.to_string(),
        bytes: bytes.to_vec(),
    };
    let mut documents = AdmissionDocuments::new();
    documents
        .insert(DocumentKind::Ktp, file("ktp.pdf", "application/pdf", b"%PDF-1.4 ktp"))
        .insert(DocumentKind::Kk, file("kk.pdf", "application/pdf", b"%PDF-1.4 kk"))
        .insert(
            DocumentKind::Ijazah,
            file("ijazah.pdf", "application/pdf", b"%PDF-1.4 ijazah"),
        )
        .insert(DocumentKind::Foto, file("foto.jpg", "image/jpeg", b"jpeg foto"));
    documents
}

/// An unsaved admin model, for permission checks that need no database.
#[must_use]
pub fn test_admin_model(role: Role) -> entities::admin_user::Model {
    let now = Utc::now();
    entities::admin_user::Model {
        id: 1,
        email: format!("{}@example.sch.id", role.as_str()),
        full_name: "Test Admin".to_string(),
        role,
        avatar_url: None,
        password_hash: String::new(),
        is_active: true,
        last_login: None,
        created_at: now,
        updated_at: now,
    }
}

/// Creates an active admin with the given credentials.
pub async fn create_test_admin(
    db: &DatabaseConnection,
    email: &str,
    role: Role,
    password: &str,
) -> Result<entities::admin_user::Model> {
    let now = Utc::now();
    entities::admin_user::ActiveModel {
        email: Set(email.trim().to_lowercase()),
        full_name: Set("Test Admin".to_string()),
        role: Set(role),
        avatar_url: Set(None),
        password_hash: Set(hash_password(password).await?),
        is_active: Set(true),
        last_login: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
